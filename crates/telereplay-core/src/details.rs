//! Human-readable details text for timeline entries.
//!
//! Payloads are flattened into bounded `key=value` pairs: nested keys are
//! joined with `.`, array positions with `[i]`, values are truncated, and a
//! trailing ` …` marks pairs dropped by the cap. Kill events get a compact
//! `attacker → victim (ability) HS dmg:N` summary instead.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use telereplay_types::{EntryKind, KillCategory, TimelineEntry};

use crate::config::DetailLimits;
use crate::extract::is_truthy;

/// Snapshot keys matching this are listed first.
static PRIORITY_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"roster|player|hero|character|team|match_info")
        .expect("priority key pattern is valid")
});

const ATTACKER_KEYS: &[&str] = &["attacker", "killer", "source", "attackerName"];
const VICTIM_KEYS: &[&str] = &["victim", "target", "victimName"];
const ABILITY_KEYS: &[&str] = &["ability", "weapon", "skill"];

/// Marker appended when pairs were dropped.
pub const ELLIPSIS: &str = " …";

/// Details text for any entry.
pub fn details_for(entry: &TimelineEntry, kill: &KillCategory, limits: &DetailLimits) -> String {
    match entry.kind {
        EntryKind::Snapshot => snapshot_details(&entry.payload, limits),
        EntryKind::Occurrence => occurrence_details(entry, kill, limits),
    }
}

fn snapshot_details(payload: &Value, limits: &DetailLimits) -> String {
    let info = match payload.get("info") {
        Some(Value::Null) | None => payload,
        Some(info) => info,
    };
    let mut pairs = flatten_pairs(info, limits.max_depth, limits.value_chars);
    // Stable: non-priority keys keep their relative order.
    pairs.sort_by_key(|(key, _)| !PRIORITY_KEY.is_match(key));
    join_pairs(&pairs, limits.info_pairs)
}

fn occurrence_details(entry: &TimelineEntry, kill: &KillCategory, limits: &DetailLimits) -> String {
    let data: Cow<'_, Value> = match entry.payload.get("data") {
        Some(Value::String(text)) => match serde_json::from_str(text) {
            Ok(decoded) => Cow::Owned(decoded),
            Err(_) => return raw_text(&entry.payload, limits.raw_chars),
        },
        Some(data) if is_truthy(data) => Cow::Borrowed(data),
        _ => Cow::Owned(Value::Object(Map::new())),
    };

    if entry.is_kill(kill) {
        kill_summary(&data)
    } else {
        let pairs = flatten_pairs(&data, limits.max_depth, limits.value_chars);
        join_pairs(&pairs, limits.event_pairs)
    }
}

/// `attacker → victim (ability) HS dmg:N`, with `?` for unknown names.
pub fn kill_summary(data: &Value) -> String {
    let attacker = first_present(data, ATTACKER_KEYS).unwrap_or_else(|| "?".to_string());
    let victim = first_present(data, VICTIM_KEYS).unwrap_or_else(|| "?".to_string());

    let mut out = format!("{attacker} → {victim}");
    if let Some(ability) = first_present(data, ABILITY_KEYS) {
        out.push_str(&format!(" ({ability})"));
    }
    if data.get("headshot").is_some_and(is_truthy) {
        out.push_str(" HS");
    }
    if let Some(damage) = data.get("damage").filter(|d| is_truthy(d)) {
        out.push_str(&format!(" dmg:{}", render_scalar(damage)));
    }
    out
}

fn first_present(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| data.get(*k))
        .find(|v| is_truthy(v))
        .map(render_scalar)
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn raw_text(payload: &Value, max_chars: usize) -> String {
    truncate_chars(&payload.to_string(), max_chars)
}

// ============================================================================
// Flattening
// ============================================================================

/// Flatten a JSON value into `(key, value)` pairs, descending at most
/// `max_depth` levels below the top.
pub fn flatten_pairs(value: &Value, max_depth: usize, value_chars: usize) -> Vec<(String, String)> {
    let mut out = Vec::new();
    match value {
        Value::Null => {}
        Value::Array(_) | Value::Object(_) => walk(value, max_depth as isize, "", value_chars, &mut out),
        scalar => out.push((String::new(), render_leaf(scalar, value_chars))),
    }
    out
}

fn walk(value: &Value, depth: isize, prefix: &str, value_chars: usize, out: &mut Vec<(String, String)>) {
    if depth < 0 {
        return;
    }
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let key = format!("{prefix}[{i}]");
                visit(item, depth, key, value_chars, out);
            }
        }
        Value::Object(map) => {
            for (k, item) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                visit(item, depth, key, value_chars, out);
            }
        }
        _ => {}
    }
}

fn visit(item: &Value, depth: isize, key: String, value_chars: usize, out: &mut Vec<(String, String)>) {
    match item {
        Value::Array(_) | Value::Object(_) => walk(item, depth - 1, &key, value_chars, out),
        leaf => out.push((key, render_leaf(leaf, value_chars))),
    }
}

fn render_leaf(value: &Value, value_chars: usize) -> String {
    match value {
        Value::String(s) => truncate_chars(s, value_chars),
        other => other.to_string(),
    }
}

/// Join at most `cap` pairs as `k=v, k=v`, appending [`ELLIPSIS`] if any
/// were dropped.
pub fn join_pairs(pairs: &[(String, String)], cap: usize) -> String {
    let mut out = pairs
        .iter()
        .take(cap)
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");
    if pairs.len() > cap {
        out.push_str(ELLIPSIS);
    }
    out
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> DetailLimits {
        DetailLimits::default()
    }

    fn pairs(v: &Value) -> Vec<(String, String)> {
        flatten_pairs(v, 3, 120)
    }

    #[test]
    fn test_flatten_nested_keys() {
        let v = json!({"a": 1, "b": {"c": "x", "d": [true, null]}});
        let got = pairs(&v);
        assert_eq!(
            got,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b.c".to_string(), "x".to_string()),
                ("b.d[0]".to_string(), "true".to_string()),
                ("b.d[1]".to_string(), "null".to_string()),
            ]
        );
    }

    #[test]
    fn test_flatten_depth_limit() {
        let v = json!({"l0": {"l1": {"l2": {"l3": {"l4": "too deep"}, "v3": 3}}}});
        let got = pairs(&v);
        assert_eq!(got, vec![("l0.l1.l2.v3".to_string(), "3".to_string())]);
    }

    #[test]
    fn test_flatten_truncates_values() {
        let long = "x".repeat(200);
        let got = flatten_pairs(&json!({ "k": long }), 3, 120);
        assert_eq!(got[0].1.chars().count(), 120);
    }

    #[test]
    fn test_flatten_scalars_and_null() {
        assert!(pairs(&Value::Null).is_empty());
        assert_eq!(pairs(&json!(5)), vec![(String::new(), "5".to_string())]);
    }

    #[test]
    fn test_join_pairs_cap() {
        let p: Vec<_> = (0..5).map(|i| (format!("k{i}"), i.to_string())).collect();
        assert_eq!(join_pairs(&p, 5), "k0=0, k1=1, k2=2, k3=3, k4=4");
        assert_eq!(join_pairs(&p, 2), "k0=0, k1=1 …");
    }

    #[test]
    fn test_kill_summary() {
        let d = json!({"attacker": "Ana", "victim": "Bob", "weapon": "rifle", "headshot": true, "damage": 120});
        assert_eq!(kill_summary(&d), "Ana → Bob (rifle) HS dmg:120");

        let sparse = json!({"killer": "", "source": "Cid"});
        assert_eq!(kill_summary(&sparse), "Cid → ?");
    }

    #[test]
    fn test_kill_details_decode_string_data() {
        let entry = TimelineEntry::occurrence(
            0,
            json!({"name": "kill_feed", "data": "{\"attacker\":\"A\",\"victim\":\"B\"}"}),
            0,
        );
        let text = details_for(&entry, &KillCategory::default(), &limits());
        assert_eq!(text, "A → B");
    }

    #[test]
    fn test_event_details_flatten_data() {
        let entry = TimelineEntry::occurrence(0, json!({"name": "heal", "data": {"amount": 40, "to": "Ana"}}), 0);
        let text = details_for(&entry, &KillCategory::default(), &limits());
        assert_eq!(text, "amount=40, to=Ana");
    }

    #[test]
    fn test_event_details_bad_string_data_falls_back_to_raw() {
        let entry = TimelineEntry::occurrence(0, json!({"name": "x", "data": "not json"}), 0);
        let text = details_for(&entry, &KillCategory::default(), &limits());
        assert!(text.starts_with('{'));
        assert!(text.contains("not json"));
    }

    #[test]
    fn test_snapshot_details_prioritise_roster() {
        let entry = TimelineEntry::snapshot(
            0,
            json!({"info": {"game": {"phase": "live"}, "roster": {"p1": "Ana"}, "zeta": 1}}),
            0,
        );
        let text = details_for(&entry, &KillCategory::default(), &limits());
        assert_eq!(text, "roster.p1=Ana, game.phase=live, zeta=1");
    }

    #[test]
    fn test_snapshot_details_cap() {
        let mut info = Map::new();
        for i in 0..30 {
            info.insert(format!("k{i:02}"), json!(i));
        }
        let entry = TimelineEntry::snapshot(0, json!({ "info": info }), 0);
        let text = details_for(&entry, &KillCategory::default(), &limits());
        assert!(text.ends_with(ELLIPSIS));
        assert_eq!(text.matches('=').count(), 28);
    }
}
