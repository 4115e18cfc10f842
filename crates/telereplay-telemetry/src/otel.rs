//! OTel internals: tracing layer and sampling.

use opentelemetry::trace::{
    Link, SamplingDecision, SamplingResult, SpanKind, TraceContextExt, TraceId, TraceState,
    TracerProvider as _,
};
use opentelemetry::{global, Context, KeyValue};
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider, ShouldSample, SpanLimits};
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;

use crate::{sampling_rate, TelemetryError};

/// Shuts down the tracer provider on drop, flushing pending spans.
pub struct OtelGuard {
    provider: SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(e) = self.provider.shutdown() {
            eprintln!("OTel shutdown error: {e}");
        }
    }
}

/// Build an OpenTelemetry tracing layer and guard.
///
/// Must be called inside a tokio runtime: the batch exporter spawns onto it.
/// Hold the guard for the life of the process.
pub fn otel_layer<S>(
    service_name: &str,
) -> Result<(OpenTelemetryLayer<S, SdkTracer>, OtelGuard), TelemetryError>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    tokio::runtime::Handle::try_current().map_err(|_| TelemetryError::NoRuntime)?;

    let exporter = SpanExporter::builder()
        .with_tonic()
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(ReplaySampler)
        .with_resource(resource)
        .with_span_limits(SpanLimits::default())
        .build();

    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer("telereplay");
    let layer = tracing_opentelemetry::layer().with_tracer(tracer);
    tracing::debug!(service = service_name, "OTel export enabled");

    Ok((layer, OtelGuard { provider }))
}

/// Sampler with per-prefix rates from [`sampling_rate`].
///
/// Children of a sampled parent and spans flagged as errors are always kept.
#[derive(Debug, Clone)]
struct ReplaySampler;

impl ShouldSample for ReplaySampler {
    fn should_sample(
        &self,
        parent_context: Option<&Context>,
        trace_id: TraceId,
        name: &str,
        span_kind: &SpanKind,
        attributes: &[KeyValue],
        links: &[Link],
    ) -> SamplingResult {
        if let Some(trace_state) = parent_context.and_then(sampled_parent_state) {
            return record_and_sample(trace_state);
        }
        if attributes.iter().any(is_error_flag) {
            return record_and_sample(TraceState::default());
        }

        Sampler::TraceIdRatioBased(sampling_rate(name)).should_sample(
            parent_context,
            trace_id,
            name,
            span_kind,
            attributes,
            links,
        )
    }
}

/// Trace state of the parent span, if that span was sampled.
fn sampled_parent_state(cx: &Context) -> Option<TraceState> {
    let span = cx.span();
    let parent = span.span_context();
    parent.is_sampled().then(|| parent.trace_state().clone())
}

fn is_error_flag(kv: &KeyValue) -> bool {
    matches!(
        (kv.key.as_str(), kv.value.as_str().as_ref()),
        ("otel.status_code", "ERROR") | ("error", "true")
    )
}

fn record_and_sample(trace_state: TraceState) -> SamplingResult {
    SamplingResult {
        decision: SamplingDecision::RecordAndSample,
        attributes: vec![],
        trace_state,
    }
}
