//! Span hooks for pipeline observability.
//!
//! The pipeline reports spans through this seam; the default sink discards
//! them. Deployments wanting OTEL (or anything else) implement `SpanHook`
//! once and hand it to the toolbox.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque span handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

/// Minimal tracing interface: open, annotate, close.
pub trait SpanHook: Send + Sync {
    fn start_span(&self, name: &str) -> SpanId;
    fn set_attr(&self, span: SpanId, key: &str, value: &str);
    fn end_span(&self, span: SpanId);
}

/// Default no-op sink.
pub struct NoopSpans {
    counter: AtomicU64,
}

impl NoopSpans {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }
}

impl Default for NoopSpans {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanHook for NoopSpans {
    fn start_span(&self, _name: &str) -> SpanId {
        SpanId(self.counter.fetch_add(1, Ordering::Relaxed))
    }

    fn set_attr(&self, _span: SpanId, _key: &str, _value: &str) {}

    fn end_span(&self, _span: SpanId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_spans_hand_out_distinct_ids() {
        let hook = NoopSpans::new();
        let a = hook.start_span("pipeline.run");
        let b = hook.start_span("stage.parse_resume");
        assert_ne!(a, b);
        hook.set_attr(a, "run_id", "run_1");
        hook.end_span(b);
        hook.end_span(a);
    }
}
