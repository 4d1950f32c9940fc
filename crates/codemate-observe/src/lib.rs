//! Observability setup for codemate: the tracing subscriber and optional
//! OpenTelemetry export.

pub mod tracing_setup;
