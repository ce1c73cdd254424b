//! Bridge from Bevy's `tracing` spans to Micromegas thread-local spans.
//!
//! With the `trace` feature Bevy emits a `tracing` span for every schedule
//! run.  This layer listens for those "schedule" spans and forwards them as
//! Micromegas named-scope events, so schedule timing shows up in the trace
//! timeline alongside the game's own `span_fn` scopes.

use micromegas_tracing::dispatch::{on_begin_named_scope, on_end_named_scope};
use micromegas_tracing::intern_string::intern_string;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

// All bridged schedule spans share a single static source location.
micromegas_tracing::static_span_location!(BRIDGE_LOCATION);

/// Interned scope label stored in each schedule span's extensions.
struct ScopeLabel {
    name: &'static str,
}

/// Field visitor that pulls the `name` field out of a schedule span.
struct NameVisitor {
    name: Option<String>,
}

impl Visit for NameVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "name" {
            self.name = Some(format!("{:?}", value));
        }
    }
}

/// A `tracing_subscriber::Layer` that bridges Bevy schedule spans into
/// Micromegas thread-local named-scope events.
pub struct MicromegasBridgeLayer;

impl<S> Layer<S> for MicromegasBridgeLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if attrs.metadata().name() != "schedule" {
            return;
        }

        let mut visitor = NameVisitor { name: None };
        attrs.record(&mut visitor);

        let label = visitor.name.unwrap_or_default();
        let interned = intern_string(&label);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(ScopeLabel { name: interned });
        }
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let extensions = span.extensions();
            if let Some(label) = extensions.get::<ScopeLabel>() {
                on_begin_named_scope(&BRIDGE_LOCATION, label.name);
            }
        }
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let extensions = span.extensions();
            if let Some(label) = extensions.get::<ScopeLabel>() {
                on_end_named_scope(&BRIDGE_LOCATION, label.name);
            }
        }
    }
}
