use std::sync::Arc;

use ngw_model::RunEvent;

/// Observer of runner lifecycle events.
///
/// Called synchronously from the runner; implementations must not block.
pub trait Subscribe: Send + Sync + 'static {
    fn on_event(&self, event: &RunEvent);

    fn name(&self) -> &'static str;
}

/// Delivers `event` to every subscriber in registration order.
pub(crate) fn fan_out(subscribers: &[Arc<dyn Subscribe>], event: &RunEvent) {
    for sub in subscribers {
        tracing::trace!(target: "ngw.core.subscriber", subscriber = sub.name(), kind = ?event.kind, "deliver");
        sub.on_event(event);
    }
}
