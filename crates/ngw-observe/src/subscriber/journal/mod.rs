use ngw_core::Subscribe;
use ngw_model::RunEvent;

use crate::subscriber::view::log_event;

/// Writes every runner event to the tracing pipeline.
#[derive(Debug, Default)]
pub struct Journal;

impl Journal {
    pub fn new() -> Self {
        Self
    }
}

impl Subscribe for Journal {
    fn on_event(&self, event: &RunEvent) {
        log_event(event);
    }

    fn name(&self) -> &'static str {
        "journal"
    }
}
