use serde::{Deserialize, Serialize};

/// Outcome of moving a legacy emitter's listeners onto a mediator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Event names whose listeners were registered on the mediator
    pub events_migrated: usize,
    pub listeners_migrated: usize,
    /// Event names the mediator refused (e.g. empty names)
    pub events_skipped: usize,
    /// Whether the legacy emitter had its listeners removed
    pub detached: bool,
}

impl MigrationReport {
    /// True when nothing was migrated and the legacy emitter was left alone.
    pub fn is_noop(&self) -> bool {
        *self == MigrationReport::default()
    }
}
