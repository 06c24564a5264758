//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Drop-in facade for code written against a classic emitter. Registration and emission are
// forwarded to a shared EmitterMediator; listeners already attached to a legacy emitter are
// moved across once, when the facade is built.
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::legacy::LegacySource;
use super::migration::MigrationReport;
use crate::domain::models::{Arg, Listener};
use crate::domain::services::events::{EmitterMediator, EmitterResult, Subscription};

/// Emitter facade backed by an [`EmitterMediator`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stream_emitter::{Arg, EmitterMediator, EventEmitter, ObservableEmitter, listener};
///
/// let legacy = EventEmitter::new();
/// legacy.on("tick", listener(|_| Ok(()))).unwrap();
///
/// let mediator = Arc::new(EmitterMediator::new());
/// let emitter = ObservableEmitter::new(Arc::clone(&mediator), Some(&legacy));
///
/// assert_eq!(emitter.migration_report().listeners_migrated, 1);
/// assert!(emitter.emit("tick", vec![Arg::from(1)]).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct ObservableEmitter {
    mediator: Arc<EmitterMediator>,
    migration: MigrationReport,
}

impl ObservableEmitter {
    /// Wraps `mediator`, migrating every listener of `legacy` onto it first.
    ///
    /// The legacy emitter is only used during this call.
    pub fn new(mediator: Arc<EmitterMediator>, legacy: Option<&dyn LegacySource>) -> Self {
        let mut emitter = Self {
            mediator,
            migration: MigrationReport::default(),
        };
        if let Some(legacy) = legacy {
            emitter.migration = emitter.migrate_from(legacy);
        }
        emitter
    }

    pub fn on(&self, name: &str, listener: Listener) -> EmitterResult<&Self> {
        self.mediator.register(name, listener)?;
        Ok(self)
    }

    pub fn add_listener(&self, name: &str, listener: Listener) -> EmitterResult<&Self> {
        self.on(name, listener)
    }

    /// Registers `listener` and returns a handle that can detach it.
    pub fn subscribe(&self, name: &str, listener: Listener) -> EmitterResult<Subscription> {
        self.mediator.subscribe(name, listener)
    }

    pub fn emit(&self, name: &str, values: Vec<Arg>) -> EmitterResult<bool> {
        self.mediator.emit(name, values)
    }

    pub fn mediator(&self) -> &Arc<EmitterMediator> {
        &self.mediator
    }

    /// Report of the migration run when this facade was built.
    pub fn migration_report(&self) -> MigrationReport {
        self.migration
    }

    /// Moves every listener of `legacy` onto the mediator, then detaches the
    /// legacy emitter.
    ///
    /// Works from a snapshot of the legacy table. Names are visited in the
    /// legacy emitter's order and each name's listeners keep their order. A
    /// legacy emitter with no events is left untouched.
    pub fn migrate_from(&self, legacy: &dyn LegacySource) -> MigrationReport {
        let mut report = MigrationReport::default();

        let names = legacy.event_names();
        if names.is_empty() {
            debug!("Legacy emitter has no events, nothing to migrate");
            return report;
        }

        let table = legacy.listener_table();
        if table.is_empty() {
            return report;
        }

        for name in &names {
            let Some(entry) = table.get(name) else {
                continue;
            };

            let migrated: EmitterResult<usize> =
                entry.listeners().iter().try_fold(0, |count, listener| {
                    self.mediator.register(name, Arc::clone(listener))?;
                    Ok(count + 1)
                });

            match migrated {
                Ok(count) => {
                    debug!(event = %name, listeners = count, "Migrated legacy listeners");
                    // The mediator raises on its error event instead of dispatching it
                    if *name == self.mediator.config().error_event {
                        warn!(
                            event = %name,
                            listeners = count,
                            "Migrated error event listeners will not be called"
                        );
                    }
                    report.events_migrated += 1;
                    report.listeners_migrated += count;
                }
                Err(err) => {
                    warn!(event = %name, error = %err, "Skipping legacy event");
                    report.events_skipped += 1;
                }
            }
        }

        legacy.remove_all_listeners();
        report.detached = true;

        info!(
            events = report.events_migrated,
            listeners = report.listeners_migrated,
            skipped = report.events_skipped,
            "Legacy emitter migrated"
        );
        report
    }
}
