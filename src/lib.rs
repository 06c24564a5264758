// Expose the modules
pub mod config;
pub mod domain;

// Re-export key types for easier usage
pub use config::{Config, ConfigError, FaultPolicy};
pub use domain::models::{Arg, Listener, Payload, SharedError, listener};
pub use domain::services::emitter::{
    EventEmitter, LegacySource, ListenerEntry, ListenerTable, MigrationReport, ObservableEmitter,
};
pub use domain::services::events::{
    Channel, EmitterError, EmitterMediator, EmitterResult, ListenerFault, ListenerFaults,
    Subscription, SubscriptionId, UnhandledError, raise_unhandled,
};
