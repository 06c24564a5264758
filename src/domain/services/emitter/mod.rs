//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module contains the emitter facade and everything needed to move listeners off a classic
// callback emitter and onto an EmitterMediator.
//--------------------------------------------------------------------------------------------------

// +----------------------------------------------------------+
// | MODULES                                                  |
// +----------------------------------------------------------+
// | Exports:                                                 |
// |   - ObservableEmitter (struct)                           |
// |   - LegacySource (trait)                                 |
// |   - EventEmitter, ListenerTable, ListenerEntry           |
// |   - MigrationReport (struct)                             |
// |   - MockLegacySource (for tests)                         |
// +----------------------------------------------------------+
pub mod adapter;
pub mod legacy;
pub mod migration;


pub use adapter::ObservableEmitter;
pub use legacy::{EventEmitter, LegacySource, ListenerEntry, ListenerTable};
pub use migration::MigrationReport;

#[cfg(test)]
use mockall::*;

#[cfg(test)]
mock! {
    pub LegacySource {}

    impl LegacySource for LegacySource {
        fn event_names(&self) -> Vec<String>;

        fn listener_table(&self) -> ListenerTable;

        fn remove_all_listeners(&self);
    }
}
