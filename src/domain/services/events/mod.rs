//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the stream side of the emitter: named multicast channels and the
// mediator that owns them. Dispatch is synchronous and in subscription order.
//
// | Component                | Description                                               |
// |--------------------------|-----------------------------------------------------------|
// | EmitterMediator          | Registry of channels, entry point for register and emit   |
// | Channel                  | Multicast subject for one event name                      |
// | Subscription             | Handle that detaches one listener                         |
// | EmitterError             | Error taxonomy for registration and dispatch              |
//--------------------------------------------------------------------------------------------------

mod channel;
mod event_types;
mod mediator;


// Re-exports
pub use channel::{Channel, Subscription, SubscriptionId};
pub use event_types::{EmitterError, EmitterResult, ListenerFault, ListenerFaults, UnhandledError};
pub use mediator::{EmitterMediator, raise_unhandled};
pub(crate) use channel::dispatch;
pub(crate) use mediator::validate_event_name;
