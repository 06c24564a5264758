//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name           | Description                                        | Key Methods            |
// |----------------|----------------------------------------------------|------------------------|
// | Channel        | Multicast subject for one event name               | subscribe, publish     |
// | Subscription   | Handle that detaches a single listener             | unsubscribe            |
// | SubscriptionId | Identifier of a listener within a channel          | new                    |
//--------------------------------------------------------------------------------------------------

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};
use uuid::Uuid;

use super::event_types::{ListenerFault, ListenerFaults};
use crate::config::FaultPolicy;
use crate::domain::models::{Listener, Payload};

/// Identifier of one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned when subscribing to a channel.
///
/// Dropping the handle keeps the listener attached; call
/// [`Subscription::unsubscribe`] to detach it.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    event: String,
    channel: Weak<Channel>,
}

impl Subscription {
    /// Returns the subscription ID
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Event name this subscription listens on
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Detaches the listener. Returns `false` if it was already detached or
    /// the channel no longer exists.
    pub fn unsubscribe(&self) -> bool {
        match self.channel.upgrade() {
            Some(channel) => channel.unsubscribe(self.id),
            None => false,
        }
    }

    /// Whether the listener is still attached
    pub fn is_active(&self) -> bool {
        self.channel
            .upgrade()
            .is_some_and(|channel| channel.contains(self.id))
    }
}

/// Multicast subject for a single event name.
///
/// Listeners run synchronously on the publisher's stack, in the order they
/// subscribed. The listener list is snapshotted before dispatch and the lock
/// released, so a listener may subscribe or unsubscribe while being called:
/// one added mid-dispatch first runs on the next publish, one removed
/// mid-dispatch still runs in the current one.
pub struct Channel {
    name: String,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches `listener` after every existing one.
    pub fn subscribe(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = SubscriptionId::new();
        let count = {
            let mut listeners = self.listeners.write();
            listeners.push((id, listener));
            listeners.len()
        };
        debug!(event = %self.name, subscription = %id, total = count, "Listener subscribed");

        Subscription {
            id,
            event: self.name.clone(),
            channel: Arc::downgrade(self),
        }
    }

    /// Removes the listener with the given id, if present.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        let removed = listeners.len() != before;
        if removed {
            debug!(event = %self.name, subscription = %id, "Listener unsubscribed");
        }
        removed
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.listeners.read().iter().any(|(sid, _)| *sid == id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Pushes `payload` to every listener subscribed when the call starts.
    ///
    /// Returns how many listeners were invoked. Listener errors are handled
    /// according to `policy`; panics are not caught.
    pub fn publish(&self, payload: &Payload, policy: FaultPolicy) -> Result<usize, ListenerFaults> {
        // Avoid holding the lock while listeners run
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.read();
            listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        dispatch(&self.name, &snapshot, payload, policy)
    }
}

/// Runs `listeners` in order with `payload`, applying `policy` to failures.
///
/// Returns how many listeners were invoked, or every collected fault.
pub(crate) fn dispatch(
    event: &str,
    listeners: &[Listener],
    payload: &Payload,
    policy: FaultPolicy,
) -> Result<usize, ListenerFaults> {
    let mut faults = Vec::new();
    let mut invoked = 0;
    for (position, listener) in listeners.iter().enumerate() {
        invoked += 1;
        if let Err(error) = listener(payload) {
            warn!(event = %event, position, %error, "Listener failed");
            faults.push(ListenerFault { position, error });
            if policy == FaultPolicy::FailFast {
                break;
            }
        }
    }

    if faults.is_empty() {
        Ok(invoked)
    } else {
        Err(ListenerFaults {
            event: event.to_string(),
            faults,
        })
    }
}
