//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Central registry and dispatcher for named events. Each event name maps to one Channel,
// created on first registration and kept for the mediator's lifetime.
//
// | Name            | Description                                     | Key Methods             |
// |-----------------|-------------------------------------------------|-------------------------|
// | EmitterMediator | Owns the channel map, registers and emits       | register, emit          |
// | raise_unhandled | Builds the fault for an emitted error event     |                         |
//--------------------------------------------------------------------------------------------------

use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use super::channel::{Channel, Subscription};
use super::event_types::{EmitterError, EmitterResult, UnhandledError};
use crate::config::Config;
use crate::domain::models::{Arg, Listener, Payload};

/// Builds the fault raised when `event` (the configured error event) is emitted.
///
/// If the first value is an error instance, that instance is raised as-is.
/// Anything else is wrapped in a new error whose context is the raw value.
pub fn raise_unhandled(event: &str, values: Vec<Arg>) -> UnhandledError {
    match values.into_iter().next() {
        Some(Arg::Error(err)) => UnhandledError::Raised(err),
        Some(Arg::Value(value)) => UnhandledError::unspecified(event, Some(value)),
        None => UnhandledError::unspecified(event, None),
    }
}

pub(crate) fn validate_event_name(name: &str) -> EmitterResult<()> {
    if name.is_empty() {
        return Err(EmitterError::InvalidArgument(
            "event name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Registry of event channels.
///
/// Share it behind an `Arc`; every method takes `&self`. Channel creation is
/// serialized by the map's write lock, so two racing registrations for a new
/// name still end up on one channel.
pub struct EmitterMediator {
    channels: RwLock<HashMap<String, Arc<Channel>>>,
    channel_count: AtomicUsize,
    config: Config,
}

impl fmt::Debug for EmitterMediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterMediator")
            .field("source", &self.config.source)
            .field("channel_count", &self.channel_count())
            .finish()
    }
}

impl Default for EmitterMediator {
    fn default() -> Self {
        Self::new()
    }
}

impl EmitterMediator {
    /// Creates a mediator with the default config.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        info!(source = %config.source, fault_policy = %config.fault_policy, "Created new EmitterMediator");
        Self {
            channels: RwLock::new(HashMap::new()),
            channel_count: AtomicUsize::new(0),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Attaches `listener` to the channel for `name`, creating the channel on
    /// first use. Returns `self` so calls can be chained.
    pub fn register(&self, name: &str, listener: Listener) -> EmitterResult<&Self> {
        self.subscribe(name, listener)?;
        Ok(self)
    }

    /// Like [`register`](Self::register) but hands back a [`Subscription`]
    /// that can detach this one listener later.
    pub fn subscribe(&self, name: &str, listener: Listener) -> EmitterResult<Subscription> {
        validate_event_name(name)?;
        let channel = self.channel_or_create(name);
        Ok(channel.subscribe(listener))
    }

    /// Emits `values` on `name`.
    ///
    /// Returns `Ok(false)` when nobody ever registered for `name`. Emitting the
    /// configured error event always fails with [`EmitterError::Unhandled`].
    pub fn emit(&self, name: &str, values: Vec<Arg>) -> EmitterResult<bool> {
        if name == self.config.error_event {
            return Err(raise_unhandled(name, values).into());
        }

        let channel = self.channel(name);
        let Some(channel) = channel else {
            debug!(source = %self.config.source, event = name, "No channel for event");
            return Ok(false);
        };

        let payload = Payload::from_args(values);
        let invoked = channel.publish(&payload, self.config.fault_policy)?;
        debug!(source = %self.config.source, event = name, arity = payload.arity(), invoked, "Event emitted");
        Ok(true)
    }

    /// Number of distinct event names that have a channel. Never decreases.
    pub fn channel_count(&self) -> usize {
        self.channel_count.load(Ordering::SeqCst)
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.read().contains_key(name)
    }

    /// Listeners currently attached to `name`; zero when there is no channel.
    pub fn listener_count(&self, name: &str) -> usize {
        self.channel(name).map_or(0, |channel| channel.listener_count())
    }

    /// Names with a channel, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.read().get(name).cloned()
    }

    fn channel_or_create(&self, name: &str) -> Arc<Channel> {
        if let Some(channel) = self.channel(name) {
            return channel;
        }

        let mut channels = self.channels.write();
        match channels.entry(name.to_string()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let channel = Arc::new(Channel::new(name));
                entry.insert(Arc::clone(&channel));
                let count = self.channel_count.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(source = %self.config.source, event = name, channels = count, "Created channel");
                channel
            }
        }
    }
}
