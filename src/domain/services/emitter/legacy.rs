//--------------------------------------------------------------------------------------------------
// STRUCTS & TRAITS
//--------------------------------------------------------------------------------------------------
// | Name            | Description                                          | Key Methods          |
// |-----------------|------------------------------------------------------|----------------------|
// | LegacySource    | What migration needs from an existing emitter        | listener_table       |
// | ListenerEntry   | One name's listeners: a single callback or a list    | listeners            |
// | ListenerTable   | Ordered snapshot of an emitter's listeners           | get, iter            |
// | EventEmitter    | Classic callback emitter, the usual migration source | on, emit             |
//--------------------------------------------------------------------------------------------------

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::{Config, FaultPolicy};
use crate::domain::models::{Arg, Listener, Payload};
use crate::domain::services::events::{EmitterResult, dispatch, raise_unhandled, validate_event_name};

/// Access an emitter must grant for its listeners to be migrated.
pub trait LegacySource {
    /// Names that currently have at least one listener, in registration order.
    fn event_names(&self) -> Vec<String>;

    /// A shallow copy of the listener table. Later changes to the emitter do
    /// not affect the returned table.
    fn listener_table(&self) -> ListenerTable;

    /// Detaches every listener.
    fn remove_all_listeners(&self);
}

/// Listeners stored for one event name.
#[derive(Clone)]
pub enum ListenerEntry {
    Single(Listener),
    Many(Vec<Listener>),
}

impl ListenerEntry {
    /// Listeners in registration order, whichever form the entry has.
    pub fn listeners(&self) -> &[Listener] {
        match self {
            ListenerEntry::Single(listener) => std::slice::from_ref(listener),
            ListenerEntry::Many(listeners) => listeners,
        }
    }

    pub fn len(&self) -> usize {
        self.listeners().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners().is_empty()
    }
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerEntry::Single(_) => write!(f, "Single(<listener>)"),
            ListenerEntry::Many(listeners) => write!(f, "Many([{} listeners])", listeners.len()),
        }
    }
}

/// Event name to listeners, kept in first-registration order.
#[derive(Debug, Clone, Default)]
pub struct ListenerTable {
    entries: Vec<(String, ListenerEntry)>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ListenerEntry> {
        self.entries
            .iter()
            .find(|(event, _)| event == name)
            .map(|(_, entry)| entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ListenerEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of event names in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total listeners across all names
    pub fn listener_total(&self) -> usize {
        self.entries.iter().map(|(_, entry)| entry.len()).sum()
    }

    /// Appends `listener` under `name`. The first listener is stored as
    /// `Single`; the second turns the entry into `Many`.
    pub fn insert(&mut self, name: &str, listener: Listener) {
        match self.entries.iter_mut().find(|(event, _)| event == name) {
            None => self
                .entries
                .push((name.to_string(), ListenerEntry::Single(listener))),
            Some((_, entry)) => {
                *entry = match std::mem::replace(entry, ListenerEntry::Many(Vec::new())) {
                    ListenerEntry::Single(existing) => ListenerEntry::Many(vec![existing, listener]),
                    ListenerEntry::Many(mut listeners) => {
                        listeners.push(listener);
                        ListenerEntry::Many(listeners)
                    }
                };
            }
        }
    }

    /// Removes the most recently added occurrence of `listener` under `name`.
    /// A `Many` entry left with one listener collapses back to `Single`; an
    /// emptied entry is dropped.
    pub fn remove(&mut self, name: &str, listener: &Listener) -> bool {
        let Some(index) = self.entries.iter().position(|(event, _)| event == name) else {
            return false;
        };

        let removed = match &mut self.entries[index].1 {
            ListenerEntry::Single(existing) => {
                if Arc::ptr_eq(existing, listener) {
                    self.entries.remove(index);
                    return true;
                }
                false
            }
            ListenerEntry::Many(listeners) => {
                match listeners.iter().rposition(|l| Arc::ptr_eq(l, listener)) {
                    Some(pos) => {
                        listeners.remove(pos);
                        true
                    }
                    None => false,
                }
            }
        };

        if removed {
            let entry = &mut self.entries[index].1;
            if let ListenerEntry::Many(listeners) = entry {
                match listeners.len() {
                    0 => {
                        self.entries.remove(index);
                    }
                    1 => {
                        let last = listeners.remove(0);
                        *entry = ListenerEntry::Single(last);
                    }
                    _ => {}
                }
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A classic callback event emitter.
///
/// Listeners are invoked directly from its own table, with the same payload
/// shape a mediator delivers. Emitting the error event with no error listener
/// fails the same way a mediator does; with an error listener it is delivered
/// like any other event.
pub struct EventEmitter {
    table: RwLock<ListenerTable>,
    error_event: String,
    fault_policy: FaultPolicy,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("table", &*self.table.read())
            .finish()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            table: RwLock::new(ListenerTable::new()),
            error_event: config.error_event.clone(),
            fault_policy: config.fault_policy,
        }
    }

    pub fn on(&self, name: &str, listener: Listener) -> EmitterResult<&Self> {
        validate_event_name(name)?;
        self.table.write().insert(name, listener);
        Ok(self)
    }

    pub fn add_listener(&self, name: &str, listener: Listener) -> EmitterResult<&Self> {
        self.on(name, listener)
    }

    /// Detaches `listener` from `name`, matching by pointer identity.
    pub fn remove_listener(&self, name: &str, listener: &Listener) -> bool {
        self.table.write().remove(name, listener)
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.table.read().get(name).map_or(0, ListenerEntry::len)
    }

    /// Calls every listener of `name` with the arity-aware payload.
    /// Returns `Ok(false)` when `name` has no listeners.
    pub fn emit(&self, name: &str, values: Vec<Arg>) -> EmitterResult<bool> {
        let listeners: Vec<Listener> = {
            let table = self.table.read();
            table
                .get(name)
                .map(|entry| entry.listeners().to_vec())
                .unwrap_or_default()
        };

        if listeners.is_empty() {
            if name == self.error_event {
                return Err(raise_unhandled(name, values).into());
            }
            return Ok(false);
        }

        let payload = Payload::from_args(values);
        dispatch(name, &listeners, &payload, self.fault_policy)?;
        Ok(true)
    }
}

impl LegacySource for EventEmitter {
    fn event_names(&self) -> Vec<String> {
        self.table.read().names()
    }

    fn listener_table(&self) -> ListenerTable {
        self.table.read().clone()
    }

    fn remove_all_listeners(&self) {
        let mut table = self.table.write();
        debug!(events = table.len(), listeners = table.listener_total(), "Removing all legacy listeners");
        table.clear();
    }
}
