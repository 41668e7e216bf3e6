// src/events/bus/event_bus.rs
//
// Synchronous, type-keyed event bus
//
// RULES:
// - Handlers run on the emitting thread, in subscription order
// - Every emission is logged, with or without handlers
// - No lock is held while a handler runs

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, error};

use crate::events::types::DomainEvent;

/// Type-erased handler; downcasts to its concrete event inside
type EventHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Per-session publish/subscribe hub
///
/// The build configuration publishes here; the compatibility engine and the
/// power budget subscribe without knowing about each other.
///
/// `emit` runs every handler before returning, in subscription order. The
/// handler table is not locked while handlers run, so a handler may emit or
/// subscribe on the same bus.
pub struct EventBus {
    handlers: Arc<RwLock<HashMap<TypeId, Vec<EventHandler>>>>,
    event_log: Arc<RwLock<Vec<EventLogEntry>>>,
}

/// One emission, as recorded in the log
#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub event_type: String,
    pub event_id: String,
    pub occurred_at: String,
    pub handler_count: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            event_log: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register `handler` for events of type `E`
    ///
    /// ```ignore
    /// bus.subscribe::<BuildSaved, _>(|event| {
    ///     println!("saved build {}", event.build_id);
    /// });
    /// ```
    pub fn subscribe<E, F>(&self, handler: F)
    where
        E: DomainEvent + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: EventHandler = Arc::new(move |event: &dyn Any| match event.downcast_ref::<E>() {
            Some(event) => handler(event),
            None => error!(
                "Handler for {} received another event type",
                std::any::type_name::<E>()
            ),
        });

        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// Record `event` and run its handlers
    ///
    /// A panicking handler is logged and the remaining handlers still run.
    pub fn emit<E>(&self, event: E)
    where
        E: DomainEvent + 'static,
    {
        let handlers: Vec<EventHandler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();

        let entry = EventLogEntry {
            event_type: event.event_type().to_string(),
            event_id: event.event_id().to_string(),
            occurred_at: event.occurred_at().to_rfc3339(),
            handler_count: handlers.len(),
        };
        debug!(
            "[EVENT] {} ({}) -> {} handlers",
            entry.event_type, entry.event_id, entry.handler_count
        );
        self.event_log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);

        for (idx, handler) in handlers.iter().enumerate() {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(&event as &dyn Any)
            }));
            if let Err(panic) = outcome {
                error!(
                    "Handler {} for {} panicked: {:?}",
                    idx,
                    event.event_type(),
                    panic
                );
            }
        }
    }

    /// Get the event log (for debugging)
    pub fn get_event_log(&self) -> Vec<EventLogEntry> {
        self.event_log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear the event log
    pub fn clear_event_log(&self) {
        self.event_log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Get the number of subscribers for a specific event type
    pub fn subscriber_count<E>(&self) -> usize
    where
        E: 'static,
    {
        let type_id = TypeId::of::<E>();
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.get(&type_id).map(|h| h.len()).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// Cloning shares the same handlers and log
impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            event_log: Arc::clone(&self.event_log),
        }
    }
}
