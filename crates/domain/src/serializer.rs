//! Explicit event type registry and the payload codec built on it.
//!
//! Every event type the notebook writes is registered once, by name, with a
//! function that turns its JSON payload back into a [`NotebookEvent`].
//! Encoding refuses types missing from the registry, so anything that reaches
//! the log can be decoded again.

use std::collections::HashMap;
use std::sync::Arc;

use event_store::{EventEnvelope, Position};
use thiserror::Error;

use crate::aggregate::DomainEvent;
use crate::event::{NotebookEvent, RecordedEvent};
use crate::{category, note, tag, todo};

/// Turns a stored payload back into a typed event.
pub type DecodeFn = fn(serde_json::Value) -> Result<NotebookEvent, serde_json::Error>;

/// Errors raised while encoding or decoding event payloads.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// The log holds an event type nobody registered.
    #[error("Unknown event type {event_type:?} at position {position}")]
    UnknownEventType {
        event_type: String,
        position: Position,
    },

    /// The payload did not match the registered shape.
    #[error("Cannot decode {event_type} at position {position}: {source}")]
    Decode {
        event_type: String,
        position: Position,
        #[source]
        source: serde_json::Error,
    },

    /// The event could not be turned into JSON.
    #[error("Cannot encode {event_type}: {source}")]
    Encode {
        event_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// An attempt to write an event type that has no decoder.
    #[error("Event type {0} is not registered")]
    Unregistered(&'static str),

    /// The same event type was registered twice.
    #[error("Event type {0} is already registered")]
    Duplicate(&'static str),
}

/// Mapping from event type name to its decoder.
#[derive(Debug, Default)]
pub struct EventRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl EventRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every notebook event type.
    pub fn standard() -> Result<Self, SerializationError> {
        let mut registry = Self::new();
        category::register_events(&mut registry)?;
        note::register_events(&mut registry)?;
        tag::register_events(&mut registry)?;
        todo::register_events(&mut registry)?;
        Ok(registry)
    }

    /// Registers a decoder for `event_type`.
    pub fn register(
        &mut self,
        event_type: &'static str,
        decode: DecodeFn,
    ) -> Result<(), SerializationError> {
        if self.decoders.contains_key(event_type) {
            return Err(SerializationError::Duplicate(event_type));
        }
        self.decoders.insert(event_type, decode);
        Ok(())
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    fn decoder(&self, event_type: &str) -> Option<DecodeFn> {
        self.decoders.get(event_type).copied()
    }
}

/// Encodes domain events into payloads and decodes stored envelopes.
///
/// Cheap to clone; the registry is shared.
#[derive(Debug, Clone)]
pub struct EventSerializer {
    registry: Arc<EventRegistry>,
}

impl EventSerializer {
    pub fn new(registry: EventRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// A serializer over [`EventRegistry::standard`].
    pub fn standard() -> Result<Self, SerializationError> {
        Ok(Self::new(EventRegistry::standard()?))
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Serializes an event's payload.
    pub fn encode<E: DomainEvent>(&self, event: &E) -> Result<serde_json::Value, SerializationError> {
        let event_type = event.event_type();
        if !self.registry.contains(event_type) {
            return Err(SerializationError::Unregistered(event_type));
        }
        serde_json::to_value(event).map_err(|source| SerializationError::Encode { event_type, source })
    }

    /// Decodes a stored envelope into a typed, positioned event.
    pub fn decode(&self, envelope: &EventEnvelope) -> Result<RecordedEvent, SerializationError> {
        let decode = self.registry.decoder(&envelope.event_type).ok_or_else(|| {
            SerializationError::UnknownEventType {
                event_type: envelope.event_type.clone(),
                position: envelope.position,
            }
        })?;

        let event = decode(envelope.payload.clone()).map_err(|source| SerializationError::Decode {
            event_type: envelope.event_type.clone(),
            position: envelope.position,
            source,
        })?;

        Ok(RecordedEvent {
            position: envelope.position,
            stream_id: envelope.aggregate_id,
            version: envelope.version,
            timestamp: envelope.timestamp,
            event,
        })
    }
}
