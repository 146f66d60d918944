// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ownership-bearing envelopes around events or opaque bytes.

use bytes::Bytes;

use crate::event::Event;

/// A packet exclusively owns its payload; dropping the packet releases it.
///
/// Foreign buffers enter the system as [`Bytes`] — including
/// [`Bytes::from_owner`] for payloads that carry their own release logic —
/// so the envelope itself never tracks a disposer.
///
/// Cloning produces an independent packet: a deep copy for events, and for
/// raw payloads an immutable shared view indistinguishable from a byte
/// copy. Construction never fails; allocation failure is fatal.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Packet {
    #[default]
    Empty,
    Event(Event),
    Raw(Bytes),
}

impl Packet {
    pub fn event(event: Event) -> Self {
        Self::Event(event)
    }

    pub fn raw(data: impl Into<Bytes>) -> Self {
        Self::Raw(data.into())
    }

    /// Serialized view of the payload. Zero-copy for raw payloads; events
    /// encode into their flat wire block.
    pub fn serialize(&self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Event(event) => event.to_bytes(),
            Self::Raw(data) => data.clone(),
        }
    }

    /// Serialized length, without encoding.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Event(event) => event.wire_len(),
            Self::Raw(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Bytes> {
        match self {
            Self::Raw(data) => Some(data),
            _ => None,
        }
    }

    /// Variant name for log fields.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Event(_) => "event",
            Self::Raw(_) => "raw",
        }
    }
}

#[cfg(test)]
#[path = "packet_tests.rs"]
mod tests;
