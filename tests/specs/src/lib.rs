// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the end-to-end pipeline scenarios.

use std::time::Duration;

use tactile::event::{Event, Touch, TouchPhase, TouchRect};
use tactile::packet::Packet;

/// How long scenarios wait on worker-thread asynchrony.
pub const WAIT: Duration = Duration::from_secs(5);

/// Build a raw packet over a byte copy.
pub fn raw(bytes: &[u8]) -> Packet {
    Packet::raw(bytes.to_vec())
}

/// Build an event from `(phase, x, y, width, height)` touch tuples.
pub fn event(touches: &[(TouchPhase, f64, f64, f64, f64)]) -> Event {
    let mut event = Event::new(touches.len() as u16);
    for (slot, (phase, x, y, width, height)) in event.touches_mut().iter_mut().zip(touches) {
        *slot = Touch {
            phase: *phase,
            bounds: TouchRect::new(*x, *y, *width, *height),
            ..Touch::default()
        };
    }
    event
}
