// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flat, serializable touch event records.
//!
//! An event is a header (flag word, timestamp, touch count) followed by a
//! fixed number of touches. Its wire form is a single little-endian block:
//! the header, then the touches in order. Encoding allocates the block
//! once; decoding is checked and rejects truncated or oversized buffers.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Wire length of the event header: flags (4) + timestamp (8) + count (2).
pub const INFO_WIRE_LEN: usize = 14;

/// Wire length of one touch: timestamp (8) + tap count (4) + phase (4) +
/// bounding rectangle (32).
pub const TOUCH_WIRE_LEN: usize = 48;

/// Phase of a touch point within its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    #[default]
    Began,
    Moved,
    Stationary,
    KeepAlive,
}

impl TouchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Began => "began",
            Self::Moved => "moved",
            Self::Stationary => "stationary",
            Self::KeepAlive => "keep_alive",
        }
    }

    fn to_wire(self) -> u32 {
        match self {
            Self::Began => 0,
            Self::Moved => 1,
            Self::Stationary => 2,
            Self::KeepAlive => 3,
        }
    }

    fn from_wire(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Began),
            1 => Some(Self::Moved),
            2 => Some(Self::Stationary),
            3 => Some(Self::KeepAlive),
            _ => None,
        }
    }
}

impl std::fmt::Display for TouchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location and extent of a touch in device coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TouchRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TouchRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// A single finger sample at a moment in time. By-value, no heap
/// resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    /// Seconds on the device's monotonic clock.
    pub timestamp: f64,
    pub tap_count: u32,
    pub phase: TouchPhase,
    pub bounds: TouchRect,
}

/// Header shared by every touch in an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub flags: u32,
    pub timestamp: f64,
}

/// A set of touches sharing a header timestamp and flag word.
///
/// Created with a fixed touch count; the producing driver writes the
/// fields before first dispatch, after which the event is treated as
/// logically immutable while it propagates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub info: EventInfo,
    touches: Vec<Touch>,
}

impl Event {
    /// Zero-initialized event holding `touch_count` touches.
    pub fn new(touch_count: u16) -> Self {
        Self {
            info: EventInfo::default(),
            touches: vec![Touch::default(); usize::from(touch_count)],
        }
    }

    pub fn touch_count(&self) -> u16 {
        self.touches.len() as u16
    }

    pub fn touches(&self) -> &[Touch] {
        &self.touches
    }

    /// Mutable view of the touches. The count is fixed at creation.
    pub fn touches_mut(&mut self) -> &mut [Touch] {
        &mut self.touches
    }

    /// Serialized length: header plus one block per touch.
    pub fn wire_len(&self) -> usize {
        INFO_WIRE_LEN + self.touches.len() * TOUCH_WIRE_LEN
    }

    /// Encode into a single flat allocation.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        buf.put_u32_le(self.info.flags);
        buf.put_f64_le(self.info.timestamp);
        buf.put_u16_le(self.touch_count());
        for touch in &self.touches {
            buf.put_f64_le(touch.timestamp);
            buf.put_u32_le(touch.tap_count);
            buf.put_u32_le(touch.phase.to_wire());
            buf.put_f64_le(touch.bounds.x);
            buf.put_f64_le(touch.bounds.y);
            buf.put_f64_le(touch.bounds.width);
            buf.put_f64_le(touch.bounds.height);
        }
        buf.freeze()
    }

    /// Decode a wire-format event. The buffer must hold exactly one event.
    pub fn from_bytes(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < INFO_WIRE_LEN {
            return Err(Error::MalformedEvent("truncated header"));
        }
        let flags = buf.get_u32_le();
        let timestamp = buf.get_f64_le();
        let touch_count = buf.get_u16_le();

        let body = usize::from(touch_count) * TOUCH_WIRE_LEN;
        if buf.len() < body {
            return Err(Error::MalformedEvent("truncated touch data"));
        }
        if buf.len() > body {
            return Err(Error::MalformedEvent("trailing bytes"));
        }

        let mut touches = Vec::with_capacity(usize::from(touch_count));
        for _ in 0..touch_count {
            let timestamp = buf.get_f64_le();
            let tap_count = buf.get_u32_le();
            let phase = TouchPhase::from_wire(buf.get_u32_le())
                .ok_or(Error::MalformedEvent("unknown touch phase"))?;
            let bounds = TouchRect {
                x: buf.get_f64_le(),
                y: buf.get_f64_le(),
                width: buf.get_f64_le(),
                height: buf.get_f64_le(),
            };
            touches.push(Touch { timestamp, tap_count, phase, bounds });
        }

        Ok(Self { info: EventInfo { flags, timestamp }, touches })
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
