// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: stub drivers and recording listeners.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::chain::{Accept, LayerDriver, LayerEngine, Listener};
use crate::error::{Error, Result};
use crate::input::{InputDriver, InputEngine, Poller};
use crate::options::Options;
use crate::output::{OutputDriver, OutputEngine};
use crate::packet::Packet;

/// A cloneable listener that records every delivery.
#[derive(Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<(String, Packet)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, Packet)> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `count` deliveries were recorded. Returns
    /// false on timeout.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.len() < count {
            if Instant::now() > deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        true
    }
}

impl Listener for Recorder {
    fn handle(&self, from: &str, packet: &Packet) -> Result<()> {
        self.entries.lock().push((from.to_owned(), packet.clone()));
        Ok(())
    }
}

/// An input driver that commits a fixed packet sequence each time polling
/// starts, then idles until stopped.
pub struct ScriptedInput {
    packets: Vec<Packet>,
}

impl ScriptedInput {
    pub fn new(packets: Vec<Packet>) -> Self {
        Self { packets }
    }
}

impl InputDriver for ScriptedInput {
    fn init(&self, _id: &str, _options: &Options) -> Result<Box<dyn InputEngine>> {
        Ok(Box::new(ScriptedEngine { packets: self.packets.clone() }))
    }
}

struct ScriptedEngine {
    packets: Vec<Packet>,
}

impl InputEngine for ScriptedEngine {
    fn run(&mut self, poller: &mut Poller<'_>) -> Result<()> {
        for packet in &self.packets {
            let _ = poller.commit(packet);
        }
        while !poller.must_stop() {
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(())
    }
}

/// An input driver whose packets are fed by the test through a shared
/// [`Feed`] handle, for scenarios that need packets committed at a
/// controlled point in the pipeline's lifecycle.
#[derive(Clone, Default)]
pub struct FeedInput {
    feed: Feed,
}

impl FeedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for pushing packets into the running driver.
    pub fn feed(&self) -> Feed {
        self.feed.clone()
    }
}

/// Cloneable handle feeding packets to a [`FeedInput`] engine.
#[derive(Clone, Default)]
pub struct Feed {
    queue: Arc<Mutex<VecDeque<Packet>>>,
}

impl Feed {
    pub fn push(&self, packet: Packet) {
        self.queue.lock().push_back(packet);
    }
}

impl InputDriver for FeedInput {
    fn init(&self, _id: &str, _options: &Options) -> Result<Box<dyn InputEngine>> {
        Ok(Box::new(FeedEngine { feed: self.feed.clone() }))
    }
}

struct FeedEngine {
    feed: Feed,
}

impl InputEngine for FeedEngine {
    fn run(&mut self, poller: &mut Poller<'_>) -> Result<()> {
        while !poller.must_stop() {
            let next = self.feed.queue.lock().pop_front();
            match next {
                Some(packet) => {
                    let _ = poller.commit(&packet);
                }
                None => std::thread::sleep(Duration::from_millis(2)),
            }
        }
        Ok(())
    }
}

/// An output driver that appends every transmission to a [`Recorder`].
pub struct RecordingOutput {
    recorder: Recorder,
}

impl RecordingOutput {
    pub fn new(recorder: Recorder) -> Self {
        Self { recorder }
    }
}

impl OutputDriver for RecordingOutput {
    fn init(&self, _id: &str, _options: &Options) -> Result<Box<dyn OutputEngine>> {
        Ok(Box::new(RecordingEngine { recorder: self.recorder.clone() }))
    }
}

struct RecordingEngine {
    recorder: Recorder,
}

impl OutputEngine for RecordingEngine {
    fn transmit(&mut self, from: &str, packet: &Packet) -> Result<()> {
        self.recorder.handle(from, packet)
    }
}

/// A layer that forwards every packet unchanged.
pub struct Identity;

impl LayerDriver for Identity {
    fn init(&self, _options: &Options) -> Result<Box<dyn LayerEngine>> {
        Ok(Box::new(IdentityEngine))
    }
}

struct IdentityEngine;

impl LayerEngine for IdentityEngine {
    fn process(&mut self, from: &str, packet: &Packet, accept: &mut Accept<'_>) -> Result<()> {
        accept(from, packet)
    }
}

/// A layer that drops packets whose first serialized byte is zero.
pub struct DropLeadingZero;

impl LayerDriver for DropLeadingZero {
    fn init(&self, _options: &Options) -> Result<Box<dyn LayerEngine>> {
        Ok(Box::new(DropLeadingZeroEngine))
    }
}

struct DropLeadingZeroEngine;

impl LayerEngine for DropLeadingZeroEngine {
    fn process(&mut self, from: &str, packet: &Packet, accept: &mut Accept<'_>) -> Result<()> {
        if packet.serialize().first() == Some(&0) {
            return Ok(());
        }
        accept(from, packet)
    }
}

/// A layer that forwards every packet twice.
pub struct Duplicate;

impl LayerDriver for Duplicate {
    fn init(&self, _options: &Options) -> Result<Box<dyn LayerEngine>> {
        Ok(Box::new(DuplicateEngine))
    }
}

struct DuplicateEngine;

impl LayerEngine for DuplicateEngine {
    fn process(&mut self, from: &str, packet: &Packet, accept: &mut Accept<'_>) -> Result<()> {
        accept(from, packet)?;
        accept(from, packet)
    }
}

/// A driver whose init always fails, for construction-failure paths.
/// Implements all three driver descriptors.
pub struct InitFailure;

impl LayerDriver for InitFailure {
    fn init(&self, _options: &Options) -> Result<Box<dyn LayerEngine>> {
        Err(Error::driver("init failure"))
    }
}

impl InputDriver for InitFailure {
    fn init(&self, _id: &str, _options: &Options) -> Result<Box<dyn InputEngine>> {
        Err(Error::driver("init failure"))
    }
}

impl OutputDriver for InitFailure {
    fn init(&self, _id: &str, _options: &Options) -> Result<Box<dyn OutputEngine>> {
        Err(Error::driver("init failure"))
    }
}
