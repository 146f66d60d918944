// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered packet-processing chains.
//!
//! A chain is an ordered stack of layers terminating in a listener. The
//! most recently pushed layer is the entry point; each layer forwards
//! accepted packets toward the bottom of the stack, and the terminal
//! listener receives whatever survives.

use crate::error::{Error, Result};
use crate::options::Options;
use crate::packet::Packet;

/// A packet consumer at the end of a chain: a caller-registered listener
/// on the input side, the device driver on the output side.
///
/// Object-safe for use as `Box<dyn Listener>`.
pub trait Listener: Send {
    fn handle(&self, from: &str, packet: &Packet) -> Result<()>;
}

/// Wrap a closure as a [`Listener`].
pub fn listener_fn<F>(f: F) -> impl Listener
where
    F: Fn(&str, &Packet) -> Result<()> + Send,
{
    FnListener(f)
}

struct FnListener<F>(F);

impl<F> Listener for FnListener<F>
where
    F: Fn(&str, &Packet) -> Result<()> + Send,
{
    fn handle(&self, from: &str, packet: &Packet) -> Result<()> {
        (self.0)(from, packet)
    }
}

/// Forwarding capability handed to [`LayerEngine::process`]. Each call
/// sends a packet onward to the next stage down the stack.
pub type Accept<'a> = dyn FnMut(&str, &Packet) -> Result<()> + 'a;

/// One stage of a chain, produced by a [`LayerDriver`] at push time.
///
/// `process` may call `accept` once to forward (possibly rewriting the
/// packet), several times to duplicate, or not at all to drop. Dropping
/// the engine is the driver's teardown.
pub trait LayerEngine: Send {
    fn process(&mut self, from: &str, packet: &Packet, accept: &mut Accept<'_>) -> Result<()>;
}

/// Factory for chain layers, registered by name in a layer registry.
pub trait LayerDriver: Send + Sync {
    fn init(&self, options: &Options) -> Result<Box<dyn LayerEngine>>;
}

/// An ordered stack of layers terminating in a listener.
pub struct Chain {
    /// Pushed layers, bottom first. The last entry is the entry point.
    layers: Vec<Box<dyn LayerEngine>>,
    listener: Box<dyn Listener>,
}

impl Chain {
    /// A chain with no pushed layers delivers every packet straight to
    /// its listener, unmodified.
    pub fn new(listener: impl Listener + 'static) -> Self {
        Self { layers: Vec::new(), listener: Box::new(listener) }
    }

    /// Initialize a new layer and make it the entry point. On init
    /// failure nothing is pushed.
    pub fn push_layer(&mut self, driver: &dyn LayerDriver, options: &Options) -> Result<()> {
        let engine = driver.init(options)?;
        self.layers.push(engine);
        Ok(())
    }

    /// Pop and tear down the top layer. Fails when only the terminal
    /// layer remains, leaving the chain unchanged.
    pub fn pop_layer(&mut self) -> Result<()> {
        match self.layers.pop() {
            Some(_) => Ok(()),
            None => Err(Error::TerminalLayer),
        }
    }

    /// Number of pushed layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Run a packet through the stack, top to bottom. Returns the status
    /// of the topmost invocation unchanged.
    pub fn transmit(&mut self, from: &str, packet: &Packet) -> Result<()> {
        dispatch(&mut self.layers, self.listener.as_ref(), from, packet)
    }
}

/// Recursive dispatch: the top of `layers` processes the packet and its
/// `accept` forwards to the remainder; an empty slice is the terminal
/// stage, delivering to the listener.
fn dispatch(
    layers: &mut [Box<dyn LayerEngine>],
    listener: &dyn Listener,
    from: &str,
    packet: &Packet,
) -> Result<()> {
    match layers.split_last_mut() {
        Some((top, rest)) => top.process(from, packet, &mut |from: &str, packet: &Packet| {
            dispatch(rest, listener, from, packet)
        }),
        None => listener.handle(from, packet),
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        // Layers tear down top to bottom.
        while self.layers.pop().is_some() {}
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("layers", &self.layers.len()).finish()
    }
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
