// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input pipelines.
//!
//! An input pairs a device driver with a dedicated polling thread. Every
//! packet the driver commits runs synchronously through the input's
//! post-processing chain, whose terminal stage fans the result out to the
//! bound listeners in insertion order.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::chain::{Chain, LayerDriver, Listener};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::packet::Packet;
use crate::worker::WorkerHandle;

/// Factory for input engines, registered by name in an input registry.
pub trait InputDriver: Send + Sync {
    fn init(&self, id: &str, options: &Options) -> Result<Box<dyn InputEngine>>;
}

/// The long-running device poller produced by an [`InputDriver`].
///
/// `run` executes on the input's worker thread. It must consult
/// [`Poller::must_stop`] between packets and return promptly once it
/// yields true — a blocking read interrupted by the wake signal should
/// treat the short result as a cue to re-check. Each produced packet is
/// handed to [`Poller::commit`]. Dropping the engine is the driver's
/// teardown; by then `run` has returned.
pub trait InputEngine: Send {
    fn run(&mut self, poller: &mut Poller<'_>) -> Result<()>;
}

/// Commit and cancellation capabilities handed to [`InputEngine::run`].
pub struct Poller<'a> {
    shared: &'a Shared,
    token: &'a tokio_util::sync::CancellationToken,
}

impl Poller<'_> {
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Forward a just-produced packet through the post-processing chain.
    /// The packet is only borrowed; it is released when this returns.
    pub fn commit(&self, packet: &Packet) -> Result<()> {
        self.shared.chain.lock().transmit(&self.shared.id, packet)
    }

    /// True once polling has been asked to stop.
    pub fn must_stop(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct Shared {
    id: String,
    listeners: Arc<Mutex<Vec<Box<dyn Listener>>>>,
    chain: Mutex<Chain>,
}

/// Terminal stage of the post-chain: deliver to every bound listener,
/// in insertion order, returning the last listener's status.
struct FanOut {
    id: String,
    listeners: Arc<Mutex<Vec<Box<dyn Listener>>>>,
}

impl Listener for FanOut {
    fn handle(&self, from: &str, packet: &Packet) -> Result<()> {
        let listeners = self.listeners.lock();
        let mut status = Ok(());
        for listener in listeners.iter() {
            debug!(
                input = self.id.as_str(),
                from,
                kind = packet.kind_str(),
                "delivering packet to listener"
            );
            status = listener.handle(from, packet);
        }
        status
    }
}

/// A pipeline that ingests packets from a device driver and fans them out
/// to listeners through a post-processing chain.
pub struct Input {
    shared: Arc<Shared>,
    engine: Arc<Mutex<Box<dyn InputEngine>>>,
    worker: Option<WorkerHandle>,
}

impl Input {
    /// Create the input and immediately start polling. Driver init or
    /// worker spawn failure aborts construction and reclaims everything.
    pub fn new(id: impl Into<String>, driver: &dyn InputDriver, options: &Options) -> Result<Self> {
        let id = id.into();
        let engine = driver.init(&id, options)?;
        let listeners: Arc<Mutex<Vec<Box<dyn Listener>>>> = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new(FanOut { id: id.clone(), listeners: Arc::clone(&listeners) });
        let shared = Arc::new(Shared { id, listeners, chain: Mutex::new(chain) });
        let mut input = Self {
            shared,
            engine: Arc::new(Mutex::new(engine)),
            worker: None,
        };
        input.polling_start()?;
        Ok(input)
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn is_polling(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawn the polling worker. Fails if already polling; on spawn
    /// failure the input stays stopped.
    pub fn polling_start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(Error::AlreadyPolling);
        }
        let shared = Arc::clone(&self.shared);
        let engine = Arc::clone(&self.engine);
        let name = format!("tactile-input-{}", self.shared.id);
        let worker = WorkerHandle::spawn(name, move |token| {
            debug!(input = shared.id.as_str(), "polling worker started");
            let mut poller = Poller { shared: shared.as_ref(), token: &token };
            if let Err(e) = engine.lock().run(&mut poller) {
                warn!(input = shared.id.as_str(), "input driver run failed: {e}");
            }
            debug!(input = shared.id.as_str(), "polling worker exited");
        })?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Stop the polling worker: cancel, wake, join. Fails if already
    /// stopped.
    pub fn polling_stop(&mut self) -> Result<()> {
        let worker = self.worker.take().ok_or(Error::NotPolling)?;
        if !worker.stop() {
            error!(input = self.shared.id.as_str(), "polling worker panicked");
        }
        Ok(())
    }

    /// Push a layer onto the post-processing chain. Rejected while
    /// polling.
    pub fn push_post_processing_engine(
        &mut self,
        driver: &dyn LayerDriver,
        options: &Options,
    ) -> Result<()> {
        if self.worker.is_some() {
            debug!(
                input = self.shared.id.as_str(),
                "cannot push a post-processing engine while polling"
            );
            return Err(Error::ChainBusy);
        }
        self.shared.chain.lock().push_layer(driver, options)
    }

    /// Add a listener. Listeners are invoked in bind order; a blocking
    /// listener stalls the polling thread.
    pub fn bind(&self, listener: impl Listener + 'static) {
        self.shared.listeners.lock().push(Box::new(listener));
    }
}

impl Drop for Input {
    fn drop(&mut self) {
        // The chain is synchronous, so once the worker is joined no
        // packet is in flight and the engine can tear down.
        let _ = self.polling_stop();
    }
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input")
            .field("id", &self.shared.id)
            .field("polling", &self.worker.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
