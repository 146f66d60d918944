// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output pipelines.
//!
//! An output accepts packets from arbitrary caller threads into a bounded
//! FIFO, and a dedicated worker drains it: each dequeued packet runs
//! through the pre-processing chain, whose terminal stage hands the
//! result to the device driver's transmit.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, warn};

use crate::chain::{Chain, LayerDriver, Listener};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::packet::Packet;
use crate::worker::WorkerHandle;

/// Pending-queue capacity. A full queue rejects new submissions rather
/// than blocking the caller or silently dropping queued packets.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Factory for output engines, registered by name in an output registry.
pub trait OutputDriver: Send + Sync {
    fn init(&self, id: &str, options: &Options) -> Result<Box<dyn OutputEngine>>;
}

/// The transmitting side produced by an [`OutputDriver`]. `transmit`
/// executes on the output's worker thread, one packet at a time, in
/// queue order. Dropping the engine is the driver's teardown.
pub trait OutputEngine: Send {
    fn transmit(&mut self, from: &str, packet: &Packet) -> Result<()>;
}

struct Queued {
    from: String,
    packet: Packet,
}

struct Shared {
    id: String,
    queue: Mutex<VecDeque<Queued>>,
    nonempty: Condvar,
    capacity: usize,
    chain: Mutex<Chain>,
}

/// Terminal stage of the pre-chain: hand the packet to the driver.
struct DriverSink {
    engine: Mutex<Box<dyn OutputEngine>>,
}

impl Listener for DriverSink {
    fn handle(&self, from: &str, packet: &Packet) -> Result<()> {
        self.engine.lock().transmit(from, packet)
    }
}

/// A pipeline that accepts packets from callers, queues them, and hands
/// them to a device driver through a pre-processing chain.
pub struct Output {
    shared: Arc<Shared>,
    worker: Option<WorkerHandle>,
}

impl Output {
    /// Create the output and start its transmit worker. Driver init or
    /// worker spawn failure aborts construction and reclaims everything.
    pub fn new(
        id: impl Into<String>,
        driver: &dyn OutputDriver,
        options: &Options,
    ) -> Result<Self> {
        let id = id.into();
        let engine = driver.init(&id, options)?;
        let chain = Chain::new(DriverSink { engine: Mutex::new(engine) });
        let shared = Arc::new(Shared {
            id,
            queue: Mutex::new(VecDeque::new()),
            nonempty: Condvar::new(),
            capacity: DEFAULT_QUEUE_CAPACITY,
            chain: Mutex::new(chain),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = WorkerHandle::spawn(format!("tactile-output-{}", shared.id), move |token| {
            debug!(output = worker_shared.id.as_str(), "transmit worker started");
            transmit_loop(&worker_shared, &token);
            debug!(output = worker_shared.id.as_str(), "transmit worker exited");
        })?;
        Ok(Self { shared, worker: Some(worker) })
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Queue a packet for transmission. Owns neither argument: the label
    /// is copied and the packet cloned. Returns [`Error::QueueFull`] when
    /// the queue is at capacity.
    pub fn transmit(&self, from: &str, packet: &Packet) -> Result<()> {
        let mut queue = self.shared.queue.lock();
        if queue.len() >= self.shared.capacity {
            warn!(
                output = self.shared.id.as_str(),
                from,
                pending = queue.len(),
                "transmit queue full, rejecting packet"
            );
            return Err(Error::QueueFull(queue.len()));
        }
        debug!(output = self.shared.id.as_str(), from, kind = packet.kind_str(), "queueing packet");
        queue.push_back(Queued { from: from.to_owned(), packet: packet.clone() });
        self.shared.nonempty.notify_one();
        Ok(())
    }

    /// Push a layer onto the pre-processing chain. Permitted while the
    /// worker runs: the worker locks the chain per packet, so a packet
    /// sees the old or the new stack, never a torn one.
    pub fn push_pre_processing_engine(
        &self,
        driver: &dyn LayerDriver,
        options: &Options,
    ) -> Result<()> {
        self.shared.chain.lock().push_layer(driver, options)
    }
}

/// Worker loop: wait for a packet or cancellation, dispatch outside the
/// queue lock, keep servicing the queue across per-packet failures.
fn transmit_loop(shared: &Shared, token: &tokio_util::sync::CancellationToken) {
    loop {
        let next = {
            let mut queue = shared.queue.lock();
            loop {
                if token.is_cancelled() {
                    return;
                }
                match queue.pop_front() {
                    Some(item) => break item,
                    None => shared.nonempty.wait(&mut queue),
                }
            }
        };
        if let Err(e) = shared.chain.lock().transmit(&next.from, &next.packet) {
            warn!(
                output = shared.id.as_str(),
                from = next.from.as_str(),
                "packet transmission failed: {e}"
            );
        }
        // `next` drops here, releasing the copied label and packet.
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            {
                // Cancel and notify under the queue lock: a worker that
                // already checked the token cannot enter the wait until
                // this guard drops, so the wake cannot be lost.
                let _queue = self.shared.queue.lock();
                worker.cancel();
                self.shared.nonempty.notify_all();
            }
            if !worker.stop() {
                error!(output = self.shared.id.as_str(), "transmit worker panicked");
            }
        }
        // Packets still queued drain with the queue itself.
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("id", &self.shared.id)
            .field("pending", &self.shared.queue.lock().len())
            .finish()
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
