//! Background removal of dead records.
//!
//! Every store in this crate expires records lazily, so correctness never
//! depends on the reaper. It only bounds memory by periodically running a
//! sweep closure, typically one that calls `purge_expired` on each store.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Name of the reaper thread.
pub const REAPER_THREAD_NAME: &str = "warden-reaper";

/// A background thread that periodically runs a sweep.
///
/// The thread stops when [`Reaper::stop`] is called or the reaper is dropped.
pub struct Reaper {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl Reaper {
    /// Start a reaper.
    ///
    /// # Arguments
    ///
    /// * `interval` - Time between sweeps.
    /// * `sweep` - Called once per interval; returns how many records it removed.
    ///
    /// # Returns
    ///
    /// * `Ok(Reaper)` - The running reaper.
    /// * `Err(io::Error)` - If the thread could not be spawned.
    pub fn spawn<F>(interval: Duration, sweep: F) -> io::Result<Self>
    where
        F: Fn() -> usize + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name(REAPER_THREAD_NAME.to_string())
            .spawn(move || loop {
                match shutdown_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let removed = sweep();
                        if removed > 0 {
                            debug!(removed, "Reaper sweep removed dead records");
                        }
                    }
                    // Explicit stop or the handle was dropped
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        info!(?interval, "Reaper started");
        Ok(Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
            interval,
        })
    }

    /// Get the sweep interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop the reaper and wait for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // A full channel or a gone receiver both mean the thread is exiting
            let _ = shutdown.try_send(());
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Reaper thread panicked");
            } else {
                debug!("Reaper stopped");
            }
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

impl std::fmt::Debug for Reaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaper")
            .field("interval", &self.interval)
            .field("running", &self.handle.is_some())
            .finish()
    }
}
