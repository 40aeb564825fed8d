//! Parameter worker
//!
//! A single thread owns the [`RadioBox`] and the base parameter table and
//! applies update tables in arrival order. After every update the merged
//! table is published for readers that only want to look at it.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use embedded_hal::delay::DelayNs;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::hal::bus::RegisterBus;
use crate::params::{get_fpga_params, update_all_params, ParamTable};
use crate::radiobox::RadioBox;

/// Thread name of the worker
const WORKER_NAME: &str = "radiobox-worker";

enum Command {
    Update(ParamTable),
    Sync(Sender<()>),
    Shutdown,
}

/// Handle of the worker thread
pub struct Worker<B, D> {
    commands: Sender<Command>,
    snapshot: Arc<Mutex<ParamTable>>,
    handle: Option<JoinHandle<RadioBox<B, D>>>,
}

impl<B, D> Worker<B, D>
where
    B: RegisterBus + Send + 'static,
    D: DelayNs + Send + 'static,
{
    /// Start the worker with `base` as the complete parameter table
    ///
    /// # Errors
    /// [`Error::Spawn`] if the thread cannot be created.
    pub fn spawn(radiobox: RadioBox<B, D>, base: ParamTable) -> Result<Self> {
        let (commands, inbox) = mpsc::channel();
        let snapshot = Arc::new(Mutex::new(base.clone()));
        let published = Arc::clone(&snapshot);

        let handle = thread::Builder::new()
            .name(WORKER_NAME.into())
            .spawn(move || run(radiobox, base, &inbox, &published))
            .map_err(|source| Error::Spawn {
                command: WORKER_NAME.into(),
                source,
            })?;

        Ok(Self {
            commands,
            snapshot,
            handle: Some(handle),
        })
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::WorkerGone)
    }

    /// Queue an update table
    ///
    /// # Errors
    /// [`Error::WorkerGone`] if the worker has stopped.
    pub fn update(&self, new: ParamTable) -> Result<()> {
        self.send(Command::Update(new))
    }

    /// Wait until every queued update has been applied
    ///
    /// # Errors
    /// [`Error::WorkerGone`] if the worker has stopped.
    pub fn sync(&self) -> Result<()> {
        let (done, wait) = mpsc::channel();
        self.send(Command::Sync(done))?;
        wait.recv().map_err(|_| Error::WorkerGone)
    }

    /// Copy of the base table as of the last applied update
    #[must_use]
    pub fn snapshot(&self) -> ParamTable {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Stop the worker, disabling the RadioBox, and hand it back
    ///
    /// # Errors
    /// [`Error::WorkerGone`] if the worker thread panicked.
    pub fn shutdown(mut self) -> Result<RadioBox<B, D>> {
        // the worker may already be gone, the join reports it
        let _ = self.send(Command::Shutdown);
        let handle = self.handle.take().ok_or(Error::WorkerGone)?;
        handle.join().map_err(|_| Error::WorkerGone)
    }
}

impl<B, D> Drop for Worker<B, D> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.commands.send(Command::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run<B, D>(
    mut rb: RadioBox<B, D>,
    mut base: ParamTable,
    inbox: &Receiver<Command>,
    published: &Mutex<ParamTable>,
) -> RadioBox<B, D>
where
    B: RegisterBus,
    D: DelayNs,
{
    debug!("worker started");
    while let Ok(command) = inbox.recv() {
        match command {
            Command::Update(mut new) => {
                update_all_params(&mut rb, &base, &mut new);
                let merged = get_fpga_params(&mut rb, &base, &mut new).and_then(|_| base.merge(&new));
                if let Err(e) = merged {
                    error!("parameter update failed: {e}");
                }
                *published.lock().unwrap_or_else(PoisonError::into_inner) = base.clone();
            }
            Command::Sync(done) => {
                let _ = done.send(());
            }
            Command::Shutdown => break,
        }
    }
    debug!("worker stopping");
    rb.enable(false);
    rb
}
