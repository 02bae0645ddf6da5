use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::encoder::Command;
use crate::error::TransportError;

/// What happened to a command at the moment it was handed over. Says nothing
/// about whether the actuator ever moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Queued for delivery.
    Dispatched,
    /// No link; the command was dropped and the trial proceeds without a
    /// physical stimulus.
    NotConnected,
}

/// Non-blocking, unacknowledged command channel to the actuator.
pub trait Transport {
    fn is_connected(&self) -> bool;

    /// Must return without waiting for delivery.
    fn send(&mut self, command: &Command) -> Result<SendOutcome, TransportError>;

    /// Lets queued commands drain before the program exits.
    fn close(&mut self) {}
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn send(&mut self, command: &Command) -> Result<SendOutcome, TransportError> {
        (**self).send(command)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// The "no device" transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn is_connected(&self) -> bool {
        false
    }

    fn send(&mut self, _command: &Command) -> Result<SendOutcome, TransportError> {
        Ok(SendOutcome::NotConnected)
    }
}

/// A blocking writer for one physical link.
pub trait CommandSink {
    fn describe(&self) -> String;
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// Runs a [`CommandSink`] on its own thread. `send` only enqueues; the worker
/// performs the write and reports the outcome to the log and nowhere else.
pub struct DetachedTransport {
    tx: Option<Sender<Command>>,
    connected: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    name: String,
}

impl DetachedTransport {
    pub fn spawn<S: CommandSink + Send + 'static>(mut sink: S) -> Self {
        let (tx, rx) = mpsc::channel::<Command>();
        let connected = Arc::new(AtomicBool::new(true));
        let th_connected = Arc::clone(&connected);
        let name = sink.describe();
        let th_name = name.clone();

        let handle = thread::spawn(move || {
            while let Ok(command) = rx.recv() {
                match sink.write(command.as_bytes()) {
                    Ok(()) => debug!("{th_name} : wrote \"{command}\""),
                    Err(TransportError::Disconnected) => {
                        warn!("{th_name} : link lost while writing \"{command}\"");
                        th_connected.store(false, Ordering::SeqCst);
                    }
                    Err(error) => warn!("{th_name} : write of \"{command}\" failed: {error}"),
                }
            }
            info!("{th_name} : terminated.");
        });

        Self {
            tx: Some(tx),
            connected,
            handle: Some(handle),
            name,
        }
    }

    /// Stops accepting commands and waits for the queued ones to be written.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("{} : worker panicked", self.name);
            }
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Transport for DetachedTransport {
    fn is_connected(&self) -> bool {
        self.tx.is_some() && self.connected.load(Ordering::SeqCst)
    }

    fn send(&mut self, command: &Command) -> Result<SendOutcome, TransportError> {
        if !self.is_connected() {
            return Ok(SendOutcome::NotConnected);
        }
        match &self.tx {
            Some(tx) => tx
                .send(command.clone())
                .map(|_| SendOutcome::Dispatched)
                .map_err(|_| TransportError::WorkerGone),
            None => Ok(SendOutcome::NotConnected),
        }
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

impl Drop for DetachedTransport {
    // Detach rather than join: pending results are dropped with the worker.
    fn drop(&mut self) {
        self.tx.take();
    }
}
