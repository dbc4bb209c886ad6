//! Shutdown signal fired from the test thread.

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::process::{ShutdownError, ShutdownSignal};

/// Shutdown signal that fires when the paired sender sends or is dropped.
pub struct ChannelShutdownSignal {
    receiver: Mutex<Receiver<()>>,
}

impl ChannelShutdownSignal {
    #[must_use]
    pub fn new() -> (Sender<()>, Self) {
        let (sender, receiver) = mpsc::channel();
        (
            sender,
            Self {
                receiver: Mutex::new(receiver),
            },
        )
    }
}

impl ShutdownSignal for ChannelShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let _ = self
            .receiver
            .lock()
            .expect("shutdown receiver mutex poisoned")
            .recv();
        Ok(())
    }
}
