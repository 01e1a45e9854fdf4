//! Scripted input multiplexer for tests.
//!
//! Each call to `wait_ready` makes the next queued batch "ready"; when the
//! queue is empty the wait times out immediately.  No real time passes, so
//! session tests run instantly regardless of the configured poll intervals.
//!
//! # Usage in tests
//!
//! ```ignore
//! let mut input = ScriptedInput::new();
//! input.push_batch(vec![RawInputEvent::key_down(30)]);
//!
//! assert_eq!(input.wait_ready(Duration::from_secs(1)).unwrap(), 1);
//! assert_eq!(input.read_ready().len(), 1);
//! ```

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use bthid_core::RawInputEvent;

use crate::application::session::{InputError, InputMultiplexer};

/// In-memory stand-in for [`super::SourceSet`].
#[derive(Debug, Default)]
pub struct ScriptedInput {
    batches: VecDeque<Vec<RawInputEvent>>,
    ready: Vec<RawInputEvent>,
    /// Every timeout passed to `wait_ready`, in call order.
    pub waits: Vec<Duration>,
    /// When `true`, the next `wait_ready` fails once.
    pub fail_next_wait: bool,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues events that become ready together on one future wait.
    pub fn push_batch(&mut self, events: Vec<RawInputEvent>) {
        self.batches.push_back(events);
    }

    /// Number of batches not yet consumed.
    pub fn pending_batches(&self) -> usize {
        self.batches.len()
    }
}

impl InputMultiplexer for ScriptedInput {
    fn wait_ready(&mut self, timeout: Duration) -> Result<usize, InputError> {
        self.waits.push(timeout);
        if std::mem::take(&mut self.fail_next_wait) {
            return Err(InputError::Wait(io::Error::other("scripted wait failure")));
        }
        match self.batches.pop_front() {
            Some(batch) if !batch.is_empty() => {
                let n = batch.len();
                self.ready = batch;
                Ok(n)
            }
            _ => Ok(0),
        }
    }

    fn read_ready(&mut self) -> Vec<RawInputEvent> {
        std::mem::take(&mut self.ready)
    }
}
