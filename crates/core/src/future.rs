//! Host/device synchronization handle

use crate::arg::OutputValue;
use crate::backend::{Backend, DeviceEvent};

/// Handle to a submitted task
///
/// Works like a `std::future`-style promise: [`wait`](Self::wait) blocks the
/// host thread until the device is done, [`get`](Self::get) additionally
/// hands out the refreshed outputs. The device buffers of the task stay
/// alive as long as the handle does.
///
/// Dropping an unfinished handle blocks until the device has finished, since
/// pending read-backs still target memory owned by the handle.
pub struct TaskFuture<B: Backend> {
    event: B::Event,
    // Only held so the runtime keeps the allocations valid.
    _buffers: Vec<B::Buffer>,
    outputs: Vec<OutputValue>,
}

impl<B: Backend> TaskFuture<B> {
    pub(crate) fn new(
        event: B::Event,
        buffers: Vec<B::Buffer>,
        outputs: Vec<OutputValue>,
    ) -> Self {
        Self {
            event,
            _buffers: buffers,
            outputs,
        }
    }

    /// Block until the task has finished
    pub fn wait(&self) -> Result<(), B::Error> {
        self.event.wait()
    }

    /// Block until the task has finished, then return its outputs
    ///
    /// Outputs come in argument order and only include `Output` and `InOut`
    /// arguments. Calling this again returns the same values without touching
    /// the device.
    pub fn get(&self) -> Result<&[OutputValue], B::Error> {
        self.wait()?;
        Ok(&self.outputs)
    }

    /// Block until the task has finished and take its outputs
    pub fn into_outputs(mut self) -> Result<Vec<OutputValue>, B::Error> {
        self.wait()?;
        Ok(std::mem::take(&mut self.outputs))
    }

    /// Non-blocking completion check
    pub fn is_complete(&self) -> Result<bool, B::Error> {
        self.event.is_complete()
    }

    /// Number of outputs the task produces
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

impl<B: Backend> Drop for TaskFuture<B> {
    fn drop(&mut self) {
        if let Err(e) = self.event.wait() {
            log::warn!("Failed to wait for task before release: {}", e);
        }
    }
}

// Output bytes may still be the target of a pending read-back, so only
// counts are printed.
impl<B: Backend> std::fmt::Debug for TaskFuture<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskFuture")
            .field("buffers", &self._buffers.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}
