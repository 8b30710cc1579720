//! Owned handle of the modal auto-close task.

use tokio::task::JoinHandle;

/// Spawned countdown task; aborted when cancelled or dropped.
#[derive(Debug)]
pub struct CountdownTask {
    handle: Option<JoinHandle<()>>,
}

impl CountdownTask {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Aborts the task. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Releases the handle without aborting; used by the task itself once
    /// it is past its last await point.
    pub fn detach(mut self) {
        self.handle.take();
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for CountdownTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
