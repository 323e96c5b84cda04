//! The calling task's view of the runtime
//!
//! Every task entry and periodic body receives a [`TaskContext`] naming
//! the task it runs as. Operations performed through the context are
//! task-scoped: a failure is returned to the caller and also recorded in
//! that task's own error cell, and in no other.

use crate::Runtime;
use core_types::{ResourceHandle, ResourceKind, StatusCode, TaskHandle};
use kernel_api::{
    Duration, HandlerAction, PeriodicDescriptor, RtError, RtResult, TaskDescriptor,
};

#[derive(Debug, Clone)]
pub struct TaskContext {
    runtime: Runtime,
    task: TaskHandle,
}

impl TaskContext {
    pub(crate) fn new(runtime: Runtime, task: TaskHandle) -> Self {
        Self { runtime, task }
    }

    /// Handle of the task this context runs as
    pub fn handle(&self) -> TaskHandle {
        self.task
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Whether the task still holds its registry slot
    pub fn is_alive(&self) -> bool {
        self.runtime.get_error(self.task).is_ok()
    }

    pub fn name(&self) -> RtResult<String> {
        self.record(self.runtime.task_info(self.task).map(|info| info.name))
    }

    /// Most recent failure of an operation performed by this task
    pub fn last_error(&self) -> RtResult<StatusCode> {
        self.runtime.get_error(self.task)
    }

    pub fn clear_error(&self) -> RtResult<()> {
        self.runtime.error_cells().clear(self.task)
    }

    /// Records an application-level failure code for this task
    pub fn report_error(&self, code: StatusCode) -> RtResult<()> {
        self.runtime.error_cells().set(self.task, code)
    }

    /// Ends the calling task
    ///
    /// Frees the task's slot and error cell and, for a periodic task,
    /// its schedule. The entry should return right after; operations on
    /// this context report `InvalidHandle` from now on.
    pub fn exit(&self) -> RtResult<()> {
        self.runtime.delete_task(self.task)
    }

    /// Suspends the calling task for at least `duration`
    pub fn sleep(&self, duration: Duration) -> RtResult<()> {
        if !self.is_alive() {
            return Err(RtError::InvalidHandle(self.task.resource()));
        }
        self.runtime.backend().sleep(duration.into());
        Ok(())
    }

    pub fn create_task<F>(&self, descriptor: TaskDescriptor, entry: F) -> RtResult<TaskHandle>
    where
        F: FnOnce(&TaskContext) + Send + 'static,
    {
        self.record(self.runtime.create_task(descriptor, entry))
    }

    pub fn create_periodic_task<B, H>(
        &self,
        descriptor: PeriodicDescriptor,
        body: B,
        on_error: H,
    ) -> RtResult<TaskHandle>
    where
        B: FnMut(&TaskContext) -> Result<(), StatusCode> + Send + 'static,
        H: FnMut(TaskHandle, StatusCode) -> HandlerAction + Send + 'static,
    {
        self.record(self.runtime.create_periodic_task(descriptor, body, on_error))
    }

    pub fn delete_task(&self, task: TaskHandle) -> RtResult<()> {
        self.record(self.runtime.delete_task(task))
    }

    pub fn create_object(&self, kind: ResourceKind, name: impl Into<String>) -> RtResult<ResourceHandle> {
        self.record(self.runtime.create_object(kind, name))
    }

    pub fn delete_object(&self, handle: ResourceHandle) -> RtResult<()> {
        self.record(self.runtime.delete_object(handle))
    }

    pub fn object_name(&self, handle: ResourceHandle) -> RtResult<String> {
        self.record(self.runtime.object_name(handle))
    }

    pub fn checksum(&self, data: &[u8]) -> RtResult<u32> {
        self.record(self.runtime.checksum(data))
    }

    fn record<T>(&self, result: RtResult<T>) -> RtResult<T> {
        if let Err(err) = &result {
            // the task may have exited; its cell is gone then
            let _ = self.runtime.error_cells().set(self.task, err.status());
        }
        result
    }
}
