/// Deferred task queue.
///
/// Operations that mutate shared simulation state (connection changes,
/// kernel installation, device destruction) are not applied when they are
/// requested. They are appended to this FIFO queue and drained one at a
/// time during `Simulation::tick`, so every mutation lands at a well
/// defined simulation step. Each submission returns a [`TaskHandle`] that
/// resolves once the task has run.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::{SimError, SimResult};

// ── Task ID ───────────────────────────────────────────────────────────

/// A strictly increasing task identifier, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T#{}", self.0)
    }
}

// ── Task state & handle ───────────────────────────────────────────────

/// Where a submitted task is in its life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Queued, not yet run.
    Pending,
    /// Ran to completion.
    Completed,
    /// Ran and failed.
    Failed(SimError),
}

/// Promise-like handle to a deferred task's outcome.
///
/// Handles stay [`TaskState::Pending`] until the task runs. If the
/// simulation is closed first, the task never runs and the handle never
/// resolves.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    state: Rc<RefCell<TaskState>>,
}

impl TaskHandle {
    /// A handle that is already failed, for operations rejected up front.
    pub(crate) fn failed(id: TaskId, error: SimError) -> Self {
        TaskHandle {
            id,
            state: Rc::new(RefCell::new(TaskState::Failed(error))),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> TaskState {
        self.state.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.state.borrow(), TaskState::Pending)
    }

    /// `None` while pending, otherwise the task's result.
    pub fn result(&self) -> Option<SimResult<()>> {
        match &*self.state.borrow() {
            TaskState::Pending => None,
            TaskState::Completed => Some(Ok(())),
            TaskState::Failed(e) => Some(Err(e.clone())),
        }
    }

    /// The error the task failed with, if it failed.
    pub fn error(&self) -> Option<SimError> {
        match &*self.state.borrow() {
            TaskState::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }
}

// ── Queued task ───────────────────────────────────────────────────────

/// A unit of deferred work run against a context of type `C`.
pub type Task<C> = Box<dyn FnOnce(&mut C) -> SimResult<()>>;

/// A task waiting in the queue together with its result cell.
pub struct QueuedTask<C> {
    id: TaskId,
    label: &'static str,
    task: Task<C>,
    state: Rc<RefCell<TaskState>>,
}

impl<C> QueuedTask<C> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Short description of what the task does, for logs.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Run the task and resolve its handle.
    pub fn run(self, ctx: &mut C) -> SimResult<()> {
        let result = (self.task)(ctx);
        *self.state.borrow_mut() = match &result {
            Ok(()) => TaskState::Completed,
            Err(e) => TaskState::Failed(e.clone()),
        };
        result
    }
}

impl<C> std::fmt::Debug for QueuedTask<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedTask")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

// ── TaskQueue ─────────────────────────────────────────────────────────

/// FIFO queue of deferred tasks.
///
/// Owns the queue and the ID generator. IDs are strictly increasing, so
/// submission order and execution order always agree.
pub struct TaskQueue<C> {
    queue: VecDeque<QueuedTask<C>>,
    next_id: u64,
}

impl<C> TaskQueue<C> {
    pub fn new() -> Self {
        TaskQueue {
            queue: VecDeque::new(),
            next_id: 0,
        }
    }

    fn mint_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a task and return its handle.
    pub fn submit<F>(&mut self, label: &'static str, task: F) -> TaskHandle
    where
        F: FnOnce(&mut C) -> SimResult<()> + 'static,
    {
        let id = self.mint_id();
        let state = Rc::new(RefCell::new(TaskState::Pending));
        self.queue.push_back(QueuedTask {
            id,
            label,
            task: Box::new(task),
            state: Rc::clone(&state),
        });
        TaskHandle { id, state }
    }

    /// Mint a handle that is already failed, without queueing anything.
    pub fn reject(&mut self, error: SimError) -> TaskHandle {
        let id = self.mint_id();
        TaskHandle::failed(id, error)
    }

    /// Pop the oldest task.
    pub fn pop_next(&mut self) -> Option<QueuedTask<C>> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every queued task without running it. Their handles stay pending.
    pub fn discard_all(&mut self) -> usize {
        let n = self.queue.len();
        self.queue.clear();
        n
    }
}

impl<C> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for TaskQueue<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.queue.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
