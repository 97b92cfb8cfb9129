//! # Task System Core Trait
//!
//! A `Task` is a unit of work that runs once on one of the `TaskManager`'s
//! worker threads. Tasks own everything they need (shared state comes in as
//! `Arc`s) and report their outcome themselves, for example by writing into
//! the chunk cache or answering a `LoadTicket`. The manager only runs them.

/// A unit of work executed on a worker thread.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should handle its own errors; a panic is caught and logged by the worker
///   but the task's outcome is lost
pub trait Task: Send {
    fn process(self: Box<Self>);
}

/// Plain closures are tasks too, which keeps the pool usable in tests without
/// defining a type per scenario.
impl<F> Task for F
where
    F: FnOnce() + Send,
{
    fn process(self: Box<Self>) {
        (*self)()
    }
}
