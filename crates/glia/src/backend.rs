//! The seam between the context registry and the GL side of the system.
//!
//! The engine that actually owns GL state -- command queues, cross-thread
//! dispatch, GPU resources -- lives outside this crate. [`GlBackend`] is its
//! boundary: the registry forwards lifecycle events through the trait and
//! assumes nothing about what happens behind it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{ContextId, ScriptContextRef};

/// Receiver for context lifecycle events forwarded by the registry.
///
/// Implementations own the GL side of a context: whatever state they
/// associate with an identifier on `create_context` must be released on
/// `destroy_context`. `flush` asks for work queued against that context to
/// be executed.
///
/// Implementations must not call back into the bridge from inside a
/// callback; the bridge holds its lock across the forwarded call.
pub trait GlBackend: fmt::Debug + Send {
    /// Called when a context is being registered under `id`.
    ///
    /// `script_ctx` is exactly the pointer the embedder supplied; the
    /// backend may retain it for the lifetime of the context.
    ///
    /// # Errors
    ///
    /// On error the registry discards the identifier and reports the message
    /// to the caller; the backend must leave no state behind.
    fn create_context(&mut self, id: ContextId, script_ctx: ScriptContextRef) -> Result<(), String>;

    /// Called when `id` has been removed from the registry.
    fn destroy_context(&mut self, id: ContextId);

    /// Called to execute work queued for `id`.
    fn flush(&mut self, id: ContextId);
}

/// A backend that discards every event.
///
/// Stands in until a real backend is installed, and serves tests that only
/// exercise registry bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

impl GlBackend for NoopBackend {
    fn create_context(&mut self, _id: ContextId, _script_ctx: ScriptContextRef) -> Result<(), String> {
        Ok(())
    }

    fn destroy_context(&mut self, _id: ContextId) {}

    fn flush(&mut self, _id: ContextId) {}
}

/// One event observed by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `create_context(id, script_ctx)`, with the handle's bit pattern.
    Create(ContextId, i64),
    /// `destroy_context(id)`.
    Destroy(ContextId),
    /// `flush(id)`.
    Flush(ContextId),
}

/// A backend that records every forwarded call.
///
/// Clones share one log, so an embedder or test can keep a handle for
/// inspection while the registry owns the installed copy.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    /// Shared, ordered log of observed calls.
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl RecordingBackend {
    /// Creates a backend with an empty call log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the calls recorded so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().clone()
    }

    /// Clears the call log.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BackendCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GlBackend for RecordingBackend {
    fn create_context(&mut self, id: ContextId, script_ctx: ScriptContextRef) -> Result<(), String> {
        self.lock().push(BackendCall::Create(id, script_ctx.to_bits()));
        Ok(())
    }

    fn destroy_context(&mut self, id: ContextId) {
        self.lock().push(BackendCall::Destroy(id));
    }

    fn flush(&mut self, id: ContextId) {
        self.lock().push(BackendCall::Flush(id));
    }
}
