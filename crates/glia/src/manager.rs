//! Identifier-keyed registry of live GL contexts.
//!
//! `ContextManager` owns the mapping from small integer identifiers to
//! script-engine context handles and forwards lifecycle events to the
//! installed [`GlBackend`]. Identifiers are allocated monotonically and
//! never reused, which makes identifier validity checkable: the manager can
//! tell a destroyed identifier apart from one that never existed, instead of
//! trusting the caller.
//!
//! This module is the pure-logic core that the C surface (in `glia-capi`)
//! delegates to. It contains no foreign-boundary concerns and no global
//! state; embedders that want their own threading discipline can own a
//! manager directly.

use std::collections::HashMap;
use std::fmt;

use crate::{GlBackend, ScriptContextRef};

/// First identifier handed out by a fresh manager.
///
/// 0 is reserved as the "no context" sentinel at the foreign boundary and is
/// never allocated.
const FIRST_CONTEXT_ID: i32 = 1;

// =============================================================================
// Error types
// =============================================================================

/// Errors that can occur during context registry operations.
///
/// Separates identifier failures (never allocated vs. allocated and since
/// destroyed) from capacity failures and backend failures, so callers can
/// pattern-match on the category without string parsing.
#[derive(Debug, Clone)]
pub enum ContextError {
    /// The identifier was never allocated by this manager.
    NotFound(ContextId),
    /// The identifier was valid once, but its context has been destroyed.
    UseAfterDestroy(ContextId),
    /// Creating another context would exceed the configured limit.
    TooManyContexts {
        /// The configured maximum number of live contexts.
        limit: usize,
        /// Contexts live at the time of the attempt.
        live: usize,
    },
    /// The 32-bit identifier space is used up; identifiers are never reused.
    IdSpaceExhausted,
    /// The render backend rejected the operation.
    Backend(String),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "context {id} not found"),
            Self::UseAfterDestroy(id) => write!(f, "context {id} was already destroyed"),
            Self::TooManyContexts { limit, live } => {
                write!(f, "context limit exceeded: {live} live >= {limit}")
            }
            Self::IdSpaceExhausted => write!(f, "context identifier space exhausted"),
            Self::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for ContextError {}

// =============================================================================
// Identifier and output types
// =============================================================================

/// Identifier naming a live context within the manager.
///
/// Allocated on create, starting at 1 and counting up; never reused. At the
/// foreign boundary the raw value travels as a plain 32-bit integer, with 0
/// meaning "no context".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(i32);

impl ContextId {
    /// Wraps a raw identifier received from the foreign boundary.
    ///
    /// Any value is accepted; lookups decide validity.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier for the foreign boundary.
    #[must_use]
    pub const fn to_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary info for one live context, as returned by
/// [`ContextManager::contexts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    /// The context identifier.
    pub id: ContextId,
    /// Bit pattern of the script-context handle the context was created with.
    pub script_ctx: i64,
    /// Number of flushes performed on this context.
    pub flush_count: u64,
}

/// Aggregate counters over a manager's whole lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Contexts currently live.
    pub live_contexts: usize,
    /// Contexts ever created.
    pub total_created: u64,
    /// Contexts destroyed.
    pub total_destroyed: u64,
    /// Flushes performed across all contexts.
    pub total_flushes: u64,
}

/// Configuration for registry limits.
///
/// All limits are optional -- `BridgeLimits::default()` enforces nothing.
#[derive(Debug, Clone, Default)]
pub struct BridgeLimits {
    /// Maximum number of simultaneously live contexts.
    pub max_contexts: Option<usize>,
}

impl BridgeLimits {
    /// Creates limits with nothing enforced.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of simultaneously live contexts.
    #[must_use]
    pub fn max_contexts(mut self, limit: usize) -> Self {
        self.max_contexts = Some(limit);
        self
    }
}

// =============================================================================
// Context entry (private)
// =============================================================================

/// One entry in the context registry.
#[derive(Debug)]
struct ContextEntry {
    /// Handle to the scripting engine's global context.
    script_ctx: ScriptContextRef,
    /// Number of flushes performed on this context.
    flush_count: u64,
}

// =============================================================================
// ContextManager
// =============================================================================

/// Identifier-keyed registry of live GL contexts.
///
/// Allocates identifiers on create, validates them on destroy/flush, and
/// forwards every accepted lifecycle event to the installed [`GlBackend`].
///
/// # Example
///
/// ```
/// use glia::{ContextManager, RecordingBackend, ScriptContextRef};
///
/// let backend = RecordingBackend::new();
/// let mut manager = ContextManager::new(Box::new(backend.clone()));
///
/// let script_ctx = Box::into_raw(Box::new(0_u8));
/// // SAFETY: `script_ctx` is a live allocation standing in for the
/// // scripting engine's global context.
/// let handle = unsafe { ScriptContextRef::from_bits(script_ctx as i64) }.unwrap();
///
/// let id = manager.create(handle)?;
/// manager.flush(id)?;
/// manager.destroy(id)?;
/// assert_eq!(backend.calls().len(), 3);
///
/// // SAFETY: reclaims the stand-in allocation.
/// unsafe { drop(Box::from_raw(script_ctx)) };
/// # Ok::<(), glia::ContextError>(())
/// ```
#[derive(Debug)]
pub struct ContextManager {
    /// Live contexts keyed by identifier.
    contexts: HashMap<ContextId, ContextEntry>,
    /// Next identifier to hand out.
    next_id: i32,
    /// Registry limits applied on create.
    limits: BridgeLimits,
    /// Receiver for forwarded lifecycle events.
    backend: Box<dyn GlBackend>,
    /// Contexts ever created.
    total_created: u64,
    /// Contexts destroyed.
    total_destroyed: u64,
    /// Flushes performed across all contexts.
    total_flushes: u64,
}

// =============================================================================
// Constructor and configuration
// =============================================================================

impl ContextManager {
    /// Creates a manager with no registry limits.
    #[must_use]
    pub fn new(backend: Box<dyn GlBackend>) -> Self {
        Self::with_limits(backend, BridgeLimits::default())
    }

    /// Creates a manager with explicit registry limits.
    #[must_use]
    pub fn with_limits(backend: Box<dyn GlBackend>, limits: BridgeLimits) -> Self {
        Self {
            contexts: HashMap::new(),
            next_id: FIRST_CONTEXT_ID,
            limits,
            backend,
            total_created: 0,
            total_destroyed: 0,
            total_flushes: 0,
        }
    }

    /// Replaces the render backend.
    ///
    /// Intended for embedder startup, before any context exists. Contexts
    /// created through a previous backend keep their identifiers, but the
    /// old backend receives no further events for them.
    pub fn set_backend(&mut self, backend: Box<dyn GlBackend>) {
        self.backend = backend;
    }
}

// =============================================================================
// Context lifecycle
// =============================================================================

impl ContextManager {
    /// Registers a new context for the given script-engine context handle.
    ///
    /// Allocates the next identifier, asks the backend to set up the GL
    /// side, and records the entry. The backend receives exactly the pointer
    /// the caller supplied.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::TooManyContexts` when the configured limit is
    /// reached, `ContextError::IdSpaceExhausted` when identifiers run out,
    /// or `ContextError::Backend` when the backend fails. The registry is
    /// unchanged in every failure case; a failed create does not consume an
    /// identifier.
    pub fn create(&mut self, script_ctx: ScriptContextRef) -> Result<ContextId, ContextError> {
        if let Some(limit) = self.limits.max_contexts
            && self.contexts.len() >= limit
        {
            return Err(ContextError::TooManyContexts {
                limit,
                live: self.contexts.len(),
            });
        }
        if self.next_id == i32::MAX {
            return Err(ContextError::IdSpaceExhausted);
        }

        let id = ContextId::from_raw(self.next_id);
        self.backend
            .create_context(id, script_ctx)
            .map_err(ContextError::Backend)?;
        self.next_id += 1;
        self.contexts.insert(
            id,
            ContextEntry {
                script_ctx,
                flush_count: 0,
            },
        );
        self.total_created += 1;
        log::debug!("created context {id} for script context {:#x}", script_ctx.to_bits());
        Ok(id)
    }

    /// Destroys a context, invalidating its identifier permanently.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::UseAfterDestroy` for identifiers that were
    /// live once, `ContextError::NotFound` for identifiers never allocated.
    /// No backend call is made in either failure case.
    pub fn destroy(&mut self, id: ContextId) -> Result<(), ContextError> {
        if self.contexts.remove(&id).is_none() {
            return Err(self.unknown_id(id));
        }
        self.backend.destroy_context(id);
        self.total_destroyed += 1;
        log::debug!("destroyed context {id}");
        Ok(())
    }

    /// Executes work queued for a context.
    ///
    /// # Errors
    ///
    /// Same identifier taxonomy as [`destroy`](Self::destroy).
    pub fn flush(&mut self, id: ContextId) -> Result<(), ContextError> {
        if let Some(entry) = self.contexts.get_mut(&id) {
            entry.flush_count += 1;
        } else {
            return Err(self.unknown_id(id));
        }
        self.total_flushes += 1;
        self.backend.flush(id);
        Ok(())
    }
}

// =============================================================================
// Introspection
// =============================================================================

impl ContextManager {
    /// Lists all live contexts, sorted by identifier for deterministic
    /// output.
    #[must_use]
    pub fn contexts(&self) -> Vec<ContextInfo> {
        let mut infos: Vec<ContextInfo> = self
            .contexts
            .iter()
            .map(|(id, entry)| ContextInfo {
                id: *id,
                script_ctx: entry.script_ctx.to_bits(),
                flush_count: entry.flush_count,
            })
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Returns `true` if `id` names a live context.
    #[must_use]
    pub fn is_live(&self, id: ContextId) -> bool {
        self.contexts.contains_key(&id)
    }

    /// Returns aggregate counters over this manager's lifetime.
    #[must_use]
    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            live_contexts: self.contexts.len(),
            total_created: self.total_created,
            total_destroyed: self.total_destroyed,
            total_flushes: self.total_flushes,
        }
    }
}

// =============================================================================
// Private helpers
// =============================================================================

impl ContextManager {
    /// Classifies an identifier that is not live.
    ///
    /// Identifiers are never reused, so anything below the allocation
    /// watermark was destroyed; everything else was never allocated.
    fn unknown_id(&self, id: ContextId) -> ContextError {
        if (FIRST_CONTEXT_ID..self.next_id).contains(&id.to_raw()) {
            ContextError::UseAfterDestroy(id)
        } else {
            ContextError::NotFound(id)
        }
    }
}
