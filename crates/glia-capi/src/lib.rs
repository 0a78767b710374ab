//! C ABI for the glia context bridge.
//!
//! This is the foreign-call surface a managed runtime's FFI layer binds to.
//! Script-engine contexts cross the boundary as raw 64-bit integers and
//! contexts are named by small 32-bit identifiers; both sides treat the
//! values as opaque.
//!
//! The surface is deliberately thin: each entry point unwraps its arguments
//! and forwards to the process-global [`ContextManager`]. All state -- which
//! identifiers are live, what flush drains -- lives behind it. The only
//! defensive check here is the null guard on create; everything else is the
//! manager's job.
//!
//! Entry points may be called from whatever thread the managed runtime uses
//! for foreign calls; a global lock serializes access. Backend callbacks run
//! under that lock and must not call back into this surface.

use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use glia::{ContextId, ContextManager, GlBackend, NoopBackend, ScriptContextRef};

/// Incremented when the C surface changes incompatibly.
pub const ABI_VERSION_MAJOR: i32 = 1;
/// Incremented when the C surface gains compatible additions.
pub const ABI_VERSION_MINOR: i32 = 0;

/// The process-global context manager behind the C surface.
///
/// Starts with a [`NoopBackend`] so the lifecycle entry points are safe to
/// call before a backend is installed.
static BRIDGE: LazyLock<Mutex<ContextManager>> =
    LazyLock::new(|| Mutex::new(ContextManager::new(Box::new(NoopBackend))));

fn bridge() -> MutexGuard<'static, ContextManager> {
    BRIDGE.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Backend installation
// =============================================================================

/// Installs the render backend behind the global bridge.
///
/// For Rust embedders and tests; C embedders use [`glia_set_backend`].
/// Intended for startup, before any context exists.
pub fn install_backend(backend: Box<dyn GlBackend>) {
    bridge().set_backend(backend);
}

/// Function-pointer table through which a C embedder receives context
/// lifecycle events.
///
/// Any entry may be null; null entries are skipped. `create_context` returns
/// 0 on success; any other value rejects the context and the create fails.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct GliaBackendVtable {
    /// GL-side setup for a newly registered context.
    pub create_context: Option<unsafe extern "C" fn(ctx_id: i32, script_ctx: i64) -> i32>,
    /// GL-side teardown for a destroyed context.
    pub destroy_context: Option<unsafe extern "C" fn(ctx_id: i32)>,
    /// Execute work queued for a context.
    pub flush: Option<unsafe extern "C" fn(ctx_id: i32)>,
}

/// Adapter that lets a C vtable stand behind the [`GlBackend`] seam.
#[derive(Debug, Clone, Copy)]
struct VtableBackend {
    vtable: GliaBackendVtable,
}

impl GlBackend for VtableBackend {
    fn create_context(&mut self, id: ContextId, script_ctx: ScriptContextRef) -> Result<(), String> {
        let Some(create) = self.vtable.create_context else {
            return Ok(());
        };
        // SAFETY: the embedder installed this pointer via `glia_set_backend`
        // and guarantees it stays callable while installed.
        let code = unsafe { create(id.to_raw(), script_ctx.to_bits()) };
        if code == 0 {
            Ok(())
        } else {
            Err(format!("backend create_context returned {code}"))
        }
    }

    fn destroy_context(&mut self, id: ContextId) {
        if let Some(destroy) = self.vtable.destroy_context {
            // SAFETY: as for `create_context`.
            unsafe { destroy(id.to_raw()) };
        }
    }

    fn flush(&mut self, id: ContextId) {
        if let Some(flush) = self.vtable.flush {
            // SAFETY: as for `create_context`.
            unsafe { flush(id.to_raw()) };
        }
    }
}

/// Installs a C backend behind the bridge.
///
/// The function pointers must stay valid until replaced or cleared, and must
/// be callable from whatever thread drives the lifecycle entry points.
#[unsafe(no_mangle)]
pub extern "C" fn glia_set_backend(vtable: GliaBackendVtable) {
    install_backend(Box::new(VtableBackend { vtable }));
}

/// Reverts the bridge to a backend that discards every event.
#[unsafe(no_mangle)]
pub extern "C" fn glia_clear_backend() {
    install_backend(Box::new(NoopBackend));
}

// =============================================================================
// Context lifecycle
// =============================================================================

/// Registers a GL context for the script-engine context behind `script_ctx`.
///
/// `script_ctx` is a native context pointer smuggled through a 64-bit
/// integer. Zero returns 0 without touching the context manager. Any other
/// value is forwarded uninspected; a non-null-but-invalid handle is the
/// caller's fault, exactly as with any native API taking a pointer.
///
/// Returns the new context identifier, or 0 if no context was created (null
/// handle, or the manager rejected the create -- the reason is logged).
#[unsafe(no_mangle)]
#[must_use]
pub extern "C" fn glia_context_create(script_ctx: i64) -> i32 {
    // SAFETY: `script_ctx` is the managed runtime's carrier for a native
    // script-context pointer; reinterpreting it is this function's contract.
    let Some(handle) = (unsafe { ScriptContextRef::from_bits(script_ctx) }) else {
        return 0;
    };
    match bridge().create(handle) {
        Ok(id) => id.to_raw(),
        Err(err) => {
            log::error!("context create failed: {err}");
            0
        }
    }
}

/// Destroys the context named by `ctx_id`, invalidating the identifier.
///
/// Always forwards to the context manager, whatever the value; invalid
/// identifiers are rejected there and logged here.
#[unsafe(no_mangle)]
pub extern "C" fn glia_context_destroy(ctx_id: i32) {
    if let Err(err) = bridge().destroy(ContextId::from_raw(ctx_id)) {
        log::warn!("context destroy ignored: {err}");
    }
}

/// Executes work queued for the context named by `ctx_id`.
///
/// Always forwards to the context manager, whatever the value; invalid
/// identifiers are rejected there and logged here.
#[unsafe(no_mangle)]
pub extern "C" fn glia_context_flush(ctx_id: i32) {
    if let Err(err) = bridge().flush(ContextId::from_raw(ctx_id)) {
        log::warn!("context flush ignored: {err}");
    }
}

// =============================================================================
// ABI versioning
// =============================================================================

/// Major ABI version; bindings must match this exactly.
#[unsafe(no_mangle)]
#[must_use]
pub extern "C" fn glia_abi_version_major() -> i32 {
    ABI_VERSION_MAJOR
}

/// Minor ABI version; bindings may require at least a given value.
#[unsafe(no_mangle)]
#[must_use]
pub extern "C" fn glia_abi_version_minor() -> i32 {
    ABI_VERSION_MINOR
}
