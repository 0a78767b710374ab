//! Integration tests for the C surface.
//!
//! The bridge state is process-global, so every test takes `SERIAL` first
//! and installs a fresh recording backend; assertions only concern
//! identifiers created within the same test.

use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use glia::{BackendCall, ContextId, RecordingBackend};
use glia_capi::{
    GliaBackendVtable, glia_abi_version_major, glia_abi_version_minor, glia_clear_backend,
    glia_context_create, glia_context_destroy, glia_context_flush, glia_set_backend,
    install_backend,
};

static SERIAL: Mutex<()> = Mutex::new(());

/// Serializes tests on the global bridge and installs a fresh recorder.
fn setup() -> (MutexGuard<'static, ()>, RecordingBackend) {
    let guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    let backend = RecordingBackend::new();
    install_backend(Box::new(backend.clone()));
    (guard, backend)
}

fn fake_script_context() -> *mut u64 {
    Box::into_raw(Box::new(0_u64))
}

fn release_script_context(raw: *mut u64) {
    // SAFETY: reclaims the allocation made by `fake_script_context`.
    unsafe { drop(Box::from_raw(raw)) };
}

// ============================================================================
// Create
// ============================================================================

#[test]
fn null_handle_creates_nothing() {
    let (_guard, backend) = setup();

    assert_eq!(glia_context_create(0), 0);
    assert!(backend.calls().is_empty(), "null create must not go downstream");
}

#[test]
fn create_returns_the_managers_identifier_unchanged() {
    let (_guard, backend) = setup();
    let raw = fake_script_context();

    let ret = glia_context_create(raw as i64);
    assert!(ret > 0, "non-null create must yield a live identifier");
    assert_eq!(
        backend.calls(),
        vec![BackendCall::Create(ContextId::from_raw(ret), raw as i64)],
        "the backend must observe the id the caller got and the exact handle bits"
    );

    glia_context_destroy(ret);
    release_script_context(raw);
}

// ============================================================================
// Destroy & flush forwarding
// ============================================================================

#[test]
fn destroy_forwards_exactly_once() {
    let (_guard, backend) = setup();
    let raw = fake_script_context();

    let id = glia_context_create(raw as i64);
    backend.clear();

    glia_context_destroy(id);
    assert_eq!(backend.calls(), vec![BackendCall::Destroy(ContextId::from_raw(id))]);

    // The second destroy is forwarded to the manager, rejected there, and
    // never reaches the backend.
    glia_context_destroy(id);
    assert_eq!(backend.calls().len(), 1);

    release_script_context(raw);
}

#[test]
fn flush_forwards_exactly_once_per_call() {
    let (_guard, backend) = setup();
    let raw = fake_script_context();

    let id = glia_context_create(raw as i64);
    backend.clear();

    glia_context_flush(id);
    glia_context_flush(id);
    assert_eq!(
        backend.calls(),
        vec![
            BackendCall::Flush(ContextId::from_raw(id)),
            BackendCall::Flush(ContextId::from_raw(id)),
        ]
    );

    glia_context_destroy(id);
    release_script_context(raw);
}

#[test]
fn unknown_identifiers_never_reach_the_backend() {
    let (_guard, backend) = setup();

    glia_context_destroy(123_456);
    glia_context_flush(123_456);
    glia_context_destroy(0);
    glia_context_flush(-5);
    assert!(backend.calls().is_empty());
}

#[test]
fn lifecycle_events_arrive_in_order() {
    let (_guard, backend) = setup();
    let raw = fake_script_context();

    let id = glia_context_create(raw as i64);
    glia_context_flush(id);
    glia_context_destroy(id);

    let ctx = ContextId::from_raw(id);
    assert_eq!(
        backend.calls(),
        vec![
            BackendCall::Create(ctx, raw as i64),
            BackendCall::Flush(ctx),
            BackendCall::Destroy(ctx),
        ]
    );

    release_script_context(raw);
}

// ============================================================================
// Backend installation & versioning
// ============================================================================

#[test]
fn clear_backend_reverts_to_noop() {
    let (_guard, backend) = setup();
    let raw = fake_script_context();

    let first = glia_context_create(raw as i64);
    glia_clear_backend();
    let second = glia_context_create(raw as i64);
    assert!(second > 0, "the noop backend still accepts creates");
    assert_eq!(
        backend.calls(),
        vec![BackendCall::Create(ContextId::from_raw(first), raw as i64)],
        "the recorder must not see events after being replaced"
    );

    // Reinstall so the registry can be tidied through the recorded backend.
    install_backend(Box::new(backend.clone()));
    glia_context_destroy(first);
    glia_context_destroy(second);
    release_script_context(raw);
}

#[test]
fn abi_version_is_stable() {
    assert_eq!(glia_abi_version_major(), 1);
    assert!(glia_abi_version_minor() >= 0);
}

// ============================================================================
// C vtable backend
// ============================================================================

static VTABLE_CREATED: AtomicI32 = AtomicI32::new(0);
static VTABLE_SCRIPT_CTX: AtomicI64 = AtomicI64::new(0);
static VTABLE_FLUSHES: AtomicI32 = AtomicI32::new(0);
static VTABLE_DESTROYED: AtomicI32 = AtomicI32::new(0);

unsafe extern "C" fn vtable_create(ctx_id: i32, script_ctx: i64) -> i32 {
    VTABLE_CREATED.store(ctx_id, Ordering::SeqCst);
    VTABLE_SCRIPT_CTX.store(script_ctx, Ordering::SeqCst);
    0
}

unsafe extern "C" fn vtable_destroy(ctx_id: i32) {
    VTABLE_DESTROYED.store(ctx_id, Ordering::SeqCst);
}

unsafe extern "C" fn vtable_flush(_ctx_id: i32) {
    VTABLE_FLUSHES.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn c_vtable_backend_receives_lifecycle_events() {
    let (_guard, _backend) = setup();
    glia_set_backend(GliaBackendVtable {
        create_context: Some(vtable_create),
        destroy_context: Some(vtable_destroy),
        flush: Some(vtable_flush),
    });
    let raw = fake_script_context();

    let id = glia_context_create(raw as i64);
    glia_context_flush(id);
    glia_context_destroy(id);

    assert_eq!(VTABLE_CREATED.load(Ordering::SeqCst), id);
    assert_eq!(VTABLE_SCRIPT_CTX.load(Ordering::SeqCst), raw as i64);
    assert_eq!(VTABLE_FLUSHES.load(Ordering::SeqCst), 1);
    assert_eq!(VTABLE_DESTROYED.load(Ordering::SeqCst), id);

    glia_clear_backend();
    release_script_context(raw);
}
