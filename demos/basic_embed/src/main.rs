//! Minimal embedder walkthrough.
//!
//! Installs a recording backend, registers a context for a fabricated
//! script-engine context, flushes it a few times through the C entry points,
//! and prints what the backend observed. Run with `RUST_LOG=debug` to see
//! the bridge's own logging.

use glia::RecordingBackend;
use glia_capi::{glia_context_create, glia_context_destroy, glia_context_flush, install_backend};

fn main() {
    env_logger::init();

    let backend = RecordingBackend::new();
    install_backend(Box::new(backend.clone()));

    // Stand-in for the scripting engine's global context; a real embedder
    // receives this pointer from its script runtime.
    let script_ctx = Box::into_raw(Box::new(0_u64));

    let ctx_id = glia_context_create(script_ctx as i64);
    log::info!("created context {ctx_id}");

    for _ in 0..3 {
        glia_context_flush(ctx_id);
    }
    glia_context_destroy(ctx_id);

    // Rejected by the manager: the identifier is gone. Logged as a warning.
    glia_context_flush(ctx_id);

    for call in backend.calls() {
        println!("backend observed: {call:?}");
    }

    // SAFETY: reclaims the stand-in allocation created above.
    unsafe { drop(Box::from_raw(script_ctx)) };
}
