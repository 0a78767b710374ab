//! Opaque script-engine context handles.
//!
//! The managed runtime's foreign boundary cannot express native pointers, so
//! the scripting engine's global context crosses it as a raw 64-bit integer.
//! This module is the single place where that bit pattern is reinterpreted
//! as a pointer; the rest of the workspace treats [`ScriptContextRef`] as
//! fully opaque.

use core::ffi::c_void;
use core::fmt;
use core::ptr::NonNull;

/// A non-null reference to a scripting engine's global execution context.
///
/// The context is owned entirely by the scripting engine. This crate never
/// dereferences, clones, or frees it; the pointer is only carried through to
/// the render backend. Validity beyond non-nullness is the caller's
/// responsibility.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptContextRef(NonNull<c_void>);

impl ScriptContextRef {
    /// Reinterprets a raw 64-bit handle as a script-context pointer.
    ///
    /// Returns `None` when `bits` is zero; any other value is accepted
    /// uninspected.
    ///
    /// # Safety
    ///
    /// `bits` must be the address of a live script-engine global context (or
    /// zero), exactly as handed out by the scripting engine on this side of
    /// the foreign boundary. The pointer is never dereferenced here, but
    /// downstream consumers receive it as a valid context pointer.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "the handle is a pointer smuggled through a 64-bit integer"
    )]
    pub unsafe fn from_bits(bits: i64) -> Option<Self> {
        NonNull::new(bits as usize as *mut c_void).map(Self)
    }

    /// Returns the handle's bit pattern, as carried across the boundary.
    #[must_use]
    #[expect(
        clippy::cast_possible_wrap,
        reason = "round-trips the bit pattern accepted by `from_bits`"
    )]
    pub fn to_bits(self) -> i64 {
        self.0.as_ptr() as usize as i64
    }

    /// Returns the underlying pointer for handoff to native collaborators.
    #[must_use]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

// SAFETY: the handle is an address-sized token. This crate never
// dereferences it, and the scripting engine owns the pointee; moving the
// token between threads moves nothing else.
unsafe impl Send for ScriptContextRef {}

impl fmt::Debug for ScriptContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptContextRef({:#x})", self.to_bits())
    }
}
