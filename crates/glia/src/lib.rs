#![doc = include_str!("../../../README.md")]

mod backend;
mod handle;
mod manager;

pub use crate::{
    backend::{BackendCall, GlBackend, NoopBackend, RecordingBackend},
    handle::ScriptContextRef,
    manager::{BridgeLimits, ContextError, ContextId, ContextInfo, ContextManager, ManagerStats},
};
