//! Forward-only execution scope.
//!
//! Forward passes run inside an [`InferenceMode`] guard. The ONNX backends
//! never build a gradient graph, but the scope keeps the pipeline explicit
//! about where forward computation starts and stops, and backends assert they
//! are only invoked inside it.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// RAII guard marking the current thread as inside a forward-only scope.
///
/// Scopes nest; the thread leaves inference mode when the outermost guard
/// is dropped. The guard is `!Send` since the flag is per-thread.
pub struct InferenceMode {
    _not_send: PhantomData<*const ()>,
}

impl InferenceMode {
    pub fn enter() -> Self {
        DEPTH.with(|d| d.set(d.get() + 1));
        Self {
            _not_send: PhantomData,
        }
    }

    /// True while at least one guard is alive on this thread.
    pub fn is_enabled() -> bool {
        DEPTH.with(|d| d.get() > 0)
    }
}

impl Drop for InferenceMode {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
