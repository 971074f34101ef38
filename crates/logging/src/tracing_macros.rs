//! Convenience macros for fswalk-specific tracing.
//!
//! Each macro forwards to the standard tracing macro of its level with the
//! target of one [`DebugFlag`](crate::DebugFlag). Callers must depend on
//! `tracing` themselves.

/// Emit a traversal lifecycle trace.
///
/// # Example
/// ```ignore
/// trace_walk!("walk started at {}", root.display());
/// ```
#[macro_export]
macro_rules! trace_walk {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "fswalk::walk", $($arg)*);
    };
}

/// Emit a queue scheduling trace.
///
/// # Example
/// ```ignore
/// trace_queue!("{} ceiling raised to {}", name, ceiling);
/// ```
#[macro_export]
macro_rules! trace_queue {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "fswalk::queue", $($arg)*);
    };
}

/// Emit a flow controller trace.
///
/// # Example
/// ```ignore
/// trace_flow!("pull: backlog={}", backlog);
/// ```
#[macro_export]
macro_rules! trace_flow {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "fswalk::flow", $($arg)*);
    };
}

/// Emit a filesystem primitive trace.
///
/// # Example
/// ```ignore
/// trace_fs!("read_dir {}", path.display());
/// ```
#[macro_export]
macro_rules! trace_fs {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "fswalk::fs", $($arg)*);
    };
}
