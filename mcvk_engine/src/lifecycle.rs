//! Lifecycle checks
//!
//! Construct/use/destroy ordering rules (no double initialization, no
//! out-of-range framebuffer access, no device teardown while dependents are
//! alive, no destruction of a null handle) are checked through
//! [`lifecycle_assert!`](crate::lifecycle_assert). The checks can be switched
//! on and off at runtime; they default to on in debug builds.
//!
//! A violated check logs an ERROR and panics. Code that must keep running
//! with checks disabled pairs the assertion with its own fallback path.

use std::sync::atomic::{AtomicBool, Ordering};

static LIFECYCLE_CHECKS: AtomicBool = AtomicBool::new(cfg!(debug_assertions));

/// Enable or disable lifecycle checks for the whole process
pub fn set_enabled(enabled: bool) {
    LIFECYCLE_CHECKS.store(enabled, Ordering::Relaxed);
}

/// Whether lifecycle checks are currently active
pub fn enabled() -> bool {
    LIFECYCLE_CHECKS.load(Ordering::Relaxed)
}

/// Assert a lifecycle rule
///
/// Evaluates to `true` when the condition holds. When it does not and checks
/// are enabled, the violation is logged and the thread panics. When checks are
/// disabled the macro evaluates to `false` and the caller picks the fallback.
#[macro_export]
macro_rules! lifecycle_assert {
    ($cond:expr, $source:expr, $($arg:tt)*) => {{
        if $cond {
            true
        } else if $crate::lifecycle::enabled() {
            let message = format!($($arg)*);
            $crate::engine_error!($source, "Lifecycle violation: {}", message);
            panic!("lifecycle violation: {}", message);
        } else {
            false
        }
    }};
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
