//! Verbose diagnostic logging for memomaker internals.
//!
//! Call `set_verbose(true)` once (the CLI wires this to `--verbose`), then
//! use the `verbose!()` macro anywhere in the crate.

use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable verbose output
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::SeqCst);
}

/// Check whether verbose output is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Print a formatted message when verbose mode is enabled
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            eprintln!("[memomaker] {}", format!($($arg)*));
        }
    };
}
