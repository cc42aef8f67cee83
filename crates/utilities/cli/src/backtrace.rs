//! Helper to set the backtrace env var.

use std::sync::Once;

static INIT: Once = Once::new();

/// Sets `RUST_BACKTRACE=1` unless a value was explicitly provided.
///
/// Must be called at the very start of `main`, before any other thread is spawned.
pub fn enable() {
    INIT.call_once(|| {
        if std::env::var_os("RUST_BACKTRACE").is_none() {
            // SAFETY: called once, before the runtime or any other thread is started.
            unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_sets_or_preserves_backtrace() {
        let before = std::env::var("RUST_BACKTRACE").ok();
        enable();
        let after = std::env::var("RUST_BACKTRACE").unwrap();
        match before {
            Some(value) => assert_eq!(after, value),
            None => assert_eq!(after, "1"),
        }
    }
}
