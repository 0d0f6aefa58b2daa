//! Shared test utilities for the forecast viewer workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers and a skip macro for optional files (fonts)
//! - Synthetic GFS-like fields over regional windows
//! - Canned OPeNDAP responses shaped like NOMADS output
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// Rendering tests that need a TrueType font use this; the font is looked up
/// with [`find_test_file`].
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_title_text() {
///     let path = require_test_file!("DejaVuSans.ttf");
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Set TEST_DATA_DIR to a directory containing it.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }
}
