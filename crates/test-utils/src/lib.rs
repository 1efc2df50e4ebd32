//! Shared test utilities for the NEX-GDDP export workspace.
//!
//! This crate provides common testing infrastructure including:
//! - An in-memory [`FakeRemoteService`] with a synthetic daily catalog
//! - Daily value generators in the collection's native units
//! - Common fixtures (regions, models, date windows)
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, FakeRemoteService};
//! ```

pub mod fake;
pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fake::{FakeImage, FakeRemoteService, RecordedCall};
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(26.85, 300.0 - 273.15, 1e-9); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);  // fails
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
