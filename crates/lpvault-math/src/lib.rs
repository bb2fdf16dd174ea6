//! # lpvault-math
//!
//! Precision-scaled arithmetic shared by all reward math.
//!
//! Reward-per-share values are stored as integers scaled by [`PRECISION`].
//! All operations are checked: an overflow is an error, never a wrap.
//!
//! ## Modules
//!
//! - [`fixed_point`] — `mul_div` and the remainder-carrying accumulator

pub mod fixed_point;

pub use fixed_point::{mul_div, FixedPointAccumulator, PRECISION};

/// Error types for fixed-point arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    /// Arithmetic overflow.
    #[error("arithmetic overflow")]
    Overflow,

    /// Division by a zero denominator.
    #[error("division by zero")]
    DivisionByZero,
}

/// Convenience result type for math operations.
pub type Result<T> = std::result::Result<T, MathError>;
