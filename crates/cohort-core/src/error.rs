//! Engine error type.
//!
//! Every failure in the engine is local and synchronous: it is surfaced to
//! the caller at the failing call, never downgraded to a default value.
//! A silently defaulted population attribute (a missing uid read as "not
//! infected", say) would corrupt downstream accounting, so the read/write
//! paths fail fast instead.

use thiserror::Error;

use crate::Uid;

/// The top-level error type for all `cohort-*` crates.
#[derive(Debug, Error)]
pub enum CohortError {
    /// The uid has no live position: never issued, or removed.
    #[error("uid {0} not present in the population")]
    UidNotFound(Uid),

    /// Name lookup missed the column registry.
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// The column exists but holds a different element type.
    #[error("column '{name}' holds elements of type {stored}, not {requested}")]
    ColumnType {
        name: String,
        stored: &'static str,
        requested: &'static str,
    },

    /// A value array or mask whose length does not match the target.
    #[error("length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Bounded or stepped slices by uid are rejected: uid order and position
    /// order diverge after compaction, so only the full slice is meaningful.
    #[error("bounded uid slices are not supported; use the full slice or an explicit uid list")]
    UnsupportedSlice,

    /// Lane index out of range on a multi-lane column.
    #[error("lane {lane} out of bounds for a column with {lanes} lanes")]
    LaneOutOfBounds { lane: usize, lanes: usize },

    /// A structural mutation attempted outside the population coordinator:
    /// duplicate registration, lifecycle-stage misuse, or reentrant column
    /// access during grow/remove.
    #[error("write protocol violation: {0}")]
    WriteProtocolViolation(String),

    /// Identifier space or backing allocation cannot grow.  Fatal; never
    /// retried.
    #[error("capacity exhausted: {0}")]
    CapacityExhausted(String),

    /// Invalid construction parameter.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `cohort-*` crates.
pub type CohortResult<T> = Result<T, CohortError>;
