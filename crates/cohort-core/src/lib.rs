//! `cohort-core` — foundational types for the cohort population engine.
//!
//! This crate is a dependency of every other `cohort-*` crate.  It has no
//! `cohort-*` dependencies and minimal external ones (`rand`, `rustc-hash`,
//! and `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                             |
//! |-----------|------------------------------------------------------|
//! | [`uid`]   | `Uid` — permanent agent identifier                   |
//! | [`rng`]   | `StreamRng` — deterministic seed substreams          |
//! | [`error`] | `CohortError`, `CohortResult`                        |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                     |
//! |---------|--------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to [`Uid`]. |

pub mod error;
pub mod rng;
pub mod uid;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CohortError, CohortResult};
pub use rng::StreamRng;
pub use uid::Uid;
