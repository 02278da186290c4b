//! `cohort-store` — identity-indexed, dynamically growable columnar storage
//! for agent populations.
//!
//! Agents are named by permanent [`Uid`]s and stored densely by transient
//! positions.  Each attribute is a [`Column`] (or multi-lane [`LaneColumn`])
//! over one growable buffer; a [`Population`] coordinates uid issuance,
//! growth, and removal so every column stays aligned with the uid map at all
//! times.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`uid_map`]    | `UidMap` — dense uid → position map, `NO_POSITION` sentinel |
//! | [`buffer`]     | `GrowVec<T>` — lane-major buffer, amortized growth, compaction |
//! | [`fill`]       | `Fill<T>` — new-agent value policies                     |
//! | [`mask`]       | `Mask` — position-space boolean algebra                  |
//! | [`selector`]   | `Key`, `Value` — access selectors                        |
//! | [`selection`]  | `Selection<T>` — reads that keep their uid context       |
//! | [`column`]     | `Column<T>` — scalar columns, comparisons, reductions    |
//! | [`lane`]       | `LaneColumn<T>` — fixed-lane 2-D columns                 |
//! | [`population`] | `Population`, `ColumnSpec`, `Stage` — the coordinator    |
//!
//! # Example
//!
//! ```rust
//! use cohort_store::{ColumnSpec, Fill, Population};
//!
//! let mut people = Population::new(42);
//! let infected = people.add_column(ColumnSpec::new("infected", Fill::Const(false)))?;
//! let age = people.add_column(ColumnSpec::new("age", Fill::Const(30.0_f64)))?;
//! people.initialize(1_000)?;
//!
//! let newborns = people.grow(10)?;
//! age.set_many(&newborns, &vec![0.0; newborns.len()])?;
//! infected.set(newborns[0], true)?;
//!
//! assert_eq!(people.count(), 1_010);
//! assert_eq!(infected.count_nonzero()?, 1);
//! # Ok::<(), cohort_store::CohortError>(())
//! ```

pub mod buffer;
pub mod column;
pub mod fill;
pub mod lane;
pub mod mask;
pub mod population;
pub mod selection;
pub mod selector;
pub mod uid_map;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use buffer::GrowVec;
pub use cohort_core::{CohortError, CohortResult, StreamRng, Uid};
pub use column::{Column, Numeric};
pub use fill::Fill;
pub use lane::LaneColumn;
pub use mask::Mask;
pub use population::{ColumnSpec, LaneColumnSpec, Population, Stage};
pub use selection::Selection;
pub use selector::{Key, Value};
pub use uid_map::{NO_POSITION, UidMap};
