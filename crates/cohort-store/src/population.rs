//! The population coordinator.
//!
//! A `Population` owns the canonical uid map, the live-uid roster, and the
//! registry of every column attached to it.  It is the only component that
//! grows or removes agents, because every column's logical length and
//! identity alignment must change together: growth extends the map and every
//! column in lockstep; removal compacts every column and rebuilds the map
//! from one survivor ordering.
//!
//! Columns register late and by name (modules declare their own attributes
//! at setup time); lookups fail fast on unknown names or mismatched element
//! types.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use cohort_core::{CohortError, CohortResult, StreamRng, Uid};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::column::{Column, ColumnCore};
use crate::fill::Fill;
use crate::lane::LaneColumn;
use crate::mask::Mask;
use crate::uid_map::UidMap;

// ── Column specs ──────────────────────────────────────────────────────────────

/// Description of a scalar column before registration.
///
/// A spec holds no storage.  Registering it with
/// [`Population::add_column`] allocates the backing buffer sized to the
/// current population, backfills existing agents via the fill policy, and
/// returns the live handle.
pub struct ColumnSpec<T> {
    name: String,
    fill: Fill<T>,
}

impl<T: Clone + Default> ColumnSpec<T> {
    pub fn new(name: impl Into<String>, fill: Fill<T>) -> Self {
        ColumnSpec { name: name.into(), fill }
    }

    /// A column filled with `T::default()`.
    pub fn with_default(name: impl Into<String>) -> Self {
        ColumnSpec { name: name.into(), fill: Fill::default() }
    }
}

/// Description of a multi-lane column before registration.
pub struct LaneColumnSpec<T> {
    name: String,
    lanes: usize,
    fill: Fill<T>,
}

impl<T: Clone + Default> LaneColumnSpec<T> {
    pub fn new(name: impl Into<String>, lanes: usize, fill: Fill<T>) -> Self {
        LaneColumnSpec { name: name.into(), lanes, fill }
    }
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

/// Population lifecycle stage.
///
/// `Growing` and `Removing` bracket exactly the window in which column
/// lengths are being changed; the population always returns to `Ready`
/// before control reaches any caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Constructed but not yet initialized; no agents exist.
    Unbuilt,
    /// Initialized; columns are consistent and queryable.
    Ready,
    /// Mid-grow.
    Growing,
    /// Mid-remove.
    Removing,
}

// ── Coordinator-facing column interface ───────────────────────────────────────

/// Type-erased interface the coordinator drives columns through.
///
/// Crate-private: module code never sees the structural entry points, which
/// is what enforces the resize-only-through-the-coordinator contract.
pub(crate) trait AnyColumn: 'static {
    fn name(&self) -> &str;
    fn len(&self) -> usize;
    /// Concrete handle type, for type-mismatch diagnostics.
    fn stored_type(&self) -> &'static str;
    fn stage_grow(&self, uids: &[Uid]) -> CohortResult<()>;
    fn commit_grow(&self);
    fn abort_grow(&self);
    fn check_exclusive(&self) -> CohortResult<()>;
    fn compact(&self, keep: &[usize]);
    fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Clone + Default + 'static> AnyColumn for Column<T> {
    fn name(&self) -> &str {
        self.core().name()
    }

    fn len(&self) -> usize {
        self.core().len()
    }

    fn stored_type(&self) -> &'static str {
        std::any::type_name::<Column<T>>()
    }

    fn stage_grow(&self, uids: &[Uid]) -> CohortResult<()> {
        self.core().stage_grow(uids)
    }

    fn commit_grow(&self) {
        self.core().commit_grow();
    }

    fn abort_grow(&self) {
        self.core().abort_grow();
    }

    fn check_exclusive(&self) -> CohortResult<()> {
        self.core().check_exclusive()
    }

    fn compact(&self, keep: &[usize]) {
        self.core().compact(keep);
    }

    fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl<T: Clone + Default + 'static> AnyColumn for LaneColumn<T> {
    fn name(&self) -> &str {
        self.core().name()
    }

    fn len(&self) -> usize {
        self.core().len()
    }

    fn stored_type(&self) -> &'static str {
        std::any::type_name::<LaneColumn<T>>()
    }

    fn stage_grow(&self, uids: &[Uid]) -> CohortResult<()> {
        self.core().stage_grow(uids)
    }

    fn commit_grow(&self) {
        self.core().commit_grow();
    }

    fn abort_grow(&self) {
        self.core().abort_grow();
    }

    fn check_exclusive(&self) -> CohortResult<()> {
        self.core().check_exclusive()
    }

    fn compact(&self, keep: &[usize]) {
        self.core().compact(keep);
    }

    fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

// ── Population ────────────────────────────────────────────────────────────────

/// Coordinator for one logical population: uid issuance, the uid map, the
/// live roster, and every registered column.
pub struct Population {
    stage: Stage,
    streams: StreamRng,
    next_uid: u32,
    index: Rc<RefCell<UidMap>>,
    roster: Rc<RefCell<Vec<Uid>>>,
    columns: Vec<Rc<dyn AnyColumn>>,
    names: FxHashMap<String, usize>,
}

impl Population {
    /// A new, unbuilt population.  `seed` roots every column's deterministic
    /// fill stream.
    pub fn new(seed: u64) -> Self {
        Population {
            stage: Stage::Unbuilt,
            streams: StreamRng::new(seed),
            next_uid: 0,
            index: Rc::new(RefCell::new(UidMap::new())),
            roster: Rc::new(RefCell::new(Vec::new())),
            columns: Vec::new(),
            names: FxHashMap::default(),
        }
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn seed(&self) -> u64 {
        self.streams.seed()
    }

    /// Number of live agents.
    pub fn count(&self) -> usize {
        self.roster.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.index.borrow().lookup(uid).is_some()
    }

    /// Current backing position of a live uid.
    pub fn position_of(&self, uid: Uid) -> CohortResult<usize> {
        self.index.borrow().lookup(uid).ok_or(CohortError::UidNotFound(uid))
    }

    /// All live uids in position order.
    pub fn live_uids(&self) -> Vec<Uid> {
        self.roster.borrow().clone()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Registered column names, in registration order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Uids at the mask's marked positions; the mask addresses position
    /// space and must cover the whole live view.
    pub fn select(&self, mask: &Mask) -> CohortResult<Vec<Uid>> {
        let roster = self.roster.borrow();
        if mask.len() != roster.len() {
            return Err(CohortError::DimensionMismatch {
                expected: roster.len(),
                actual: mask.len(),
            });
        }
        Ok(mask.positions().map(|pos| roster[pos]).collect())
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register a scalar column and return its shared handle.
    ///
    /// The column is immediately backfilled to the current live count with
    /// its fill policy, so it starts consistent with every existing column.
    pub fn add_column<T>(&mut self, spec: ColumnSpec<T>) -> CohortResult<Rc<Column<T>>>
    where
        T: Clone + Default + 'static,
    {
        self.check_name(&spec.name)?;
        let core = ColumnCore::new(
            spec.name.clone(),
            1,
            spec.fill,
            self.streams.derive(&spec.name),
            Rc::clone(&self.index),
            Rc::clone(&self.roster),
        );
        let column = Rc::new(Column::new(core));
        self.backfill(column.as_ref())?;
        self.insert(spec.name, column.clone());
        Ok(column)
    }

    /// Register a multi-lane column and return its shared handle.
    pub fn add_lane_column<T>(&mut self, spec: LaneColumnSpec<T>) -> CohortResult<Rc<LaneColumn<T>>>
    where
        T: Clone + Default + 'static,
    {
        if spec.lanes == 0 {
            return Err(CohortError::Config(format!(
                "column '{}' needs at least one lane",
                spec.name
            )));
        }
        self.check_name(&spec.name)?;
        let core = ColumnCore::new(
            spec.name.clone(),
            spec.lanes,
            spec.fill,
            self.streams.derive(&spec.name),
            Rc::clone(&self.index),
            Rc::clone(&self.roster),
        );
        let column = Rc::new(LaneColumn::new(core));
        self.backfill(column.as_ref())?;
        self.insert(spec.name, column.clone());
        Ok(column)
    }

    /// Look up a scalar column handle by name.
    pub fn column<T>(&self, name: &str) -> CohortResult<Rc<Column<T>>>
    where
        T: Clone + Default + 'static,
    {
        let entry = self.entry(name)?;
        let stored = entry.stored_type();
        entry
            .as_any_rc()
            .downcast::<Column<T>>()
            .map_err(|_| CohortError::ColumnType {
                name: name.to_string(),
                stored,
                requested: std::any::type_name::<Column<T>>(),
            })
    }

    /// Look up a multi-lane column handle by name.
    pub fn lane_column<T>(&self, name: &str) -> CohortResult<Rc<LaneColumn<T>>>
    where
        T: Clone + Default + 'static,
    {
        let entry = self.entry(name)?;
        let stored = entry.stored_type();
        entry
            .as_any_rc()
            .downcast::<LaneColumn<T>>()
            .map_err(|_| CohortError::ColumnType {
                name: name.to_string(),
                stored,
                requested: std::any::type_name::<LaneColumn<T>>(),
            })
    }

    // ── Structural operations ─────────────────────────────────────────────

    /// Create the initial agents, uids `0..n`, and allocate and backfill
    /// every registered column.
    pub fn initialize(&mut self, n: usize) -> CohortResult<Vec<Uid>> {
        if self.stage != Stage::Unbuilt {
            return Err(CohortError::WriteProtocolViolation(
                "population is already initialized".into(),
            ));
        }
        self.stage = Stage::Ready;
        match self.grow(n) {
            Ok(uids) => {
                debug!(count = n, columns = self.columns.len(), "initialized population");
                Ok(uids)
            }
            Err(err) => {
                self.stage = Stage::Unbuilt;
                Err(err)
            }
        }
    }

    /// Create `n` agents with fresh, never-reused uids, and return them.
    ///
    /// Every column is extended and filled per its own policy.  The
    /// operation is atomic: all fill values are computed and validated, and
    /// all capacity reserved, before any column's logical state changes; a
    /// staging failure leaves the population untouched.
    pub fn grow(&mut self, n: usize) -> CohortResult<Vec<Uid>> {
        self.ensure_ready("grow")?;
        if n == 0 {
            return Ok(Vec::new());
        }

        let first = self.next_uid as u64;
        let end = first + n as u64;
        if end > u32::MAX as u64 {
            return Err(CohortError::CapacityExhausted(format!(
                "uid space cannot issue {n} more identifiers past {first}"
            )));
        }
        let new_uids: Vec<Uid> = (self.next_uid..self.next_uid + n as u32).map(Uid).collect();

        // Stage: validate every column before anything becomes visible.
        for (staged, column) in self.columns.iter().enumerate() {
            if let Err(err) = column.stage_grow(&new_uids) {
                for column in &self.columns[..=staged] {
                    column.abort_grow();
                }
                return Err(err);
            }
        }

        // Commit: infallible from here on.
        self.stage = Stage::Growing;
        let start_pos = self.roster.borrow().len();
        let positions: Vec<usize> = (start_pos..start_pos + n).collect();
        self.index.borrow_mut().extend(&new_uids, &positions);
        self.roster.borrow_mut().extend_from_slice(&new_uids);
        for column in &self.columns {
            column.commit_grow();
        }
        self.next_uid = end as u32;
        self.stage = Stage::Ready;
        trace!(added = n, total = self.count(), "grew population");
        Ok(new_uids)
    }

    /// Remove the given agents and return how many were actually removed.
    ///
    /// Duplicate and already-absent uids are no-ops, not errors: modules
    /// routinely submit overlapping removal requests within one timestep.
    /// Survivors keep their relative order; their new positions are written
    /// identically into every column and the uid map.
    pub fn remove(&mut self, uids: &[Uid]) -> CohortResult<usize> {
        self.ensure_ready("remove")?;
        let doomed: FxHashSet<Uid> = uids.iter().copied().collect();

        let (survivors, keep) = {
            let roster = self.roster.borrow();
            let mut survivors = Vec::with_capacity(roster.len());
            let mut keep = Vec::with_capacity(roster.len());
            for (pos, &uid) in roster.iter().enumerate() {
                if !doomed.contains(&uid) {
                    survivors.push(uid);
                    keep.push(pos);
                }
            }
            (survivors, keep)
        };
        let removed = self.count() - survivors.len();
        if removed == 0 {
            return Ok(0);
        }

        // Pre-flight: no column may be mid-access when compaction starts.
        for column in &self.columns {
            column.check_exclusive()?;
        }

        self.stage = Stage::Removing;
        for column in &self.columns {
            column.compact(&keep);
        }
        self.index.borrow_mut().rebuild(&survivors);
        *self.roster.borrow_mut() = survivors;
        self.stage = Stage::Ready;
        trace!(removed, total = self.count(), "removed agents");
        Ok(removed)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn ensure_ready(&self, op: &str) -> CohortResult<()> {
        match self.stage {
            Stage::Ready => Ok(()),
            Stage::Unbuilt => Err(CohortError::WriteProtocolViolation(format!(
                "cannot {op} before initialize"
            ))),
            stage => Err(CohortError::WriteProtocolViolation(format!(
                "cannot {op} while the population is {stage:?}"
            ))),
        }
    }

    fn check_name(&self, name: &str) -> CohortResult<()> {
        if self.names.contains_key(name) {
            return Err(CohortError::WriteProtocolViolation(format!(
                "column '{name}' is already registered; columns cannot be replaced"
            )));
        }
        Ok(())
    }

    fn entry(&self, name: &str) -> CohortResult<Rc<dyn AnyColumn>> {
        self.names
            .get(name)
            .map(|&idx| Rc::clone(&self.columns[idx]))
            .ok_or_else(|| CohortError::ColumnNotFound(name.to_string()))
    }

    /// Allocate a fresh column to the current live count via its fill policy.
    fn backfill(&self, column: &dyn AnyColumn) -> CohortResult<()> {
        let live = self.roster.borrow().clone();
        if let Err(err) = column.stage_grow(&live) {
            column.abort_grow();
            return Err(err);
        }
        column.commit_grow();
        debug!(column = column.name(), backfilled = live.len(), "registered column");
        Ok(())
    }

    fn insert(&mut self, name: String, column: Rc<dyn AnyColumn>) {
        self.names.insert(name, self.columns.len());
        self.columns.push(column);
    }
}
