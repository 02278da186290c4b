//! Multi-lane (2-D) columns.
//!
//! A `LaneColumn<T>` stores a fixed number of lanes per agent — one value per
//! (lane, agent) pair, e.g. per-genotype immunity levels.  Uid, mask, and
//! slice semantics are identical to the scalar [`Column`](crate::Column) and
//! apply along the trailing agent axis only; the lane is an ordinary
//! positional index chosen per call.

use std::iter::Sum;

use cohort_core::{CohortResult, Uid};

use crate::column::{ColumnCore, Numeric};
use crate::mask::Mask;
use crate::selection::Selection;
use crate::selector::{Key, Value};

/// A named, typed, 2-D attribute series: `lanes × population`.
pub struct LaneColumn<T> {
    core: ColumnCore<T>,
}

impl<T: Clone + Default> std::fmt::Debug for LaneColumn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaneColumn")
            .field("name", &self.core.name())
            .field("lanes", &self.core.lanes())
            .finish()
    }
}

impl<T: Clone + Default + 'static> LaneColumn<T> {
    pub(crate) fn new(core: ColumnCore<T>) -> Self {
        debug_assert!(core.lanes() >= 1);
        LaneColumn { core }
    }

    pub(crate) fn core(&self) -> &ColumnCore<T> {
        &self.core
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Number of lanes (the fixed leading axis).
    pub fn lanes(&self) -> usize {
        self.core.lanes()
    }

    /// Live length of the agent axis; always equals the population's count.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn get(&self, lane: usize, uid: Uid) -> CohortResult<T> {
        self.core.get_at(lane, uid)
    }

    pub fn get_many(&self, lane: usize, uids: &[Uid]) -> CohortResult<Vec<T>> {
        self.core.get_many_at(lane, uids)
    }

    pub fn get_mask(&self, lane: usize, mask: &Mask) -> CohortResult<Vec<T>> {
        self.core.get_mask_at(lane, mask)
    }

    /// Copy of one lane's whole live view.
    pub fn lane_to_vec(&self, lane: usize) -> CohortResult<Vec<T>> {
        self.core.lane_vec(lane)
    }

    /// One agent's value in every lane, in lane order.
    pub fn get_agent(&self, uid: Uid) -> CohortResult<Vec<T>> {
        (0..self.lanes()).map(|lane| self.core.get_at(lane, uid)).collect()
    }

    pub fn read(&self, lane: usize, key: &Key<'_>) -> CohortResult<Selection<T>> {
        self.core.read_at(lane, key)
    }

    // ── Writes ────────────────────────────────────────────────────────────

    pub fn set(&self, lane: usize, uid: Uid, value: T) -> CohortResult<()> {
        self.core.set_at(lane, uid, value)
    }

    pub fn set_many(&self, lane: usize, uids: &[Uid], values: &[T]) -> CohortResult<()> {
        self.core.set_many_at(lane, uids, values)
    }

    pub fn set_mask(&self, lane: usize, mask: &Mask, value: T) -> CohortResult<()> {
        self.core.set_mask_at(lane, mask, value)
    }

    /// Broadcast one value across a lane's whole live view.
    pub fn fill_lane(&self, lane: usize, value: T) -> CohortResult<()> {
        self.core.fill_lane(lane, value)
    }

    pub fn write(&self, lane: usize, key: &Key<'_>, value: Value<'_, T>) -> CohortResult<()> {
        self.core.write_at(lane, key, value)
    }

    // ── Vectorized transforms ─────────────────────────────────────────────

    pub fn apply(&self, lane: usize, f: impl FnMut(&mut T)) -> CohortResult<()> {
        self.core.apply_at(lane, f)
    }

    pub fn apply_mask(&self, lane: usize, mask: &Mask, f: impl FnMut(&mut T)) -> CohortResult<()> {
        self.core.apply_mask_at(lane, mask, f)
    }

    pub fn apply_many(&self, lane: usize, uids: &[Uid], f: impl FnMut(&mut T)) -> CohortResult<()> {
        self.core.apply_many_at(lane, uids, f)
    }

    /// Position-space mask from a predicate on one lane's live view.
    pub fn mask_where(&self, lane: usize, pred: impl Fn(&T) -> bool) -> CohortResult<Mask> {
        self.core.compare(lane, pred)
    }
}

impl<T: Clone + Default + PartialEq + 'static> LaneColumn<T> {
    /// Number of elements in one lane differing from `T::default()`.
    pub fn count_nonzero(&self, lane: usize) -> CohortResult<usize> {
        let zero = T::default();
        self.core
            .compare(lane, |v| *v != zero)
            .map(|mask| mask.count())
    }

    pub fn any(&self, lane: usize) -> CohortResult<bool> {
        self.count_nonzero(lane).map(|n| n > 0)
    }

    pub fn all(&self, lane: usize) -> CohortResult<bool> {
        let len = self.len();
        self.count_nonzero(lane).map(|n| n == len)
    }
}

impl<T: Clone + Default + Numeric + Sum<T> + 'static> LaneColumn<T> {
    /// Sum of one lane's live view.
    pub fn sum(&self, lane: usize) -> CohortResult<T> {
        Ok(self.lane_to_vec(lane)?.into_iter().sum())
    }

    /// Mean of one lane's live view as `f64`; `NaN` when the population is
    /// empty.
    pub fn mean(&self, lane: usize) -> CohortResult<f64> {
        let view = self.lane_to_vec(lane)?;
        if view.is_empty() {
            return Ok(f64::NAN);
        }
        let total: f64 = view.iter().map(|v| v.to_f64()).sum();
        Ok(total / view.len() as f64)
    }
}
