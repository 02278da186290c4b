//! Scalar (1-D) columns and the shared core behind all registered columns.
//!
//! A column is one named, typed attribute series for a whole population.
//! All keyed access goes by uid (translated through the population's shared
//! uid map), by position-space mask, or by the full slice; every path fails
//! fast on an untranslatable uid rather than returning a default.
//!
//! Columns never resize themselves.  The growth and compaction entry points
//! are crate-private and driven only by the `Population` coordinator, which
//! is what keeps every column of a population the same length at all times.
//! Interior state lives in `RefCell`s; a reentrant touch during a structural
//! operation (e.g. a fill closure reading the column mid-grow) is caught by
//! `try_borrow` and surfaced as `WriteProtocolViolation`.

use std::cell::{Ref, RefCell, RefMut};
use std::iter::Sum;
use std::rc::Rc;

use cohort_core::{CohortError, CohortResult, StreamRng, Uid};

use crate::buffer::GrowVec;
use crate::fill::Fill;
use crate::mask::Mask;
use crate::selection::Selection;
use crate::selector::{Key, Value};
use crate::uid_map::UidMap;

// ── Shared core ───────────────────────────────────────────────────────────────

/// State common to every registered column: the backing buffer, the fill
/// policy with its deterministic sample stream, and shared handles to the
/// population's uid map and live-uid roster.
pub(crate) struct ColumnCore<T> {
    name: String,
    lanes: usize,
    fill: Fill<T>,
    stream: StreamRng,
    index: Rc<RefCell<UidMap>>,
    roster: Rc<RefCell<Vec<Uid>>>,
    data: RefCell<GrowVec<T>>,
    /// Fill values computed during grow staging, consumed by the commit.
    staged: RefCell<Vec<T>>,
}

impl<T: Clone + Default> ColumnCore<T> {
    pub(crate) fn new(
        name: String,
        lanes: usize,
        fill: Fill<T>,
        stream: StreamRng,
        index: Rc<RefCell<UidMap>>,
        roster: Rc<RefCell<Vec<Uid>>>,
    ) -> Self {
        ColumnCore {
            name,
            lanes,
            fill,
            stream,
            index,
            roster,
            data: RefCell::new(GrowVec::new(lanes)),
            staged: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn lanes(&self) -> usize {
        self.lanes
    }

    pub(crate) fn len(&self) -> usize {
        self.data.borrow().len()
    }

    fn locked(&self, during: &str) -> CohortError {
        CohortError::WriteProtocolViolation(format!(
            "column '{}' is already in use during {during}",
            self.name
        ))
    }

    fn data(&self) -> CohortResult<Ref<'_, GrowVec<T>>> {
        self.data.try_borrow().map_err(|_| self.locked("a structural operation"))
    }

    fn data_mut(&self) -> CohortResult<RefMut<'_, GrowVec<T>>> {
        self.data.try_borrow_mut().map_err(|_| self.locked("another access"))
    }

    fn check_lane(&self, lane: usize) -> CohortResult<()> {
        if lane < self.lanes {
            Ok(())
        } else {
            Err(CohortError::LaneOutOfBounds { lane, lanes: self.lanes })
        }
    }

    /// Translate one uid to its live position.
    fn pos(&self, uid: Uid) -> CohortResult<usize> {
        self.index
            .try_borrow()
            .map_err(|_| self.locked("a structural operation"))?
            .lookup(uid)
            .ok_or(CohortError::UidNotFound(uid))
    }

    /// Translate a uid list in one map borrow, failing on the first miss.
    fn positions(&self, uids: &[Uid]) -> CohortResult<Vec<usize>> {
        let index = self.index.try_borrow().map_err(|_| self.locked("a structural operation"))?;
        uids.iter()
            .map(|&uid| index.lookup(uid).ok_or(CohortError::UidNotFound(uid)))
            .collect()
    }

    /// Uids at the mask's marked positions, in position order.
    fn mask_uids(&self, mask: &Mask) -> CohortResult<Vec<Uid>> {
        let roster = self.roster.try_borrow().map_err(|_| self.locked("a structural operation"))?;
        if mask.len() != roster.len() {
            return Err(CohortError::DimensionMismatch {
                expected: roster.len(),
                actual: mask.len(),
            });
        }
        Ok(mask.positions().map(|pos| roster[pos]).collect())
    }

    fn all_uids(&self) -> CohortResult<Vec<Uid>> {
        Ok(self
            .roster
            .try_borrow()
            .map_err(|_| self.locked("a structural operation"))?
            .clone())
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub(crate) fn get_at(&self, lane: usize, uid: Uid) -> CohortResult<T> {
        self.check_lane(lane)?;
        let pos = self.pos(uid)?;
        Ok(self.data()?.lane(lane)[pos].clone())
    }

    pub(crate) fn get_many_at(&self, lane: usize, uids: &[Uid]) -> CohortResult<Vec<T>> {
        self.check_lane(lane)?;
        let positions = self.positions(uids)?;
        let data = self.data()?;
        let view = data.lane(lane);
        Ok(positions.iter().map(|&pos| view[pos].clone()).collect())
    }

    pub(crate) fn get_mask_at(&self, lane: usize, mask: &Mask) -> CohortResult<Vec<T>> {
        self.check_lane(lane)?;
        let data = self.data()?;
        if mask.len() != data.len() {
            return Err(CohortError::DimensionMismatch {
                expected: data.len(),
                actual: mask.len(),
            });
        }
        let view = data.lane(lane);
        Ok(mask.positions().map(|pos| view[pos].clone()).collect())
    }

    pub(crate) fn lane_vec(&self, lane: usize) -> CohortResult<Vec<T>> {
        self.check_lane(lane)?;
        Ok(self.data()?.lane(lane).to_vec())
    }

    pub(crate) fn read_at(&self, lane: usize, key: &Key<'_>) -> CohortResult<Selection<T>> {
        match key {
            Key::One(uid) => Ok(Selection::new(vec![*uid], vec![self.get_at(lane, *uid)?])),
            Key::Many(uids) => Ok(Selection::new(uids.to_vec(), self.get_many_at(lane, uids)?)),
            Key::Mask(mask) => {
                Ok(Selection::new(self.mask_uids(mask)?, self.get_mask_at(lane, mask)?))
            }
            Key::All => Ok(Selection::new(self.all_uids()?, self.lane_vec(lane)?)),
            Key::Span { .. } => Err(CohortError::UnsupportedSlice),
        }
    }

    // ── Writes ────────────────────────────────────────────────────────────

    pub(crate) fn set_at(&self, lane: usize, uid: Uid, value: T) -> CohortResult<()> {
        self.check_lane(lane)?;
        let pos = self.pos(uid)?;
        self.data_mut()?.lane_mut(lane)[pos] = value;
        Ok(())
    }

    pub(crate) fn set_many_at(&self, lane: usize, uids: &[Uid], values: &[T]) -> CohortResult<()> {
        self.check_lane(lane)?;
        if values.len() != uids.len() {
            return Err(CohortError::DimensionMismatch {
                expected: uids.len(),
                actual: values.len(),
            });
        }
        // Resolve every uid before the first write so a miss leaves the
        // column untouched.
        let positions = self.positions(uids)?;
        let mut data = self.data_mut()?;
        let view = data.lane_mut(lane);
        for (&pos, value) in positions.iter().zip(values) {
            view[pos] = value.clone();
        }
        Ok(())
    }

    fn broadcast_at(&self, lane: usize, uids: &[Uid], value: T) -> CohortResult<()> {
        self.check_lane(lane)?;
        let positions = self.positions(uids)?;
        let mut data = self.data_mut()?;
        let view = data.lane_mut(lane);
        for &pos in &positions {
            view[pos] = value.clone();
        }
        Ok(())
    }

    pub(crate) fn set_mask_at(&self, lane: usize, mask: &Mask, value: T) -> CohortResult<()> {
        self.check_lane(lane)?;
        let mut data = self.data_mut()?;
        if mask.len() != data.len() {
            return Err(CohortError::DimensionMismatch {
                expected: data.len(),
                actual: mask.len(),
            });
        }
        let view = data.lane_mut(lane);
        for pos in mask.positions() {
            view[pos] = value.clone();
        }
        Ok(())
    }

    fn set_mask_values_at(&self, lane: usize, mask: &Mask, values: &[T]) -> CohortResult<()> {
        self.check_lane(lane)?;
        let mut data = self.data_mut()?;
        if mask.len() != data.len() {
            return Err(CohortError::DimensionMismatch {
                expected: data.len(),
                actual: mask.len(),
            });
        }
        let marked = mask.count();
        if values.len() != marked {
            return Err(CohortError::DimensionMismatch { expected: marked, actual: values.len() });
        }
        let view = data.lane_mut(lane);
        for (pos, value) in mask.positions().zip(values) {
            view[pos] = value.clone();
        }
        Ok(())
    }

    pub(crate) fn fill_lane(&self, lane: usize, value: T) -> CohortResult<()> {
        self.check_lane(lane)?;
        self.data_mut()?.lane_mut(lane).fill(value);
        Ok(())
    }

    fn set_all_at(&self, lane: usize, values: &[T]) -> CohortResult<()> {
        self.check_lane(lane)?;
        let mut data = self.data_mut()?;
        if values.len() != data.len() {
            return Err(CohortError::DimensionMismatch {
                expected: data.len(),
                actual: values.len(),
            });
        }
        data.lane_mut(lane).clone_from_slice(values);
        Ok(())
    }

    pub(crate) fn write_at(&self, lane: usize, key: &Key<'_>, value: Value<'_, T>) -> CohortResult<()> {
        match key {
            Key::One(uid) => match value {
                Value::Scalar(v) => self.set_at(lane, *uid, v),
                Value::Slice(vals) => {
                    if vals.len() != 1 {
                        return Err(CohortError::DimensionMismatch {
                            expected: 1,
                            actual: vals.len(),
                        });
                    }
                    self.set_at(lane, *uid, vals[0].clone())
                }
            },
            Key::Many(uids) => match value {
                Value::Scalar(v) => self.broadcast_at(lane, uids, v),
                Value::Slice(vals) => self.set_many_at(lane, uids, vals),
            },
            Key::Mask(mask) => match value {
                Value::Scalar(v) => self.set_mask_at(lane, mask, v),
                Value::Slice(vals) => self.set_mask_values_at(lane, mask, vals),
            },
            Key::All => match value {
                Value::Scalar(v) => self.fill_lane(lane, v),
                Value::Slice(vals) => self.set_all_at(lane, vals),
            },
            Key::Span { .. } => Err(CohortError::UnsupportedSlice),
        }
    }

    // ── In-place vectorized transforms ────────────────────────────────────

    pub(crate) fn apply_at(&self, lane: usize, f: impl FnMut(&mut T)) -> CohortResult<()> {
        self.check_lane(lane)?;
        self.data_mut()?.lane_mut(lane).iter_mut().for_each(f);
        Ok(())
    }

    pub(crate) fn apply_mask_at(&self, lane: usize, mask: &Mask, mut f: impl FnMut(&mut T)) -> CohortResult<()> {
        self.check_lane(lane)?;
        let mut data = self.data_mut()?;
        if mask.len() != data.len() {
            return Err(CohortError::DimensionMismatch {
                expected: data.len(),
                actual: mask.len(),
            });
        }
        let view = data.lane_mut(lane);
        for pos in mask.positions() {
            f(&mut view[pos]);
        }
        Ok(())
    }

    pub(crate) fn apply_many_at(&self, lane: usize, uids: &[Uid], mut f: impl FnMut(&mut T)) -> CohortResult<()> {
        self.check_lane(lane)?;
        let positions = self.positions(uids)?;
        let mut data = self.data_mut()?;
        let view = data.lane_mut(lane);
        for &pos in &positions {
            f(&mut view[pos]);
        }
        Ok(())
    }

    pub(crate) fn compare(&self, lane: usize, pred: impl Fn(&T) -> bool) -> CohortResult<Mask> {
        self.check_lane(lane)?;
        Ok(self.data()?.lane(lane).iter().map(pred).collect())
    }

    // ── Structural operations (coordinator only) ──────────────────────────
    //
    // Growth is a stage/commit pair so the coordinator can validate every
    // column of a population before any column's logical state changes.

    /// Compute and park the fill values for `uids`, and reserve buffer
    /// capacity for them.  Does not change the logical length.
    pub(crate) fn stage_grow(&self, uids: &[Uid]) -> CohortResult<()> {
        if uids.is_empty() {
            return Ok(());
        }
        let mut staged = self.staged.try_borrow_mut().map_err(|_| self.locked("growth"))?;
        staged.clear();
        staged.reserve(uids.len() * self.lanes);
        for lane in 0..self.lanes {
            let values = self.fill.values(uids, self.stream.substream(lane as u64))?;
            staged.extend(values);
        }
        self.data.try_borrow_mut().map_err(|_| self.locked("growth"))?.reserve_for(uids.len())?;
        Ok(())
    }

    /// Append the staged values.  Infallible by construction: capacity was
    /// reserved and exclusivity verified during staging.
    pub(crate) fn commit_grow(&self) {
        let mut staged = self.staged.borrow_mut();
        if !staged.is_empty() {
            self.data.borrow_mut().append(staged.as_slice());
            staged.clear();
        }
    }

    /// Drop staged values after a failed stage pass elsewhere.
    pub(crate) fn abort_grow(&self) {
        if let Ok(mut staged) = self.staged.try_borrow_mut() {
            staged.clear();
        }
    }

    /// Verify no outstanding borrow would make compaction panic.
    pub(crate) fn check_exclusive(&self) -> CohortResult<()> {
        self.data.try_borrow_mut().map(|_| ()).map_err(|_| self.locked("compaction"))
    }

    /// Keep only `keep` (ascending current positions), packed to the front.
    pub(crate) fn compact(&self, keep: &[usize]) {
        self.data.borrow_mut().compact(keep);
    }
}

// ── Scalar column ─────────────────────────────────────────────────────────────

/// A named, typed, 1-D attribute series over one population.
///
/// Handles are `Rc`-shared: the population keeps one for coordinated
/// growth/compaction, and any number of modules keep others for reads and
/// element writes.  There is no public way to resize a column.
pub struct Column<T> {
    core: ColumnCore<T>,
}

impl<T: Clone + Default> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.core.name())
            .field("lanes", &self.core.lanes())
            .finish()
    }
}

impl<T: Clone + Default + 'static> Column<T> {
    pub(crate) fn new(core: ColumnCore<T>) -> Self {
        debug_assert_eq!(core.lanes(), 1);
        Column { core }
    }

    pub(crate) fn core(&self) -> &ColumnCore<T> {
        &self.core
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Live length; always equals the population's count.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Value for one uid.
    pub fn get(&self, uid: Uid) -> CohortResult<T> {
        self.core.get_at(0, uid)
    }

    /// Values for a uid list, in the order given.
    pub fn get_many(&self, uids: &[Uid]) -> CohortResult<Vec<T>> {
        self.core.get_many_at(0, uids)
    }

    /// Values at the mask's marked positions.
    pub fn get_mask(&self, mask: &Mask) -> CohortResult<Vec<T>> {
        self.core.get_mask_at(0, mask)
    }

    /// Copy of the whole live view.
    pub fn to_vec(&self) -> CohortResult<Vec<T>> {
        self.core.lane_vec(0)
    }

    /// Keyed read returning values with their uids.
    pub fn read(&self, key: &Key<'_>) -> CohortResult<Selection<T>> {
        self.core.read_at(0, key)
    }

    // ── Writes ────────────────────────────────────────────────────────────

    pub fn set(&self, uid: Uid, value: T) -> CohortResult<()> {
        self.core.set_at(0, uid, value)
    }

    /// One value per uid; lengths must match exactly.
    pub fn set_many(&self, uids: &[Uid], values: &[T]) -> CohortResult<()> {
        self.core.set_many_at(0, uids, values)
    }

    /// Broadcast one value to every marked position.
    pub fn set_mask(&self, mask: &Mask, value: T) -> CohortResult<()> {
        self.core.set_mask_at(0, mask, value)
    }

    /// Broadcast one value to the whole live view.
    pub fn fill(&self, value: T) -> CohortResult<()> {
        self.core.fill_lane(0, value)
    }

    /// Keyed write with scalar-broadcast or exact-length array semantics.
    pub fn write(&self, key: &Key<'_>, value: Value<'_, T>) -> CohortResult<()> {
        self.core.write_at(0, key, value)
    }

    // ── Vectorized transforms ─────────────────────────────────────────────

    /// Transform every live element in place.
    pub fn apply(&self, f: impl FnMut(&mut T)) -> CohortResult<()> {
        self.core.apply_at(0, f)
    }

    /// Transform the elements at the mask's marked positions in place.
    pub fn apply_mask(&self, mask: &Mask, f: impl FnMut(&mut T)) -> CohortResult<()> {
        self.core.apply_mask_at(0, mask, f)
    }

    /// Transform the elements for the given uids in place.
    pub fn apply_many(&self, uids: &[Uid], f: impl FnMut(&mut T)) -> CohortResult<()> {
        self.core.apply_many_at(0, uids, f)
    }

    /// Elementwise combination with another column of the same population.
    pub fn zip_with<U, V>(
        &self,
        other: &Column<U>,
        mut f: impl FnMut(&T, &U) -> V,
    ) -> CohortResult<Vec<V>>
    where
        U: Clone + Default + 'static,
    {
        let a = self.core.data()?;
        let b = other.core.data()?;
        if a.len() != b.len() {
            return Err(CohortError::DimensionMismatch { expected: a.len(), actual: b.len() });
        }
        Ok(a.as_slice().iter().zip(b.as_slice()).map(|(x, y)| f(x, y)).collect())
    }

    /// Position-space mask from an arbitrary predicate on the live view.
    pub fn mask_where(&self, pred: impl Fn(&T) -> bool) -> CohortResult<Mask> {
        self.core.compare(0, pred)
    }
}

// ── Comparisons ───────────────────────────────────────────────────────────────

impl<T: Clone + Default + PartialEq + 'static> Column<T> {
    /// Mask of positions equal to `rhs`.
    pub fn equals(&self, rhs: T) -> CohortResult<Mask> {
        self.core.compare(0, |v| *v == rhs)
    }

    /// Mask of positions not equal to `rhs`.
    pub fn not_equals(&self, rhs: T) -> CohortResult<Mask> {
        self.core.compare(0, |v| *v != rhs)
    }

    /// Number of live elements differing from `T::default()` (for `bool`,
    /// the number of `true`s).
    pub fn count_nonzero(&self) -> CohortResult<usize> {
        let zero = T::default();
        let data = self.core.data()?;
        Ok(data.as_slice().iter().filter(|v| **v != zero).count())
    }

    /// `true` if any live element differs from `T::default()`.
    pub fn any(&self) -> CohortResult<bool> {
        let zero = T::default();
        let data = self.core.data()?;
        Ok(data.as_slice().iter().any(|v| *v != zero))
    }

    /// `true` if every live element differs from `T::default()`.
    pub fn all(&self) -> CohortResult<bool> {
        let zero = T::default();
        let data = self.core.data()?;
        Ok(data.as_slice().iter().all(|v| *v != zero))
    }
}

impl<T: Clone + Default + PartialOrd + 'static> Column<T> {
    pub fn lt(&self, rhs: T) -> CohortResult<Mask> {
        self.core.compare(0, |v| *v < rhs)
    }

    pub fn le(&self, rhs: T) -> CohortResult<Mask> {
        self.core.compare(0, |v| *v <= rhs)
    }

    pub fn gt(&self, rhs: T) -> CohortResult<Mask> {
        self.core.compare(0, |v| *v > rhs)
    }

    pub fn ge(&self, rhs: T) -> CohortResult<Mask> {
        self.core.compare(0, |v| *v >= rhs)
    }
}

// ── Reductions ────────────────────────────────────────────────────────────────

/// Numeric element conversion used by the reductions.
pub trait Numeric: Copy {
    fn to_f64(self) -> f64;
}

macro_rules! impl_numeric {
    ($($t:ty),* $(,)?) => {
        $(impl Numeric for $t {
            #[inline(always)]
            fn to_f64(self) -> f64 {
                self as f64
            }
        })*
    };
}

impl_numeric!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

impl<T: Clone + Default + Numeric + Sum<T> + 'static> Column<T> {
    /// Sum of the live view.
    pub fn sum(&self) -> CohortResult<T> {
        let data = self.core.data()?;
        Ok(data.as_slice().iter().copied().sum())
    }

    /// Mean of the live view as `f64`; `NaN` when the population is empty.
    pub fn mean(&self) -> CohortResult<f64> {
        let data = self.core.data()?;
        let view = data.as_slice();
        if view.is_empty() {
            return Ok(f64::NAN);
        }
        let total: f64 = view.iter().map(|v| v.to_f64()).sum();
        Ok(total / view.len() as f64)
    }
}
