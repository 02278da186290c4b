//! Owned read results that keep their identity context.
//!
//! Reading a column by key yields a `Selection`: the values *and* the uids
//! they belong to, in the same order.  That context is what makes chained
//! filtering possible — narrow a selection by a further uid list, or ask for
//! the uids whose values satisfy a predicate, without ever touching raw
//! positions.

use std::cell::OnceCell;

use cohort_core::{CohortError, CohortResult, Uid};
use rustc_hash::FxHashMap;

/// Values paired with the uids they were read for.
#[derive(Debug)]
pub struct Selection<T> {
    uids: Vec<Uid>,
    values: Vec<T>,
    /// Lazy uid → offset index, built on the first keyed lookup.
    offsets: OnceCell<FxHashMap<Uid, usize>>,
}

impl<T: Clone> Selection<T> {
    pub(crate) fn new(uids: Vec<Uid>, values: Vec<T>) -> Self {
        debug_assert_eq!(uids.len(), values.len());
        Selection { uids, values, offsets: OnceCell::new() }
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    pub fn uids(&self) -> &[Uid] {
        &self.uids
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    pub fn into_parts(self) -> (Vec<Uid>, Vec<T>) {
        (self.uids, self.values)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uid, &T)> + '_ {
        self.uids.iter().copied().zip(self.values.iter())
    }

    fn offsets(&self) -> &FxHashMap<Uid, usize> {
        self.offsets.get_or_init(|| {
            self.uids
                .iter()
                .enumerate()
                .map(|(offset, &uid)| (uid, offset))
                .collect()
        })
    }

    /// Value for `uid` within this selection.
    pub fn get(&self, uid: Uid) -> CohortResult<T> {
        self.offsets()
            .get(&uid)
            .map(|&offset| self.values[offset].clone())
            .ok_or(CohortError::UidNotFound(uid))
    }

    /// Uids whose value satisfies `pred`, in selection order.
    pub fn uids_where(&self, pred: impl Fn(&T) -> bool) -> Vec<Uid> {
        self.uids
            .iter()
            .zip(&self.values)
            .filter_map(|(&uid, v)| pred(v).then_some(uid))
            .collect()
    }

    /// Narrow to the given uids, failing fast on any uid not present here.
    pub fn select_many(&self, uids: &[Uid]) -> CohortResult<Selection<T>> {
        let values = uids
            .iter()
            .map(|&uid| self.get(uid))
            .collect::<CohortResult<Vec<T>>>()?;
        Ok(Selection::new(uids.to_vec(), values))
    }
}
