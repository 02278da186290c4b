//! Dense uid → position translation.
//!
//! The map is a flat array indexed by uid.  Uids are issued monotonically and
//! never reused, so the array only ever grows; a removed agent leaves its slot
//! behind holding [`NO_POSITION`].  Lookup is a single bounds-checked array
//! read.
//!
//! [`rebuild`](UidMap::rebuild) must be called with the same survivor
//! ordering used to compact the columns, or the map and the column contents
//! silently diverge.  The `Population` coordinator is the only caller and
//! performs both from one survivor list.

use cohort_core::Uid;

/// Sentinel stored in a slot whose uid has no live position (never issued
/// into this map, or removed).  Positions are array indices and can never
/// reach `u32::MAX`, because uid issuance stops one short of it.
pub const NO_POSITION: u32 = u32::MAX;

/// Flat uid → position map for one population.
#[derive(Default)]
pub struct UidMap {
    slots: Vec<u32>,
}

impl UidMap {
    pub fn new() -> Self {
        UidMap { slots: Vec::new() }
    }

    /// One past the highest uid ever recorded (the length of the slot array).
    pub fn span(&self) -> usize {
        self.slots.len()
    }

    /// Current position of `uid`, or `None` if the uid has no live position.
    #[inline]
    pub fn lookup(&self, uid: Uid) -> Option<usize> {
        match self.slots.get(uid.index()) {
            Some(&pos) if pos != NO_POSITION => Some(pos as usize),
            _ => None,
        }
    }

    /// Record `uids[i] -> positions[i]`, growing the slot array to cover the
    /// largest new uid.  Existing entries are preserved.
    pub fn extend(&mut self, uids: &[Uid], positions: &[usize]) {
        debug_assert_eq!(uids.len(), positions.len());
        if let Some(max) = uids.iter().max() {
            let needed = max.index() + 1;
            if needed > self.slots.len() {
                self.slots.resize(needed, NO_POSITION);
            }
        }
        for (&uid, &pos) in uids.iter().zip(positions) {
            debug_assert!(pos < NO_POSITION as usize);
            self.slots[uid.index()] = pos as u32;
        }
    }

    /// Reset every slot to [`NO_POSITION`], then map `survivors[i] -> i` in
    /// the order given.
    pub fn rebuild(&mut self, survivors: &[Uid]) {
        self.slots.fill(NO_POSITION);
        for (pos, &uid) in survivors.iter().enumerate() {
            self.slots[uid.index()] = pos as u32;
        }
    }
}
