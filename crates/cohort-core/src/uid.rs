//! The permanent agent identifier.
//!
//! A `Uid` names an agent for its whole lifetime.  Uids are issued
//! monotonically starting at 0 and are never reused after the agent is
//! removed, so a uid is a stable handle across compactions.  The agent's
//! *position* in backing storage is a separate, transient `usize` resolved
//! through the population's uid map.
//!
//! The inner integer is `pub` to allow cheap construction in tests and
//! loaders, but callers should prefer [`Uid::index`] when a `usize` is
//! needed.

use std::fmt;

/// Permanent agent identifier.  Max ~4.3 billion agents per population.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Uid(pub u32);

impl Uid {
    /// Cast to `usize` for direct use as an array index.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.0)
    }
}

impl From<Uid> for usize {
    #[inline(always)]
    fn from(uid: Uid) -> usize {
        uid.0 as usize
    }
}

impl From<u32> for Uid {
    #[inline(always)]
    fn from(raw: u32) -> Uid {
        Uid(raw)
    }
}

impl TryFrom<usize> for Uid {
    type Error = std::num::TryFromIntError;
    fn try_from(n: usize) -> Result<Uid, Self::Error> {
        u32::try_from(n).map(Uid)
    }
}
