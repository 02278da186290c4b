//! Fill policies: values for newly created agents.
//!
//! Every column carries a `Fill<T>` that produces the initial value for each
//! position created by growth or registration backfill, so new storage is
//! never exposed holding stale memory.

use cohort_core::{CohortError, CohortResult, StreamRng, Uid};
use rand::distributions::Distribution;
use rand::rngs::SmallRng;

/// How a column values its newly created agents.
pub enum Fill<T> {
    /// Every new agent gets a copy of this value.
    Const(T),

    /// Called with the number of new agents; must return exactly that many
    /// values (checked, `DimensionMismatch` otherwise).
    Func(Box<dyn Fn(usize) -> Vec<T>>),

    /// Sampled once per new agent from a generator keyed by that agent's uid,
    /// so draws are reproducible regardless of when the agent is created or
    /// how the population was compacted beforehand.
    Dist(Box<dyn Fn(&mut SmallRng) -> T>),
}

impl<T: Clone> Fill<T> {
    /// A value-generating function of count.
    pub fn func(f: impl Fn(usize) -> Vec<T> + 'static) -> Self {
        Fill::Func(Box::new(f))
    }

    /// A `rand` distribution sampled per uid.
    pub fn dist<D>(dist: D) -> Self
    where
        D: Distribution<T> + 'static,
    {
        Fill::Dist(Box::new(move |rng| dist.sample(rng)))
    }

    /// An arbitrary sampler closure, for draws no stock distribution covers.
    pub fn sampler(f: impl Fn(&mut SmallRng) -> T + 'static) -> Self {
        Fill::Dist(Box::new(f))
    }

    /// Produce the values for `uids`, drawing per-uid generators from
    /// `stream` when the policy is a sampler.
    pub(crate) fn values(&self, uids: &[Uid], stream: StreamRng) -> CohortResult<Vec<T>> {
        let n = uids.len();
        match self {
            Fill::Const(v) => Ok(vec![v.clone(); n]),
            Fill::Func(f) => {
                let vals = f(n);
                if vals.len() != n {
                    return Err(CohortError::DimensionMismatch { expected: n, actual: vals.len() });
                }
                Ok(vals)
            }
            Fill::Dist(sample) => Ok(uids.iter().map(|&uid| sample(&mut stream.for_uid(uid))).collect()),
        }
    }
}

impl<T: Clone + Default> Default for Fill<T> {
    fn default() -> Self {
        Fill::Const(T::default())
    }
}
