//! Unit tests for cohort-core.

#[cfg(test)]
mod uid {
    use crate::Uid;

    #[test]
    fn ordering_follows_raw_value() {
        assert!(Uid(0) < Uid(1));
        assert!(Uid(41) < Uid(42));
    }

    #[test]
    fn index_round_trip() {
        let uid = Uid(7);
        assert_eq!(uid.index(), 7);
        assert_eq!(usize::from(uid), 7);
        assert_eq!(Uid::try_from(7usize).unwrap(), uid);
    }

    #[test]
    fn try_from_oversized_usize_fails() {
        assert!(Uid::try_from(usize::MAX).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Uid(3).to_string(), "Uid(3)");
    }
}

#[cfg(test)]
mod streams {
    use rand::Rng;

    use crate::{StreamRng, Uid};

    #[test]
    fn per_uid_determinism() {
        let a = StreamRng::new(999);
        let b = StreamRng::new(999);
        for raw in 0..10u32 {
            let x: f64 = a.for_uid(Uid(raw)).gen_range(0.0..1.0);
            let y: f64 = b.for_uid(Uid(raw)).gen_range(0.0..1.0);
            assert_eq!(x, y, "uid {raw} stream should be deterministic");
        }
    }

    #[test]
    fn different_seeds_differ() {
        let x: u64 = StreamRng::new(1).for_uid(Uid(0)).gen_range(0..u64::MAX);
        let y: u64 = StreamRng::new(2).for_uid(Uid(0)).gen_range(0..u64::MAX);
        assert_ne!(x, y);
    }

    #[test]
    fn adjacent_uids_differ() {
        let stream = StreamRng::new(0);
        let x: u64 = stream.for_uid(Uid(0)).gen_range(0..u64::MAX);
        let y: u64 = stream.for_uid(Uid(1)).gen_range(0..u64::MAX);
        assert_ne!(x, y);
    }

    #[test]
    fn labelled_streams_are_stable_and_distinct() {
        let root = StreamRng::new(42);
        assert_eq!(root.derive("age").seed(), root.derive("age").seed());
        assert_ne!(root.derive("age").seed(), root.derive("weight").seed());
        assert_ne!(root.derive("age").seed(), root.seed());
    }

    #[test]
    fn substreams_are_distinct_per_index() {
        let col = StreamRng::new(42).derive("immunity");
        assert_ne!(col.substream(0).seed(), col.substream(1).seed());
        assert_ne!(col.substream(0).seed(), col.seed());
    }
}

#[cfg(test)]
mod errors {
    use crate::{CohortError, Uid};

    #[test]
    fn messages_name_the_offender() {
        let err = CohortError::UidNotFound(Uid(12));
        assert!(err.to_string().contains("Uid(12)"));

        let err = CohortError::ColumnNotFound("infected".into());
        assert!(err.to_string().contains("infected"));

        let err = CohortError::DimensionMismatch { expected: 5, actual: 3 };
        assert!(err.to_string().contains('5') && err.to_string().contains('3'));
    }
}
