//! Read/write selectors for column access.
//!
//! A [`Key`] names the agents an operation targets; a [`Value`] carries the
//! payload of a write.  Uids and uid lists are translated through the
//! population's uid map; masks address position space directly; `All` is the
//! one legal slice.
//!
//! `Span` is deliberately representable: uid order and position order diverge
//! once agents have been removed, so a bounded uid range is ambiguous.  Any
//! operation given a `Span` fails with `UnsupportedSlice` instead of guessing
//! — callers porting position-sliced code get a loud error, not silently
//! wrong rows.

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use cohort_core::Uid;

use crate::mask::Mask;

/// Which agents an operation targets.
#[derive(Debug)]
pub enum Key<'a> {
    /// A single agent by uid.
    One(Uid),
    /// An explicit list of uids; every one must be live.
    Many(&'a [Uid]),
    /// A position-space mask; its length must equal the live count.
    Mask(&'a Mask),
    /// The whole live view — the only legal slice.
    All,
    /// A bounded uid range.  Always rejected with `UnsupportedSlice`.
    Span { start: Option<Uid>, end: Option<Uid> },
}

impl From<Uid> for Key<'static> {
    fn from(uid: Uid) -> Self {
        Key::One(uid)
    }
}

impl<'a> From<&'a [Uid]> for Key<'a> {
    fn from(uids: &'a [Uid]) -> Self {
        Key::Many(uids)
    }
}

impl<'a> From<&'a Vec<Uid>> for Key<'a> {
    fn from(uids: &'a Vec<Uid>) -> Self {
        Key::Many(uids)
    }
}

impl<'a> From<&'a Mask> for Key<'a> {
    fn from(mask: &'a Mask) -> Self {
        Key::Mask(mask)
    }
}

impl From<RangeFull> for Key<'static> {
    fn from(_: RangeFull) -> Self {
        Key::All
    }
}

impl From<Range<Uid>> for Key<'static> {
    fn from(range: Range<Uid>) -> Self {
        Key::Span { start: Some(range.start), end: Some(range.end) }
    }
}

impl From<RangeTo<Uid>> for Key<'static> {
    fn from(range: RangeTo<Uid>) -> Self {
        Key::Span { start: None, end: Some(range.end) }
    }
}

impl From<RangeFrom<Uid>> for Key<'static> {
    fn from(range: RangeFrom<Uid>) -> Self {
        Key::Span { start: Some(range.start), end: None }
    }
}

/// The payload of a write.
#[derive(Debug)]
pub enum Value<'a, T> {
    /// Broadcast to every targeted position.
    Scalar(T),
    /// One value per targeted position; length must match exactly.
    Slice(&'a [T]),
}

impl<T> From<T> for Value<'static, T> {
    fn from(v: T) -> Self {
        Value::Scalar(v)
    }
}

impl<'a, T> From<&'a [T]> for Value<'a, T> {
    fn from(vals: &'a [T]) -> Self {
        Value::Slice(vals)
    }
}
