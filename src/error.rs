//! Crate-wide error surface.
//!
//! Almost every ill-typed input this crate's trees encounter is a silent
//! no-op rather than a typed error: empty intervals, removal of an absent
//! id, a requirement whose offset exceeds the set size (it becomes
//! virtual), a requirement whose anchor is absent (it suspends). None of
//! those return [`Error`]. The only caller-detectable misuse this crate
//! surfaces as a typed error is reusing an id that is already registered
//! in an [`crate::interval::IntervalTree`] for a *different* interval —
//! silently accepting it would corrupt endpoint refcounts rather than
//! merely return a stale answer. [`crate::disjoint::PairwiseDisjointTracker`]
//! does not need this check: its mutation API takes the interval's bounds
//! on every call (`add_interval`/`remove_interval`/`modify_interval`), so
//! re-adding an id under new bounds is an ordinary modify, not a
//! conflicting re-registration.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  /// An id already registered with different bounds was inserted again
  /// without an intervening removal.
  #[error("id already registered with different interval bounds")]
  IdAlreadyRegistered,
}

pub type Result<T> = std::result::Result<T, Error>;
