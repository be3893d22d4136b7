//! Self-balancing ordered, interval and partial-order containers.
//!
//! A red-black ordered tree (`rbtree`) sits underneath three derived
//! components that each override its rotation/splice hooks to keep their
//! own auxiliary per-node state in step with structural changes:
//!
//! - `interval` — a stabbing/overlap/containment interval tree.
//! - `disjoint` — an incremental pairwise-disjoint interval tracker, with
//!   an optional canonical disjoint-cover mode.
//! - `poset` — a lazily-sorted container with a registry of absolute,
//!   relative, element-position, range and complement position
//!   requirements, incrementally renotified as elements move.
//!
//! `idset` and `heap` are the small collaborator containers the above lean
//! on (a small-set-optimized id container and a positional min-max heap).
//! `error` holds the crate's small typed-error surface; nearly
//! every ill-typed input is a silent no-op rather than an `Err`.

pub mod disjoint;
pub mod error;
pub mod heap;
pub mod idset;
pub mod interval;
pub mod poset;
pub mod rbtree;
