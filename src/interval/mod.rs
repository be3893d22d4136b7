//! Self-balancing interval tree.
//!
//! Built on top of [`crate::rbtree::RbTree`]: the underlying ordered tree is
//! keyed on every distinct endpoint value ever inserted, and each node
//! additionally carries the id sets that record which stored intervals'
//! *open span* (the gap strictly between this node's key and its nearest
//! neighbouring keys) is fully covered by them. Closed endpoints are tracked
//! separately, keyed on the node whose key equals that endpoint, since they
//! describe a single point rather than a span.
//!
//! An interval is registered on the smallest number of nodes whose spans
//! collectively and exactly cover it — usually one, occasionally two when it
//! straddles an ancestor's key. Rotations change which node's span
//! corresponds to which part of the domain, and a span registered two
//! levels away from a rotation's pivot can need moving just as much as one
//! registered directly on it — incrementally patching only the rotated
//! pair risks leaving a stale registration behind. Closed-endpoint sets
//! (`low_end`/`high_end`/`degenerate`) are keyed on a literal key match and
//! are untouched by rotations, so those stay incremental; the span-based
//! sets (`end`/`dont_end` and the leaf-slot mirrors) are instead rebuilt
//! from the master interval record after every structural change. This
//! costs a full walk per insert/remove instead of patching just the
//! rotated nodes, in exchange for never needing to reason about whatever
//! state a stale registration was left in.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::idset::IdSet;
use crate::rbtree::{NodeId, NoHooks, RbTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval<K> {
  lo: K,
  hi: K,
  open_lo: bool,
  open_hi: bool,
}

impl<K: Ord + Copy> Interval<K> {
  fn is_degenerate(&self) -> bool {
    self.lo == self.hi
  }

  fn is_empty(&self) -> bool {
    match self.lo.cmp(&self.hi) {
      std::cmp::Ordering::Greater => true,
      std::cmp::Ordering::Equal => self.open_lo || self.open_hi,
      std::cmp::Ordering::Less => false,
    }
  }
}

fn satisfies_lower<K: Ord>(x: &K, lo: &K, open_lo: bool) -> bool {
  if open_lo {
    x > lo
  } else {
    x >= lo
  }
}

fn satisfies_upper<K: Ord>(x: &K, hi: &K, open_hi: bool) -> bool {
  if open_hi {
    x < hi
  } else {
    x <= hi
  }
}

/// `true` iff `a`'s upper bound (closed unless `a_open`) fits inside a
/// bound of `b` closed unless `b_open`, at the same value.
fn upper_within<K: Ord>(a: &K, a_closed: bool, b: &K, b_closed: bool) -> bool {
  match a.cmp(b) {
    std::cmp::Ordering::Less => true,
    std::cmp::Ordering::Greater => false,
    std::cmp::Ordering::Equal => !a_closed || b_closed,
  }
}

fn lower_within<K: Ord>(a: &K, a_closed: bool, b: &K, b_closed: bool) -> bool {
  match a.cmp(b) {
    std::cmp::Ordering::Greater => true,
    std::cmp::Ordering::Less => false,
    std::cmp::Ordering::Equal => !a_closed || b_closed,
  }
}

fn contained_in<K: Ord>(a: &Interval<K>, lo: &K, open_lo: bool, hi: &K, open_hi: bool) -> bool {
  lower_within(&a.lo, !a.open_lo, lo, !open_lo) && upper_within(&a.hi, !a.open_hi, hi, !open_hi)
}

/// A point strictly or non-strictly inside `[lo, hi)` per the supplied
/// openness, used for degenerate-point and closed-endpoint range checks.
fn point_in_range<K: Ord>(k: &K, lo: &K, hi: &K, open_lo: bool, open_hi: bool) -> bool {
  satisfies_lower(k, lo, open_lo) && satisfies_upper(k, hi, open_hi)
}

/// Per-node id sets. `end`/`dont_end` record span
/// coverage; `low_end`/`high_end`/`degenerate` record closed endpoints and
/// degenerate (single-point) intervals anchored exactly at this key. The
/// four leaf-slot sets mirror `end`/`dont_end` for the (possibly absent)
/// left and right children, since a leaf slot can itself be a maximal span.
#[derive(Debug, Default)]
pub struct IntervalExt<Id> {
  end: IdSet<Id>,
  dont_end: IdSet<Id>,
  low_end: IdSet<Id>,
  high_end: IdSet<Id>,
  degenerate: IdSet<Id>,
  left_leaf_end: IdSet<Id>,
  left_leaf_dont_end: IdSet<Id>,
  right_leaf_end: IdSet<Id>,
  right_leaf_dont_end: IdSet<Id>,
}

impl<Id> IntervalExt<Id> {
  fn is_empty(&self) -> bool
  where
    Id: Copy + Eq + Hash,
  {
    self.end.is_empty()
      && self.dont_end.is_empty()
      && self.low_end.is_empty()
      && self.high_end.is_empty()
      && self.degenerate.is_empty()
      && self.left_leaf_end.is_empty()
      && self.left_leaf_dont_end.is_empty()
      && self.right_leaf_end.is_empty()
      && self.right_leaf_dont_end.is_empty()
  }
}

/// A self-balancing interval tree over keys `K`, storing caller-supplied
/// interval identifiers `Id`.
///
/// `Id` is reused as-is by the caller (typically a small integer or a
/// `Uuid`); this tree does not generate ids. Re-registering an id that is
/// already present under the same `(lo, hi)` bounds is idempotent; using the
/// same id for two genuinely different intervals without removing the first
/// is a caller error and corrupts lookups (spec's silent-no-op error model
/// stops at structural misuse, not semantic misuse like this).
pub struct IntervalTree<K, Id> {
  base: RbTree<K, IntervalExt<Id>, NoHooks>,
  intervals: HashMap<Id, Interval<K>>,
  /// Intervals whose bounds exactly match the declared domain are kept out
  /// of the tree entirely and answered from here (spec's "entire domain"
  /// carve-out). `None` when the tree has no declared domain, in which case
  /// this path is never taken.
  domain: Option<(K, K)>,
  whole_domain: IdSet<Id>,
}

impl<K, Id> Default for IntervalTree<K, Id>
where
  K: Ord + Copy,
  Id: Copy + Eq + Hash,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<K, Id> IntervalTree<K, Id>
where
  K: Ord + Copy,
  Id: Copy + Eq + Hash,
{
  pub fn new() -> Self {
    IntervalTree {
      base: RbTree::new(),
      intervals: HashMap::new(),
      domain: None,
      whole_domain: IdSet::new(),
    }
  }

  /// Like [`new`](Self::new), but declares `[lo, hi]` (closed both ends) as
  /// the full key domain: intervals spanning it exactly are stored only in
  /// a side set rather than in the tree.
  pub fn with_domain(lo: K, hi: K) -> Self {
    IntervalTree {
      base: RbTree::new(),
      intervals: HashMap::new(),
      domain: Some((lo, hi)),
      whole_domain: IdSet::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.intervals.len()
  }

  pub fn is_empty(&self) -> bool {
    self.intervals.is_empty()
  }

  fn is_whole_domain(&self, iv: &Interval<K>) -> bool {
    match self.domain {
      Some((dlo, dhi)) => iv.lo == dlo && !iv.open_lo && iv.hi == dhi && !iv.open_hi,
      None => false,
    }
  }

  /// Register `id` as covering `[lo, hi]`/`(lo, hi)`/etc per `open_lo`,
  /// `open_hi`. A no-op if the resulting interval is empty (e.g. `lo == hi`
  /// with either bound open). Re-inserting the same `id` with the same
  /// bounds is a no-op; re-inserting it with different bounds without an
  /// intervening [`remove`](Self::remove) is rejected with
  /// [`Error::IdAlreadyRegistered`] rather than silently corrupting the
  /// endpoint refcounts.
  pub fn insert(&mut self, id: Id, lo: K, hi: K, open_lo: bool, open_hi: bool) -> Result<()> {
    let iv = Interval { lo, hi, open_lo, open_hi };
    if iv.is_empty() {
      return Ok(());
    }
    if let Some(existing) = self.intervals.get(&id) {
      if *existing != iv {
        return Err(Error::IdAlreadyRegistered);
      }
      return Ok(());
    }
    self.intervals.insert(id, iv);

    if self.is_whole_domain(&iv) {
      self.whole_domain.insert(id);
      return Ok(());
    }

    if iv.is_degenerate() {
      let n = self.base.insert_key_with(lo, IntervalExt::default);
      self.base.ext_mut(n).degenerate.insert(id);
      return Ok(());
    }

    if !open_lo {
      let n = self.base.insert_key_with(lo, IntervalExt::default);
      self.base.ext_mut(n).low_end.insert(id);
    }
    if !open_hi {
      let n = self.base.insert_key_with(hi, IntervalExt::default);
      self.base.ext_mut(n).high_end.insert(id);
    }

    self.base.insert_key_with(lo, IntervalExt::default);
    self.base.insert_key_with(hi, IntervalExt::default);
    self.rebuild_spans();
    Ok(())
  }

  /// Register `id` as covering the single closed point `x` — shorthand for
  /// `insert(id, x, x, false, false)`.
  pub fn insert_point(&mut self, id: Id, x: K) -> Result<()> {
    self.insert(id, x, x, false, false)
  }

  /// Remove a point registered with [`insert_point`](Self::insert_point).
  pub fn remove_point(&mut self, id: Id, x: K) {
    self.remove(id, x, x, false, false);
  }

  /// Move-construct from a [`DegenerateIntervalTree`] — a point-only
  /// variant holding the same kind of id at every stored key — by
  /// re-inserting each of its points as a degenerate interval. The source is
  /// consumed; the common case is a caller that started tracking point
  /// events before it had any genuine ranges to store and wants to upgrade
  /// without replaying every insertion by hand.
  pub fn import_from_degenerate(degenerate: DegenerateIntervalTree<K, Id>) -> Self {
    let mut tree = IntervalTree::new();
    for (id, x) in degenerate.into_points() {
      tree.insert_point(id, x).expect("degenerate source has no duplicate ids with conflicting bounds");
    }
    tree
  }

  /// Clear and re-derive every span-coverage id set (`end`/`dont_end` and
  /// the four leaf-slot mirrors) from `self.intervals`. A rotation can move
  /// a span onto a node nowhere near the one the triggering insert/remove's
  /// own walk visited, so a single call's own registration/deregistration
  /// can't be patched incrementally without risking a stale entry
  /// somewhere else in the tree; re-deriving the whole set from the master
  /// interval record after every structural change sidesteps that instead
  /// of tracking rotations individually. `low_end`/`high_end`/`degenerate`
  /// are untouched here — they're keyed by literal value, not by span, so a
  /// rotation never invalidates them.
  fn rebuild_spans(&mut self) {
    let nodes: Vec<NodeId> = self.base.iter_ids().collect();
    for n in nodes {
      let ext = self.base.ext_mut(n);
      ext.end.clear();
      ext.dont_end.clear();
      ext.left_leaf_end.clear();
      ext.left_leaf_dont_end.clear();
      ext.right_leaf_end.clear();
      ext.right_leaf_dont_end.clear();
    }
    let root = self.base.root();
    let items: Vec<(Id, Interval<K>)> = self.intervals.iter().map(|(id, iv)| (*id, *iv)).collect();
    for (id, iv) in items {
      if self.is_whole_domain(&iv) || iv.is_degenerate() {
        continue;
      }
      self.register_span(root, (None, None), id, &iv);
    }
  }

  /// Recursive span-registration walk. `domain` is the
  /// open interval this node's span covers, inherited from the path walked
  /// to reach it.
  fn register_span(&mut self, node: Option<NodeId>, domain: (Option<K>, Option<K>), id: Id, iv: &Interval<K>) {
    let Some(n) = node else { return };
    let k = *self.base.key(n);
    let contained = match domain {
      (Some(a), Some(b)) => a >= iv.lo && b <= iv.hi,
      (Some(a), None) => a >= iv.lo,
      (None, Some(b)) => b <= iv.hi,
      (None, None) => false,
    };
    if contained {
      if domain.1 == Some(iv.hi) {
        self.base.ext_mut(n).end.insert(id);
      } else {
        self.base.ext_mut(n).dont_end.insert(id);
      }
      return;
    }
    if iv.lo < k {
      match self.base.left(n) {
        Some(l) => self.register_span(Some(l), (domain.0, Some(k)), id, iv),
        None => {
          if domain.0.is_none_or(|a| a >= iv.lo) {
            if Some(k) == Some(iv.hi) {
              self.base.ext_mut(n).left_leaf_end.insert(id);
            } else {
              self.base.ext_mut(n).left_leaf_dont_end.insert(id);
            }
          }
        }
      }
    }
    if iv.hi > k {
      match self.base.right(n) {
        Some(r) => self.register_span(Some(r), (Some(k), domain.1), id, iv),
        None => {
          if domain.1.is_none_or(|b| b <= iv.hi) {
            if domain.1 == Some(iv.hi) {
              self.base.ext_mut(n).right_leaf_end.insert(id);
            } else {
              self.base.ext_mut(n).right_leaf_dont_end.insert(id);
            }
          }
        }
      }
    }
  }

  /// Remove `id`, previously inserted with exactly these bounds.
  pub fn remove(&mut self, id: Id, lo: K, hi: K, open_lo: bool, open_hi: bool) {
    let iv = Interval { lo, hi, open_lo, open_hi };
    if iv.is_empty() {
      return;
    }
    self.intervals.remove(&id);

    if self.is_whole_domain(&iv) {
      self.whole_domain.remove(&id);
      return;
    }

    if iv.is_degenerate() {
      if let Some(n) = self.base.find(&lo) {
        self.base.ext_mut(n).degenerate.remove(&id);
        self.prune_if_unused(n);
      }
      return;
    }

    if !open_lo {
      if let Some(n) = self.base.find(&lo) {
        self.base.ext_mut(n).low_end.remove(&id);
      }
    }
    if !open_hi {
      if let Some(n) = self.base.find(&hi) {
        self.base.ext_mut(n).high_end.remove(&id);
      }
    }
    self.rebuild_spans();
    if let Some(n) = self.base.find(&lo) {
      self.prune_if_unused(n);
    }
    if let Some(n) = self.base.find(&hi) {
      self.prune_if_unused(n);
    }
  }

  /// A node that carries no id-set entries is only there to mark an
  /// endpoint that nothing references any more; drop it so the tree doesn't
  /// accumulate dead keys.
  fn prune_if_unused(&mut self, n: NodeId) {
    if self.base.ext(n).is_empty() {
      self.base.remove_node(n);
    }
  }

  /// All ids whose interval covers the point `k`.
  pub fn find(&self, k: K) -> Vec<Id> {
    let mut out: Vec<Id> = self.whole_domain.iter().collect();
    let mut cur = self.base.root();
    while let Some(n) = cur {
      let ext = self.base.ext(n);
      out.extend(ext.end.iter());
      out.extend(ext.dont_end.iter());
      let key = *self.base.key(n);
      match k.cmp(&key) {
        std::cmp::Ordering::Equal => {
          out.extend(ext.low_end.iter());
          out.extend(ext.high_end.iter());
          out.extend(ext.degenerate.iter());
          let mut c = self.base.left(n);
          let mut last = None;
          while let Some(cn) = c {
            out.extend(self.base.ext(cn).dont_end.iter());
            last = Some(cn);
            c = self.base.right(cn);
          }
          match last {
            Some(ln) => out.extend(self.base.ext(ln).right_leaf_dont_end.iter()),
            None => out.extend(self.base.ext(n).left_leaf_dont_end.iter()),
          }
          return out;
        }
        std::cmp::Ordering::Less => {
          cur = self.base.left(n);
          if cur.is_none() {
            out.extend(ext.left_leaf_end.iter());
            out.extend(ext.left_leaf_dont_end.iter());
          }
        }
        std::cmp::Ordering::Greater => {
          cur = self.base.right(n);
          if cur.is_none() {
            out.extend(ext.right_leaf_end.iter());
            out.extend(ext.right_leaf_dont_end.iter());
          }
        }
      }
    }
    out
  }

  /// All ids whose interval overlaps `[lo, hi)` per `open_lo`/`open_hi`.
  pub fn find_intersections(&self, lo: K, hi: K, open_lo: bool, open_hi: bool) -> Vec<Id> {
    let mut out: Vec<Id> = self.whole_domain.iter().collect();
    self.collect_intersections(self.base.root(), (None, None), lo, hi, open_lo, open_hi, &mut out);
    out
  }

  fn collect_intersections(
    &self,
    node: Option<NodeId>,
    domain: (Option<K>, Option<K>),
    lo: K,
    hi: K,
    open_lo: bool,
    open_hi: bool,
    out: &mut Vec<Id>,
  ) {
    let Some(n) = node else { return };
    let ext = self.base.ext(n);
    let k = *self.base.key(n);

    out.extend(ext.end.iter());
    if domain.1.is_none_or(|u| u > hi) {
      out.extend(ext.dont_end.iter());
    }
    if !open_lo && k == lo {
      out.extend(ext.low_end.iter());
    }
    if !open_hi && k == hi {
      out.extend(ext.high_end.iter());
    }
    if point_in_range(&k, &lo, &hi, open_lo, open_hi) {
      out.extend(ext.degenerate.iter());
    }

    if lo < k {
      match self.base.left(n) {
        Some(l) => self.collect_intersections(Some(l), (domain.0, Some(k)), lo, hi, open_lo, open_hi, out),
        None => {
          out.extend(ext.left_leaf_end.iter());
          if Some(k) > Some(hi) {
            out.extend(ext.left_leaf_dont_end.iter());
          }
        }
      }
    }
    if k < hi {
      match self.base.right(n) {
        Some(r) => self.collect_intersections(Some(r), (Some(k), domain.1), lo, hi, open_lo, open_hi, out),
        None => {
          out.extend(ext.right_leaf_end.iter());
          if domain.1.is_none_or(|u| u > hi) {
            out.extend(ext.right_leaf_dont_end.iter());
          }
        }
      }
    }
  }

  /// All ids whose interval is fully contained in `[lo, hi)` per
  /// `open_lo`/`open_hi`.
  pub fn find_contained(&self, lo: K, hi: K, open_lo: bool, open_hi: bool) -> Vec<Id> {
    self
      .find_intersections(lo, hi, open_lo, open_hi)
      .into_iter()
      .filter(|id| {
        self
          .lookup(*id)
          .map(|iv| contained_in(iv, &lo, open_lo, &hi, open_hi))
          .unwrap_or(false)
      })
      .collect()
  }

  /// All ids whose interval overlaps `[lo, hi)` and whose upper bound is
  /// itself bounded by `(.., upper)`/`(.., upper]` per `upper_open` (spec
  /// §4.C "findWithUpperBound").
  pub fn find_with_upper_bound(&self, lo: K, hi: K, open_lo: bool, open_hi: bool, upper: K, upper_open: bool) -> Vec<Id> {
    self
      .find_intersections(lo, hi, open_lo, open_hi)
      .into_iter()
      .filter(|id| {
        self
          .lookup(*id)
          .map(|iv| upper_within(&iv.hi, !iv.open_hi, &upper, !upper_open))
          .unwrap_or(false)
      })
      .collect()
  }

  /// Mirror of [`find_with_upper_bound`](Self::find_with_upper_bound),
  /// bounding the lower end instead.
  pub fn find_with_lower_bound(&self, lo: K, hi: K, open_lo: bool, open_hi: bool, lower: K, lower_open: bool) -> Vec<Id> {
    self
      .find_intersections(lo, hi, open_lo, open_hi)
      .into_iter()
      .filter(|id| {
        self
          .lookup(*id)
          .map(|iv| lower_within(&iv.lo, !iv.open_lo, &lower, !lower_open))
          .unwrap_or(false)
      })
      .collect()
  }

  fn lookup(&self, id: Id) -> Option<&Interval<K>> {
    self.intervals.get(&id)
  }

  #[cfg(test)]
  fn debug_assert_invariants(&self) {
    self.base.debug_assert_invariants();
  }
}

/// Point-only companion to [`IntervalTree`]: every stored id covers exactly
/// one key, so there is no span bookkeeping and no closed/open distinction to track, just a
/// plain multimap from key to the ids registered there. Meant as a cheap
/// starting structure for callers that only need point lookups at first and
/// later [`import_from_degenerate`](IntervalTree::import_from_degenerate)
/// into a full interval tree once genuine ranges show up.
#[derive(Debug, Default)]
pub struct DegenerateIntervalTree<K, Id> {
  points: HashMap<Id, K>,
}

impl<K, Id> DegenerateIntervalTree<K, Id>
where
  K: Ord + Copy,
  Id: Copy + Eq + Hash,
{
  pub fn new() -> Self {
    DegenerateIntervalTree { points: HashMap::new() }
  }

  pub fn insert(&mut self, id: Id, x: K) {
    self.points.insert(id, x);
  }

  pub fn remove(&mut self, id: Id) {
    self.points.remove(&id);
  }

  pub fn find(&self, x: K) -> Vec<Id> {
    self.points.iter().filter(|(_, k)| **k == x).map(|(id, _)| *id).collect()
  }

  fn into_points(self) -> Vec<(Id, K)> {
    self.points.into_iter().map(|(id, k)| (id, k)).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn point_query_finds_covering_intervals() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    t.insert(1, 0, 10, false, false).unwrap();
    t.insert(2, 5, 15, false, false).unwrap();
    t.insert(3, 20, 30, false, false).unwrap();
    t.debug_assert_invariants();

    let mut found = t.find(7);
    found.sort();
    assert_eq!(found, vec![1, 2]);
    assert!(t.find(17).is_empty());
    assert_eq!(t.find(25), vec![3]);
  }

  #[test]
  fn point_stabbing_respects_mixed_endpoint_openness() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    t.insert(1, 0, 10, false, false).unwrap(); // X = [0,10]
    t.insert(2, 5, 15, true, true).unwrap(); // Y = (5,15)
    t.insert(3, 10, 10, false, false).unwrap(); // Z = [10,10]

    let mut at_10 = t.find(10);
    at_10.sort();
    assert_eq!(at_10, vec![1, 2, 3]);
    assert_eq!(t.find(5), vec![1]); // Y's low end is open, excludes 5
    assert!(t.find(15).is_empty()); // Y's high end is open, excludes 15
  }

  #[test]
  fn half_open_boundary_is_excluded_at_stop() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    t.insert(1, 0, 10, false, true).unwrap();
    assert_eq!(t.find(9), vec![1]);
    assert!(t.find(10).is_empty());
  }

  #[test]
  fn closed_endpoint_found_exactly_at_boundary() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    t.insert(1, 0, 10, false, false).unwrap();
    assert_eq!(t.find(0), vec![1]);
    assert_eq!(t.find(10), vec![1]);
  }

  #[test]
  fn degenerate_point_interval() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    t.insert(1, 5, 5, false, false).unwrap();
    assert_eq!(t.find(5), vec![1]);
    assert!(t.find(4).is_empty());
  }

  #[test]
  fn degenerate_open_interval_is_empty_noop() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    t.insert(1, 5, 5, true, false).unwrap();
    assert!(t.is_empty());
    assert!(t.find(5).is_empty());
  }

  #[test]
  fn remove_drops_coverage() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    t.insert(1, 0, 10, false, false).unwrap();
    t.insert(2, 5, 15, false, false).unwrap();
    t.remove(1, 0, 10, false, false);
    t.debug_assert_invariants();
    assert_eq!(t.find(7), vec![2]);
    assert!(t.find(2).is_empty());
  }

  #[test]
  fn find_intersections_matches_overlap_semantics() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    t.insert(1, 0, 5, false, true).unwrap(); // [0, 5)
    t.insert(2, 5, 10, false, true).unwrap(); // [5, 10), touches 1 at a point excluded by both
    let mut found = t.find_intersections(3, 5, false, true);
    found.sort();
    assert_eq!(found, vec![1]);
  }

  #[test]
  fn find_contained_filters_out_partial_overlaps() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    t.insert(1, 2, 4, false, false).unwrap();
    t.insert(2, 0, 100, false, false).unwrap();
    let mut found = t.find_contained(0, 10, false, false);
    found.sort();
    assert_eq!(found, vec![1]);
  }

  #[test]
  fn whole_domain_interval_uses_side_set_not_tree() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::with_domain(0, 100);
    t.insert(1, 0, 100, false, false).unwrap();
    t.insert(2, 10, 20, false, false).unwrap();
    assert_eq!(t.base.len(), 2); // only the narrower interval's endpoints
    assert_eq!(t.find(50), vec![1]);
    let mut found = t.find(15);
    found.sort();
    assert_eq!(found, vec![1, 2]);
  }

  #[test]
  fn rotations_keep_queries_correct_under_many_inserts() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    for i in 0..100u32 {
      let lo = (i as i32) * 3;
      t.insert(i, lo, lo + 5, false, false).unwrap();
    }
    t.debug_assert_invariants();
    for i in 0..100u32 {
      let lo = (i as i32) * 3;
      let found = t.find(lo + 2);
      assert!(found.contains(&i), "expected id {i} covering point {}", lo + 2);
    }
  }

  #[test]
  fn insert_point_and_remove_point_are_degenerate_shorthand() {
    let mut t: IntervalTree<i32, u32> = IntervalTree::new();
    t.insert_point(1, 5).unwrap();
    assert_eq!(t.find(5), vec![1]);
    t.remove_point(1, 5);
    assert!(t.find(5).is_empty());
  }

  #[test]
  fn import_from_degenerate_tree_preserves_point_lookups() {
    let mut src: DegenerateIntervalTree<i32, u32> = DegenerateIntervalTree::new();
    src.insert(1, 5);
    src.insert(2, 10);
    let tree = IntervalTree::import_from_degenerate(src);
    assert_eq!(tree.find(5), vec![1]);
    assert_eq!(tree.find(10), vec![2]);
    assert!(tree.find(7).is_empty());
  }

  #[test]
  fn works_with_uuid_ids_not_just_small_integers() {
    use uuid::Uuid;
    let mut t: IntervalTree<i32, Uuid> = IntervalTree::new();
    let a = Uuid::now_v7();
    let b = Uuid::now_v7();
    t.insert(a, 0, 10, false, false).unwrap();
    t.insert(b, 5, 15, false, false).unwrap();
    let mut found = t.find(7);
    found.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(found, expected);
  }
}
