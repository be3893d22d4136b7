//! Pairwise-disjoint interval tracker.
//!
//! Endpoints are sorted lexicographically by `(value, kind)` where, at a
//! shared value, `EndOpen < StartClosed < EndClosed < StartOpen`. The set
//! of stored intervals is pairwise disjoint iff this sequence never has a
//! start endpoint immediately followed by another start endpoint — the
//! tree maintains that count (`start_followed_by_start`) incrementally
//! rather than re-sorting on every query.
//!
//! Endpoint values live as keys in an [`crate::rbtree::RbTree`]; each node
//! additionally carries the four per-kind counters for its key plus,
//! optionally, the bookkeeping needed to produce a canonical disjoint
//! cover (`start_count_open`/`start_count_closed`, `open_end_ids`,
//! `closed_end_ids`).

use std::collections::HashMap;
use std::hash::Hash;

use crate::rbtree::{NodeId, RbHooks, RbTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval<K> {
  lo: K,
  hi: K,
  open_lo: bool,
  open_hi: bool,
}

impl<K: Ord> Interval<K> {
  fn is_empty(&self) -> bool {
    match self.lo.cmp(&self.hi) {
      std::cmp::Ordering::Greater => true,
      std::cmp::Ordering::Equal => self.open_lo || self.open_hi,
      std::cmp::Ordering::Less => false,
    }
  }
}

/// Per-key endpoint-kind counters, in the tiebreak order used
/// for endpoints sharing a value: end-open, start-closed, end-closed,
/// start-open.
#[derive(Debug, Default, Clone, Copy)]
struct KindCounts {
  end_open: u32,
  start_closed: u32,
  end_closed: u32,
  start_open: u32,
}

impl KindCounts {
  fn total(&self) -> u32 {
    self.end_open + self.start_closed + self.end_closed + self.start_open
  }

  fn starts_with_start(&self) -> bool {
    // the first nonzero kind bucket in tiebreak order is a start kind
    if self.end_open > 0 {
      false
    } else {
      self.start_closed > 0 || self.end_closed == 0 && self.start_open > 0
    }
  }

  fn ends_with_start(&self) -> bool {
    if self.start_open > 0 {
      true
    } else if self.end_closed > 0 {
      false
    } else {
      self.start_closed > 0
    }
  }
}

/// Node extension for the disjoint tracker's underlying ordered tree.
/// The `start_count_*`/`*_end_ids`/`pending_*_absorbed` fields are only
/// meaningfully maintained when the owning tracker was constructed with
/// `generate_disjoint_intervals = true`.
#[derive(Debug, Default)]
pub struct DisjointExt<Id> {
  counts: KindCounts,
  /// Open-starts still open immediately after this node's end-open points.
  start_count_open: u32,
  /// Starts still open immediately after this node's end-closed points.
  start_count_closed: u32,
  open_end_ids: Vec<Id>,
  closed_end_ids: Vec<Id>,
  /// The id popped from `open_end_ids` the moment `start_count_open` last
  /// transitioned 0→1 (it was absorbed into a larger covering interval),
  /// if that transition hasn't since been undone. Restored to the front of
  /// `open_end_ids` the moment `start_count_open` falls back to 0 — this is
  /// node-owned state, not owned by whichever interval's removal happens to
  /// be the one that drives the count back to zero, since a third interval
  /// may still be straddling this node when the absorbing one is removed.
  pending_open_absorbed: Option<Id>,
  /// Mirror of `pending_open_absorbed` for `start_count_closed`/`closed_end_ids`.
  pending_closed_absorbed: Option<Id>,
}

impl<Id> DisjointExt<Id> {
  fn is_unused(&self) -> bool {
    self.counts.total() == 0
      && self.start_count_open == 0
      && self.start_count_closed == 0
      && self.open_end_ids.is_empty()
      && self.closed_end_ids.is_empty()
      && self.pending_open_absorbed.is_none()
      && self.pending_closed_absorbed.is_none()
  }
}

pub struct DisjointHooks;
impl<K, Id> RbHooks<K, DisjointExt<Id>> for DisjointHooks {}

/// Delta returned by [`PairwiseDisjointTracker::add_interval`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AddDelta<Id> {
  /// Ids absorbed into `covering_interval` by this addition.
  pub removed_intervals: Vec<Id>,
  pub covering_interval: Id,
}

/// Delta returned by [`PairwiseDisjointTracker::remove_interval`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RemoveDelta<Id> {
  /// Ids that become independently disjoint again after this removal.
  pub restored_intervals: Vec<Id>,
  /// The id of the interval that used to cover the removed one, if any,
  /// now covering a smaller span.
  pub modified_interval: Option<Id>,
}

/// Combined delta returned by [`PairwiseDisjointTracker::modify_interval`],
/// with restore/remove pairs for the same id elided.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ModifyDelta<Id> {
  pub removed_intervals: Vec<Id>,
  pub restored_intervals: Vec<Id>,
  pub covering_interval: Option<Id>,
  pub modified_interval: Option<Id>,
}

/// Incrementally tests whether a set of caller-identified intervals is
/// pairwise disjoint and, optionally, maintains a canonical disjoint cover
/// with stable ids.
pub struct PairwiseDisjointTracker<K, Id> {
  base: RbTree<K, DisjointExt<Id>, DisjointHooks>,
  intervals: HashMap<Id, Interval<K>>,
  start_followed_by_start: i64,
  generate_disjoint_intervals: bool,
  /// For each id that currently has disjoint-cover bookkeeping live, the
  /// keys of the interior nodes its own `extend_open_count` walk touched
  /// (strictly between its low and high endpoint), recorded at add time.
  /// `shrink_open_count` replays exactly this set rather than whatever
  /// nodes happen to lie between the endpoints *now* — other intervals
  /// added afterwards may have inserted new nodes in between that never
  /// participated in this id's own walk (spec.md §8 scenario S6).
  touched_nodes: HashMap<Id, Vec<K>>,
}

impl<K, Id> PairwiseDisjointTracker<K, Id>
where
  K: Ord + Copy,
  Id: Copy + Eq + Hash + Ord,
{
  pub fn new(generate_disjoint_intervals: bool) -> Self {
    PairwiseDisjointTracker {
      base: RbTree::new(),
      intervals: HashMap::new(),
      start_followed_by_start: 0,
      generate_disjoint_intervals,
      touched_nodes: HashMap::new(),
    }
  }

  pub fn is_disjoint(&self) -> bool {
    self.start_followed_by_start == 0
  }

  /// Whether the point `v` is covered by at most one stored interval.
  pub fn is_disjoint_value(&self, v: K) -> bool {
    self.intervals.values().filter(|iv| point_in(iv, v)).count() <= 1
  }

  /// Whether every point in `[lo, hi)` per `open_lo`/`open_hi` is covered
  /// by at most one stored interval.
  pub fn is_disjoint_range(&self, lo: K, hi: K, open_lo: bool, open_hi: bool) -> bool {
    let q = Interval { lo, hi, open_lo, open_hi };
    if q.is_empty() {
      return true;
    }
    let mut overlapping: Vec<&Interval<K>> = self.intervals.values().filter(|iv| overlaps(iv, &q)).collect();
    overlapping.sort_by(|a, b| a.lo.cmp(&b.lo));
    let mut cursor: Option<K> = None;
    for iv in overlapping {
      if let Some(c) = cursor {
        if iv.lo < c {
          return false;
        }
      }
      cursor = Some(iv.hi);
    }
    true
  }

  /// Whether `id`'s interval, extended/shrunk so its end becomes
  /// `end_value`/`end_open`, would still be disjoint from every other
  /// stored interval.
  pub fn is_disjoint_interval(&self, id: Id, end_value: K, end_open: bool) -> bool {
    let Some(cur) = self.intervals.get(&id) else { return true };
    let candidate = Interval { lo: cur.lo, hi: end_value, open_lo: cur.open_lo, open_hi: end_open };
    self
      .intervals
      .iter()
      .filter(|(other_id, _)| **other_id != id)
      .all(|(_, iv)| !overlaps(iv, &candidate))
  }

  /// The id of the stored interval covering `[lo, hi)` exactly, if one
  /// exists (used to look up the canonical cover's merged id, spec S1).
  pub fn get_covering_interval_id(&self, lo: K, open_lo: bool, hi: K, open_hi: bool) -> Option<Id> {
    self
      .intervals
      .iter()
      .find(|(_, iv)| iv.lo == lo && iv.open_lo == open_lo && iv.hi == hi && iv.open_hi == open_hi)
      .map(|(id, _)| *id)
  }

  fn node_for(&mut self, k: K) -> NodeId {
    self.base.insert_key_with(k, DisjointExt::default)
  }

  fn bump(&mut self, n: NodeId, kind: EndpointKind, delta: i32) {
    let before = self.base.ext(n).counts;
    let ext = self.base.ext_mut(n);
    match kind {
      EndpointKind::EndOpen => bump_u32(&mut ext.counts.end_open, delta),
      EndpointKind::StartClosed => bump_u32(&mut ext.counts.start_closed, delta),
      EndpointKind::EndClosed => bump_u32(&mut ext.counts.end_closed, delta),
      EndpointKind::StartOpen => bump_u32(&mut ext.counts.start_open, delta),
    }
    self.adjust_adjacency(n, kind, delta, before);
  }

  /// Incrementally update `start_followed_by_start` for the effect of
  /// adding (`delta > 0`) or removing (`delta < 0`) one endpoint of `kind`
  /// at node `n`.
  fn adjust_adjacency(&mut self, n: NodeId, kind: EndpointKind, delta: i32, before: KindCounts) {
    let is_start = matches!(kind, EndpointKind::StartClosed | EndpointKind::StartOpen);
    if is_start {
      // A start endpoint creates/destroys an adjacency with whatever start
      // endpoint immediately precedes or follows it once all *other*
      // endpoints at this same key are accounted for by tiebreak order.
      let prev_is_start = self.neighbour_ends_with_start(n, true, &before, kind);
      let next_is_start = self.neighbour_starts_with_start(n, true, &before, kind);
      if prev_is_start {
        self.start_followed_by_start += delta as i64;
      }
      if next_is_start {
        self.start_followed_by_start += delta as i64;
      }
    } else {
      // An end endpoint can separate (on insert) or merge (on removal) two
      // start endpoints that would otherwise be adjacent across it.
      let prev_is_start = self.neighbour_ends_with_start(n, false, &before, kind);
      let next_is_start = self.neighbour_starts_with_start(n, false, &before, kind);
      if prev_is_start && next_is_start {
        self.start_followed_by_start -= delta as i64;
      }
    }
  }

  /// `true` if the endpoint immediately before `(n, kind)` in the global
  /// sequence is a start endpoint. `same_key_only_self` controls whether we
  /// are asking "before me, the start endpoint I'm adding/removing" (a
  /// start kind) or "before me, the end endpoint I'm adding/removing" (an
  /// end kind) — in both cases we must skip over kinds at this same key
  /// that come before `kind` in tiebreak order only if they are the
  /// endpoint itself (`before` already excludes the just-mutated kind's
  /// contribution since we snapshot before bumping, except the single unit
  /// we're adding/removing, which this helper accounts for explicitly).
  fn neighbour_ends_with_start(&self, n: NodeId, is_start: bool, before: &KindCounts, kind: EndpointKind) -> bool {
    if kind.has_predecessor_kind_at_same_key(before, is_start) {
      return kind.predecessor_is_start(before);
    }
    match self.base.prev(n) {
      Some(p) => self.base.ext(p).counts.ends_with_start(),
      None => false,
    }
  }

  fn neighbour_starts_with_start(&self, n: NodeId, is_start: bool, before: &KindCounts, kind: EndpointKind) -> bool {
    if kind.has_successor_kind_at_same_key(before, is_start) {
      return kind.successor_is_start(before);
    }
    match self.base.next(n) {
      Some(nx) => self.base.ext(nx).counts.starts_with_start(),
      None => false,
    }
  }

  /// Add `[lo, hi]`/`(lo, hi)`/etc for `id`. Empty intervals (equal
  /// endpoints with either bound open) are a silent no-op. When
  /// `generate_disjoint_intervals` is enabled,
  /// returns the delta describing ids absorbed into a larger cover, or
  /// `None` if the canonical cover is unchanged.
  pub fn add_interval(&mut self, lo: K, open_lo: bool, hi: K, open_hi: bool, id: Id) -> Option<AddDelta<Id>> {
    let iv = Interval { lo, hi, open_lo, open_hi };
    if iv.is_empty() {
      return None;
    }
    self.intervals.insert(id, iv);

    let start_kind = if open_lo { EndpointKind::StartOpen } else { EndpointKind::StartClosed };
    let end_kind = if open_hi { EndpointKind::EndOpen } else { EndpointKind::EndClosed };

    let lo_node = self.node_for(lo);
    let hi_node = self.node_for(hi);
    self.bump(lo_node, start_kind, 1);
    self.bump(hi_node, end_kind, 1);

    if !self.generate_disjoint_intervals {
      return None;
    }
    self.extend_open_count(lo_node, hi_node, id, open_hi)
  }

  /// Walk the node sequence from `lo_node` to `hi_node` (exclusive of
  /// `hi_node` itself, whose end-kind terminates the run) increasing the
  /// relevant `start_count_*` along the way, detecting the 0→1 transition
  /// that means a previously-disjoint interval just got absorbed (spec
  /// §4.D "Disjoint-cover generation"). Records the interior keys touched
  /// under `id` in `touched_nodes` so a later removal can replay exactly
  /// this walk rather than whatever nodes lie between the endpoints then.
  fn extend_open_count(&mut self, lo_node: NodeId, hi_node: NodeId, id: Id, open_hi: bool) -> Option<AddDelta<Id>> {
    let mut absorbed = Vec::new();
    let mut touched = Vec::new();
    let mut cur = Some(lo_node);
    let mut covering: Option<Id> = None;
    while let Some(n) = cur {
      if n == hi_node {
        break;
      }
      touched.push(*self.base.key(n));
      let ext = self.base.ext_mut(n);
      let was_open_zero = ext.start_count_open == 0;
      let was_closed_zero = ext.start_count_closed == 0;
      ext.start_count_open += 1;
      ext.start_count_closed += 1;
      if was_open_zero && !ext.open_end_ids.is_empty() {
        let absorbed_id = ext.open_end_ids.remove(0);
        ext.pending_open_absorbed = Some(absorbed_id);
        absorbed.push(absorbed_id);
      }
      if was_closed_zero && !ext.closed_end_ids.is_empty() {
        let absorbed_id = ext.closed_end_ids.remove(0);
        ext.pending_closed_absorbed = Some(absorbed_id);
        absorbed.push(absorbed_id);
      }
      cur = self.base.next(n);
    }
    self.touched_nodes.insert(id, touched);
    let hi_ext = self.base.ext_mut(hi_node);
    if open_hi {
      hi_ext.open_end_ids.insert(0, id);
    } else {
      hi_ext.closed_end_ids.insert(0, id);
    }
    if !absorbed.is_empty() {
      covering = Some(id);
    }
    covering.map(|c| AddDelta { removed_intervals: absorbed, covering_interval: c })
  }

  /// Remove `id` (previously added with these exact bounds). Empty
  /// intervals are a silent no-op.
  pub fn remove_interval(&mut self, lo: K, open_lo: bool, hi: K, open_hi: bool, id: Id) -> Option<RemoveDelta<Id>> {
    let iv = Interval { lo, hi, open_lo, open_hi };
    if iv.is_empty() {
      return None;
    }
    self.intervals.remove(&id);

    let start_kind = if open_lo { EndpointKind::StartOpen } else { EndpointKind::StartClosed };
    let end_kind = if open_hi { EndpointKind::EndOpen } else { EndpointKind::EndClosed };

    let restored = if self.generate_disjoint_intervals {
      self.shrink_open_count(id, hi, open_hi)
    } else {
      Vec::new()
    };

    if let Some(lo_node) = self.base.find(&lo) {
      self.bump(lo_node, start_kind, -1);
      self.prune_if_unused(lo_node);
    }
    if let Some(hi_node) = self.base.find(&hi) {
      self.bump(hi_node, end_kind, -1);
      self.prune_if_unused(hi_node);
    }

    let modified = self.get_covering_interval_id_containing(lo, hi);
    Some(RemoveDelta { restored_intervals: restored, modified_interval: modified })
  }

  fn get_covering_interval_id_containing(&self, lo: K, hi: K) -> Option<Id> {
    self
      .intervals
      .iter()
      .find(|(_, iv)| iv.lo <= lo && iv.hi >= hi && !(iv.lo == lo && iv.hi == hi))
      .map(|(id, _)| *id)
  }

  /// Undo `id`'s own `extend_open_count` walk, using the interior keys
  /// recorded for `id` at add time rather than the node chain currently
  /// between its endpoints — another interval may since have inserted
  /// nodes in between that were never part of `id`'s contribution (spec.md
  /// §8 scenario S6). Restoring at a node is node-owned: the id that was
  /// absorbed there pops back to the front of the FIFO the moment this
  /// node's count returns to zero, regardless of which interval's removal
  /// happens to be the one driving it there.
  fn shrink_open_count(&mut self, id: Id, hi: K, open_hi: bool) -> Vec<Id> {
    let Some(touched) = self.touched_nodes.remove(&id) else { return Vec::new() };
    let mut restored = Vec::new();
    for k in touched {
      let Some(n) = self.base.find(&k) else { continue };
      let ext = self.base.ext_mut(n);
      ext.start_count_open = ext.start_count_open.saturating_sub(1);
      ext.start_count_closed = ext.start_count_closed.saturating_sub(1);
      if ext.start_count_open == 0 {
        if let Some(restored_id) = ext.pending_open_absorbed.take() {
          ext.open_end_ids.insert(0, restored_id);
          restored.push(restored_id);
        }
      }
      if ext.start_count_closed == 0 {
        if let Some(restored_id) = ext.pending_closed_absorbed.take() {
          ext.closed_end_ids.insert(0, restored_id);
          restored.push(restored_id);
        }
      }
    }
    if let Some(hi_node) = self.base.find(&hi) {
      let hi_ext = self.base.ext_mut(hi_node);
      if open_hi {
        hi_ext.open_end_ids.retain(|x| *x != id);
      } else {
        hi_ext.closed_end_ids.retain(|x| *x != id);
      }
    }
    restored
  }

  fn prune_if_unused(&mut self, n: NodeId) {
    if self.base.ext(n).is_unused() {
      self.base.remove_node(n);
    }
  }

  /// Remove `id`'s old bounds and add its new bounds as one logical
  /// operation, preserving id stability across the edit: if the new
  /// interval's endpoint coincides with an interval the removal just
  /// restored, the new id is preferred over the restored one in the
  /// returned delta.
  #[allow(clippy::too_many_arguments)]
  pub fn modify_interval(
    &mut self,
    new_lo: K,
    new_open_lo: bool,
    new_hi: K,
    new_open_hi: bool,
    prev_lo: K,
    prev_open_lo: bool,
    prev_hi: K,
    prev_open_hi: bool,
    id: Id,
  ) -> ModifyDelta<Id> {
    let remove_delta = self.remove_interval(prev_lo, prev_open_lo, prev_hi, prev_open_hi, id);
    let add_delta = self.add_interval(new_lo, new_open_lo, new_hi, new_open_hi, id);

    let mut out = ModifyDelta::default();
    let mut restored = remove_delta.map(|d| d.restored_intervals).unwrap_or_default();
    if let Some(add) = add_delta {
      // ids restored by the removal and immediately re-absorbed by the
      // addition are elided from both lists (net no-op for that id).
      restored.retain(|r| !add.removed_intervals.contains(r));
      out.removed_intervals = add.removed_intervals;
      out.covering_interval = Some(add.covering_interval);
    }
    out.restored_intervals = restored;
    out.modified_interval = self.get_covering_interval_id_containing(new_lo, new_hi);
    out
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndpointKind {
  EndOpen,
  StartClosed,
  EndClosed,
  StartOpen,
}

impl EndpointKind {
  /// Whether, in tiebreak order, some *other* endpoint kind at this same
  /// key already sits immediately before `self` (so the sequence
  /// neighbour to inspect is within this node, not the previous node).
  fn has_predecessor_kind_at_same_key(&self, before: &KindCounts, _is_start: bool) -> bool {
    match self {
      EndpointKind::EndOpen => false,
      EndpointKind::StartClosed => before.end_open > 0,
      EndpointKind::EndClosed => before.end_open > 0 || before.start_closed > 0,
      EndpointKind::StartOpen => before.end_open > 0 || before.start_closed > 0 || before.end_closed > 0,
    }
  }

  fn predecessor_is_start(&self, before: &KindCounts) -> bool {
    match self {
      EndpointKind::EndOpen => false,
      EndpointKind::StartClosed => false, // predecessor kind is end-open
      EndpointKind::EndClosed => before.start_closed > 0,
      EndpointKind::StartOpen => before.end_closed > 0 || before.start_closed > 0,
    }
  }

  fn has_successor_kind_at_same_key(&self, before: &KindCounts, _is_start: bool) -> bool {
    match self {
      EndpointKind::EndOpen => before.start_closed > 0 || before.end_closed > 0 || before.start_open > 0,
      EndpointKind::StartClosed => before.end_closed > 0 || before.start_open > 0,
      EndpointKind::EndClosed => before.start_open > 0,
      EndpointKind::StartOpen => false,
    }
  }

  fn successor_is_start(&self, before: &KindCounts) -> bool {
    match self {
      EndpointKind::EndOpen => before.start_closed > 0 || before.start_open > 0,
      EndpointKind::StartClosed => before.start_open > 0,
      EndpointKind::EndClosed => before.start_open > 0,
      EndpointKind::StartOpen => false,
    }
  }
}

fn bump_u32(v: &mut u32, delta: i32) {
  if delta >= 0 {
    *v += delta as u32;
  } else {
    *v -= (-delta) as u32;
  }
}

fn point_in<K: Ord>(iv: &Interval<K>, v: K) -> bool {
  let lo_ok = if iv.open_lo { v > iv.lo } else { v >= iv.lo };
  let hi_ok = if iv.open_hi { v < iv.hi } else { v <= iv.hi };
  lo_ok && hi_ok
}

fn overlaps<K: Ord + Copy>(a: &Interval<K>, b: &Interval<K>) -> bool {
  let lo_ok = match a.lo.cmp(&b.hi) {
    std::cmp::Ordering::Less => true,
    std::cmp::Ordering::Equal => !a.open_lo && !b.open_hi,
    std::cmp::Ordering::Greater => false,
  };
  let hi_ok = match b.lo.cmp(&a.hi) {
    std::cmp::Ordering::Less => true,
    std::cmp::Ordering::Equal => !b.open_lo && !a.open_hi,
    std::cmp::Ordering::Greater => false,
  };
  lo_ok && hi_ok
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn disjoint_intervals_stay_disjoint() {
    let mut t: PairwiseDisjointTracker<i32, u32> = PairwiseDisjointTracker::new(false);
    t.add_interval(1, false, 3, true, 1); // [1,3)
    assert!(t.is_disjoint());
    t.add_interval(3, false, 5, false, 2); // [3,5]
    assert!(t.is_disjoint());
  }

  #[test]
  fn covering_interval_after_merge_is_rightmost_closed_end() {
    // spec.md §8 scenario S1.
    let mut t: PairwiseDisjointTracker<i32, u32> = PairwiseDisjointTracker::new(true);
    t.add_interval(1, false, 3, true, 1); // A = [1,3)
    assert!(t.is_disjoint());
    t.add_interval(3, false, 5, false, 2); // B = [3,5]
    assert!(t.is_disjoint());
    t.add_interval(4, false, 6, true, 3); // C = [4,6)
    assert!(!t.is_disjoint());
    assert_eq!(t.get_covering_interval_id(3, false, 5, false), Some(2));
  }

  #[test]
  fn overlapping_interval_breaks_disjointness() {
    let mut t: PairwiseDisjointTracker<i32, u32> = PairwiseDisjointTracker::new(true);
    t.add_interval(1, false, 3, true, 1); // A = [1,3)
    assert!(t.is_disjoint());
    t.add_interval(3, false, 5, false, 2); // B = [3,5]
    assert!(t.is_disjoint());
    t.add_interval(4, false, 6, true, 3); // C = [4,6)
    assert!(!t.is_disjoint());
  }

  #[test]
  fn removing_the_overlap_restores_disjointness() {
    let mut t: PairwiseDisjointTracker<i32, u32> = PairwiseDisjointTracker::new(false);
    t.add_interval(1, false, 3, true, 1);
    t.add_interval(3, false, 5, false, 2);
    t.add_interval(4, false, 6, true, 3);
    assert!(!t.is_disjoint());
    t.remove_interval(4, false, 6, true, 3);
    assert!(t.is_disjoint());
  }

  #[test]
  fn empty_interval_is_noop() {
    let mut t: PairwiseDisjointTracker<i32, u32> = PairwiseDisjointTracker::new(false);
    assert!(t.add_interval(5, true, 5, false, 1).is_none());
    assert!(t.is_disjoint());
  }

  #[test]
  fn is_disjoint_range_detects_partial_overlap() {
    let mut t: PairwiseDisjointTracker<i32, u32> = PairwiseDisjointTracker::new(false);
    t.add_interval(0, false, 10, false, 1);
    t.add_interval(5, false, 15, false, 2);
    assert!(!t.is_disjoint_range(0, 20, false, true));
    assert!(t.is_disjoint_range(11, 15, false, false));
  }

  #[test]
  fn modify_interval_absorbs_overlap_into_single_cover() {
    let mut t: PairwiseDisjointTracker<i32, u32> = PairwiseDisjointTracker::new(true);
    t.add_interval(1, false, 5, false, 1); // A = [1,5]
    t.add_interval(3, false, 7, false, 2); // B = [3,7] -> cover [1,7]
    assert!(!t.is_disjoint());
    // modify A to [0,2]
    t.modify_interval(0, false, 2, false, 1, false, 5, false, 1);
    assert!(t.is_disjoint_range(0, 2, false, false));
    assert!(t.is_disjoint_range(3, 7, false, false));
  }

  #[test]
  fn removing_an_absorbed_interval_does_not_falsely_restore_its_absorber() {
    // spec.md §8 scenario S6: A's own add walk only ever touches the nodes
    // that existed at the time A was added. B's later add introduces a new
    // node in between that belongs entirely to B's contribution, and
    // removing A must not mistake that node's counters for A's.
    let mut t: PairwiseDisjointTracker<i32, u32> = PairwiseDisjointTracker::new(true);
    t.add_interval(1, false, 5, false, 1); // A = [1,5], only nodes {1,5} exist
    let delta = t.add_interval(3, false, 7, false, 2); // B = [3,7], creates nodes 3 and 7
    assert_eq!(delta.unwrap().removed_intervals, vec![1]);
    assert!(!t.is_disjoint());

    let remove_delta = t.remove_interval(1, false, 5, false, 1).unwrap();
    // B is still a live, ongoing interval: it must never show up as restored.
    assert!(!remove_delta.restored_intervals.contains(&2));
    assert!(remove_delta.restored_intervals.is_empty());
    assert_eq!(t.get_covering_interval_id(3, false, 7, false), Some(2));
  }
}
