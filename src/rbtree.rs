//! Ordered tree base: a red-black tree with a doubly-linked sibling chain
//! and virtual rotation/splice hooks that derived components override to
//! keep their own auxiliary per-node state consistent with structural
//! changes.
//!
//! Nodes live in a dense arena (`Vec<Slot<K, Ext>>`) addressed by `NodeId`
//! indices rather than `Rc<RefCell<_>>`, so the parent/child and prev/next
//! cycles every node participates in cost nothing to construct or tear
//! down (see the "cyclic references" design note).

use std::marker::PhantomData;

/// A handle to a node inside an [`RbTree`]'s arena.
///
/// Stable for the lifetime of the node: an index is only reused once the
/// node it named has been removed. A handle captured before a removal
/// must not be used afterwards — the tree does not track staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
  Red,
  Black,
}

struct Node<K, Ext> {
  key: K,
  color: Color,
  parent: Option<NodeId>,
  left: Option<NodeId>,
  right: Option<NodeId>,
  prev: Option<NodeId>,
  next: Option<NodeId>,
  pub ext: Ext,
}

enum Slot<K, Ext> {
  Occupied(Node<K, Ext>),
  Free(Option<NodeId>),
}

/// Rotation and splice hooks a derived component overrides to keep its own
/// auxiliary per-node state consistent with structural changes (spec
/// §4.A). All hooks default to doing nothing, so a component that needs
/// none of them (there is none in this crate, but the trait is meant to
/// stay generic) can use `()`-style zero-sized marker types freely.
pub trait RbHooks<K, Ext> {
  /// Called immediately after a new node is linked into the tree as a
  /// leaf, before red/black fix-up runs. Lets a derived component
  /// initialise `ext` from the already-linked predecessor/successor
  /// before any rotation might move the node around.
  fn init_new_node(_tree: &mut RbTree<K, Ext, Self>, _node: NodeId)
  where
    Self: Sized,
  {
  }

  /// Called after the pointer reshaping of a left rotation that raises
  /// `y` (formerly `x`'s right child) above `x`. Both ids are already
  /// relinked; hooks only need to move auxiliary state between them.
  fn on_rotate_left(_tree: &mut RbTree<K, Ext, Self>, _x: NodeId, _y: NodeId)
  where
    Self: Sized,
  {
  }

  /// Mirror of [`on_rotate_left`](Self::on_rotate_left) for a right
  /// rotation that raises `y` (formerly `x`'s left child) above `x`.
  fn on_rotate_right(_tree: &mut RbTree<K, Ext, Self>, _x: NodeId, _y: NodeId)
  where
    Self: Sized,
  {
  }

  /// Called during `removeNode` when `spliced` (a node with at most one
  /// child) is about to be physically unlinked in place of `removed`,
  /// because `removed` had two children and `spliced` is its in-order
  /// successor. Only *key-dependent* content should be copied here —
  /// state that depends on tree span/position must stay behind on
  /// `removed`'s own node.
  fn copy_spliced_to_removed(_tree: &mut RbTree<K, Ext, Self>, _spliced: NodeId, _removed: NodeId)
  where
    Self: Sized,
  {
  }
}

/// No-op hook set, for ordered trees that need no auxiliary bookkeeping.
pub struct NoHooks;
impl<K, Ext> RbHooks<K, Ext> for NoHooks {}

fn color_of<K, Ext, H: RbHooks<K, Ext>>(tree: &RbTree<K, Ext, H>, n: Option<NodeId>) -> Color {
  match n {
    Some(id) => tree.slot(id).color,
    None => Color::Black,
  }
}

/// Self-balancing ordered container: unique `K` keys, red-black balanced,
/// with a maintained previous/next sibling chain across the full
/// in-order sequence.
pub struct RbTree<K, Ext, H = NoHooks> {
  slots: Vec<Slot<K, Ext>>,
  free_head: Option<NodeId>,
  root: Option<NodeId>,
  first: Option<NodeId>,
  last: Option<NodeId>,
  len: usize,
  _hooks: PhantomData<fn() -> H>,
}

impl<K, Ext, H: RbHooks<K, Ext>> Default for RbTree<K, Ext, H> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K, Ext, H: RbHooks<K, Ext>> RbTree<K, Ext, H> {
  pub fn new() -> Self {
    RbTree {
      slots: Vec::new(),
      free_head: None,
      root: None,
      first: None,
      last: None,
      len: 0,
      _hooks: PhantomData,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn root(&self) -> Option<NodeId> {
    self.root
  }

  pub fn first(&self) -> Option<NodeId> {
    self.first
  }

  pub fn last(&self) -> Option<NodeId> {
    self.last
  }

  pub fn next(&self, n: NodeId) -> Option<NodeId> {
    self.node(n).next
  }

  pub fn prev(&self, n: NodeId) -> Option<NodeId> {
    self.node(n).prev
  }

  pub fn parent(&self, n: NodeId) -> Option<NodeId> {
    self.node(n).parent
  }

  pub fn left(&self, n: NodeId) -> Option<NodeId> {
    self.node(n).left
  }

  pub fn right(&self, n: NodeId) -> Option<NodeId> {
    self.node(n).right
  }

  pub fn key(&self, n: NodeId) -> &K {
    &self.node(n).key
  }

  pub fn ext(&self, n: NodeId) -> &Ext {
    &self.node(n).ext
  }

  pub fn ext_mut(&mut self, n: NodeId) -> &mut Ext {
    &mut self.node_mut(n).ext
  }

  /// Iterate node ids in ascending key order via the sibling chain.
  pub fn iter_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
    let mut cur = self.first;
    std::iter::from_fn(move || {
      let id = cur?;
      cur = self.next(id);
      Some(id)
    })
  }

  fn slot(&self, id: NodeId) -> &Node<K, Ext> {
    match &self.slots[id.0 as usize] {
      Slot::Occupied(n) => n,
      Slot::Free(_) => panic!("use of a removed NodeId"),
    }
  }

  fn slot_mut(&mut self, id: NodeId) -> &mut Node<K, Ext> {
    match &mut self.slots[id.0 as usize] {
      Slot::Occupied(n) => n,
      Slot::Free(_) => panic!("use of a removed NodeId"),
    }
  }

  fn node(&self, id: NodeId) -> &Node<K, Ext> {
    self.slot(id)
  }

  fn node_mut(&mut self, id: NodeId) -> &mut Node<K, Ext> {
    self.slot_mut(id)
  }

  fn alloc(&mut self, key: K, ext: Ext) -> NodeId {
    let node = Node {
      key,
      color: Color::Red,
      parent: None,
      left: None,
      right: None,
      prev: None,
      next: None,
      ext,
    };
    if let Some(id) = self.free_head {
      self.free_head = match &self.slots[id.0 as usize] {
        Slot::Free(next) => *next,
        Slot::Occupied(_) => unreachable!(),
      };
      self.slots[id.0 as usize] = Slot::Occupied(node);
      id
    } else {
      let id = NodeId(self.slots.len() as u32);
      self.slots.push(Slot::Occupied(node));
      id
    }
  }

  fn free(&mut self, id: NodeId) {
    self.slots[id.0 as usize] = Slot::Free(self.free_head);
    self.free_head = Some(id);
  }

  /// Smallest node whose key is greater than or equal to `key`, or `None`
  /// if every stored key is smaller.
  pub fn find_ceiling(&self, key: &K) -> Option<NodeId>
  where
    K: Ord,
  {
    let mut cur = self.root;
    let mut best = None;
    while let Some(id) = cur {
      match key.cmp(self.key(id)) {
        std::cmp::Ordering::Equal => return Some(id),
        std::cmp::Ordering::Less => {
          best = Some(id);
          cur = self.left(id);
        }
        std::cmp::Ordering::Greater => cur = self.right(id),
      }
    }
    best
  }

  /// Exact-match lookup.
  pub fn find(&self, key: &K) -> Option<NodeId>
  where
    K: Ord,
  {
    let mut cur = self.root;
    while let Some(id) = cur {
      match key.cmp(self.key(id)) {
        std::cmp::Ordering::Equal => return Some(id),
        std::cmp::Ordering::Less => cur = self.left(id),
        std::cmp::Ordering::Greater => cur = self.right(id),
      }
    }
    None
  }

  /// Insert `key`, returning the (possibly pre-existing) node. `ext_init`
  /// is only invoked when a new node must be created.
  pub fn insert_key_with(&mut self, key: K, ext_init: impl FnOnce() -> Ext) -> NodeId
  where
    K: Ord,
  {
    let mut parent = None;
    let mut cur = self.root;
    let mut went_left = false;
    while let Some(id) = cur {
      parent = Some(id);
      match key.cmp(self.key(id)) {
        std::cmp::Ordering::Equal => return id,
        std::cmp::Ordering::Less => {
          went_left = true;
          cur = self.left(id);
        }
        std::cmp::Ordering::Greater => {
          went_left = false;
          cur = self.right(id);
        }
      }
    }

    let z = self.alloc(key, ext_init());
    self.len += 1;
    self.node_mut(z).parent = parent;
    match parent {
      None => {
        self.root = Some(z);
        self.first = Some(z);
        self.last = Some(z);
      }
      Some(p) => {
        if went_left {
          self.node_mut(p).left = Some(z);
          let old_prev = self.node(p).prev;
          self.node_mut(z).prev = old_prev;
          self.node_mut(z).next = Some(p);
          self.node_mut(p).prev = Some(z);
          if let Some(pp) = old_prev {
            self.node_mut(pp).next = Some(z);
          } else {
            self.first = Some(z);
          }
        } else {
          self.node_mut(p).right = Some(z);
          let old_next = self.node(p).next;
          self.node_mut(z).next = old_next;
          self.node_mut(z).prev = Some(p);
          self.node_mut(p).next = Some(z);
          if let Some(nn) = old_next {
            self.node_mut(nn).prev = Some(z);
          } else {
            self.last = Some(z);
          }
        }
      }
    }

    H::init_new_node(self, z);
    self.fix_after_insertion(z);
    z
  }

  fn rotate_left(&mut self, x: NodeId) {
    let y = self.node(x).right.expect("rotate_left without right child");
    let y_left = self.node(y).left;
    self.node_mut(x).right = y_left;
    if let Some(yl) = y_left {
      self.node_mut(yl).parent = Some(x);
    }
    let x_parent = self.node(x).parent;
    self.node_mut(y).parent = x_parent;
    match x_parent {
      None => self.root = Some(y),
      Some(p) => {
        if self.node(p).left == Some(x) {
          self.node_mut(p).left = Some(y);
        } else {
          self.node_mut(p).right = Some(y);
        }
      }
    }
    self.node_mut(y).left = Some(x);
    self.node_mut(x).parent = Some(y);
    H::on_rotate_left(self, x, y);
  }

  fn rotate_right(&mut self, x: NodeId) {
    let y = self.node(x).left.expect("rotate_right without left child");
    let y_right = self.node(y).right;
    self.node_mut(x).left = y_right;
    if let Some(yr) = y_right {
      self.node_mut(yr).parent = Some(x);
    }
    let x_parent = self.node(x).parent;
    self.node_mut(y).parent = x_parent;
    match x_parent {
      None => self.root = Some(y),
      Some(p) => {
        if self.node(p).right == Some(x) {
          self.node_mut(p).right = Some(y);
        } else {
          self.node_mut(p).left = Some(y);
        }
      }
    }
    self.node_mut(y).right = Some(x);
    self.node_mut(x).parent = Some(y);
    H::on_rotate_right(self, x, y);
  }

  fn fix_after_insertion(&mut self, mut z: NodeId) {
    while self.node(z).parent.map(|p| self.node(p).color) == Some(Color::Red) {
      let parent = self.node(z).parent.unwrap();
      let grandparent = self.node(parent).parent.expect("red root violates invariant");
      if Some(parent) == self.node(grandparent).left {
        let uncle = self.node(grandparent).right;
        if color_of(self, uncle) == Color::Red {
          self.node_mut(parent).color = Color::Black;
          self.node_mut(uncle.unwrap()).color = Color::Black;
          self.node_mut(grandparent).color = Color::Red;
          z = grandparent;
        } else {
          if Some(z) == self.node(parent).right {
            z = parent;
            self.rotate_left(z);
          }
          let parent = self.node(z).parent.unwrap();
          let grandparent = self.node(parent).parent.unwrap();
          self.node_mut(parent).color = Color::Black;
          self.node_mut(grandparent).color = Color::Red;
          self.rotate_right(grandparent);
        }
      } else {
        let uncle = self.node(grandparent).left;
        if color_of(self, uncle) == Color::Red {
          self.node_mut(parent).color = Color::Black;
          self.node_mut(uncle.unwrap()).color = Color::Black;
          self.node_mut(grandparent).color = Color::Red;
          z = grandparent;
        } else {
          if Some(z) == self.node(parent).left {
            z = parent;
            self.rotate_right(z);
          }
          let parent = self.node(z).parent.unwrap();
          let grandparent = self.node(parent).parent.unwrap();
          self.node_mut(parent).color = Color::Black;
          self.node_mut(grandparent).color = Color::Red;
          self.rotate_left(grandparent);
        }
      }
    }
    self.node_mut(self.root.unwrap()).color = Color::Black;
  }

  fn minimum(&self, mut n: NodeId) -> NodeId {
    while let Some(l) = self.left(n) {
      n = l;
    }
    n
  }

  fn swap_keys(&mut self, a: NodeId, b: NodeId) {
    let (ai, bi) = (a.0 as usize, b.0 as usize);
    debug_assert_ne!(ai, bi);
    let (lo, hi) = if ai < bi { (ai, bi) } else { (bi, ai) };
    let (left, right) = self.slots.split_at_mut(hi);
    let lo_node = match &mut left[lo] {
      Slot::Occupied(n) => n,
      Slot::Free(_) => unreachable!(),
    };
    let hi_node = match &mut right[0] {
      Slot::Occupied(n) => n,
      Slot::Free(_) => unreachable!(),
    };
    std::mem::swap(&mut lo_node.key, &mut hi_node.key);
  }

  fn transplant(&mut self, u: NodeId, v: Option<NodeId>) {
    let u_parent = self.node(u).parent;
    if let Some(v) = v {
      self.node_mut(v).parent = u_parent;
    }
    match u_parent {
      None => self.root = v,
      Some(p) => {
        if self.node(p).left == Some(u) {
          self.node_mut(p).left = v;
        } else {
          self.node_mut(p).right = v;
        }
      }
    }
  }

  /// Remove `n` from the tree. Splices either `n` itself (if it has at
  /// most one child) or its in-order successor; when the successor is
  /// spliced instead, `n`'s key is overwritten with the successor's (via
  /// [`RbHooks::copy_spliced_to_removed`] for any key-dependent auxiliary
  /// state) so that `n`'s `NodeId` keeps referring to the removed key's
  /// former place in the structure for the duration of this call, then is
  /// freed along with the successor's old slot.
  pub fn remove_node(&mut self, n: NodeId) {
    let has_two_children = self.left(n).is_some() && self.right(n).is_some();
    let splice_target = if has_two_children {
      self.minimum(self.right(n).unwrap())
    } else {
      n
    };

    if splice_target != n {
      H::copy_spliced_to_removed(self, splice_target, n);
      self.swap_keys(splice_target, n);
    }

    let y = splice_target;
    let child = self.node(y).left.or(self.node(y).right);
    let y_color = self.node(y).color;
    let y_parent = self.node(y).parent;

    self.transplant(y, child);

    let (y_prev, y_next) = (self.node(y).prev, self.node(y).next);
    match y_prev {
      Some(p) => self.node_mut(p).next = y_next,
      None => self.first = y_next,
    }
    match y_next {
      Some(nx) => self.node_mut(nx).prev = y_prev,
      None => self.last = y_prev,
    }

    if y_color == Color::Black {
      self.delete_fixup(child, y_parent);
    }

    self.free(y);
    self.len -= 1;
  }

  pub fn remove_key(&mut self, key: &K) -> bool
  where
    K: Ord,
  {
    match self.find(key) {
      Some(n) => {
        self.remove_node(n);
        true
      }
      None => false,
    }
  }

  fn delete_fixup(&mut self, mut x: Option<NodeId>, mut x_parent: Option<NodeId>) {
    while x != self.root && color_of(self, x) == Color::Black {
      let Some(parent) = x_parent else { break };
      if self.node(parent).left == x {
        let mut w = self.node(parent).right.expect("sibling must exist");
        if self.node(w).color == Color::Red {
          self.node_mut(w).color = Color::Black;
          self.node_mut(parent).color = Color::Red;
          self.rotate_left(parent);
          w = self.node(parent).right.expect("sibling must exist");
        }
        if color_of(self, self.node(w).left) == Color::Black
          && color_of(self, self.node(w).right) == Color::Black
        {
          self.node_mut(w).color = Color::Red;
          x = Some(parent);
          x_parent = self.node(parent).parent;
        } else {
          if color_of(self, self.node(w).right) == Color::Black {
            if let Some(wl) = self.node(w).left {
              self.node_mut(wl).color = Color::Black;
            }
            self.node_mut(w).color = Color::Red;
            self.rotate_right(w);
            w = self.node(parent).right.expect("sibling must exist");
          }
          self.node_mut(w).color = self.node(parent).color;
          self.node_mut(parent).color = Color::Black;
          if let Some(wr) = self.node(w).right {
            self.node_mut(wr).color = Color::Black;
          }
          self.rotate_left(parent);
          x = self.root;
          x_parent = None;
        }
      } else {
        let mut w = self.node(parent).left.expect("sibling must exist");
        if self.node(w).color == Color::Red {
          self.node_mut(w).color = Color::Black;
          self.node_mut(parent).color = Color::Red;
          self.rotate_right(parent);
          w = self.node(parent).left.expect("sibling must exist");
        }
        if color_of(self, self.node(w).right) == Color::Black
          && color_of(self, self.node(w).left) == Color::Black
        {
          self.node_mut(w).color = Color::Red;
          x = Some(parent);
          x_parent = self.node(parent).parent;
        } else {
          if color_of(self, self.node(w).left) == Color::Black {
            if let Some(wr) = self.node(w).right {
              self.node_mut(wr).color = Color::Black;
            }
            self.node_mut(w).color = Color::Red;
            self.rotate_left(w);
            w = self.node(parent).left.expect("sibling must exist");
          }
          self.node_mut(w).color = self.node(parent).color;
          self.node_mut(parent).color = Color::Black;
          if let Some(wl) = self.node(w).left {
            self.node_mut(wl).color = Color::Black;
          }
          self.rotate_right(parent);
          x = self.root;
          x_parent = None;
        }
      }
    }
    if let Some(x) = x {
      self.node_mut(x).color = Color::Black;
    }
  }

  /// Walk the whole tree validating red-black and sibling-chain
  /// invariants; panics with a descriptive message on the first
  /// violation. Exposed for use by property tests in derived-component
  /// modules.
  pub fn debug_assert_invariants(&self)
  where
    K: Ord + std::fmt::Debug,
  {
    if self.is_empty() {
      assert!(self.root.is_none() && self.first.is_none() && self.last.is_none());
      return;
    }
    let root = self.root.unwrap();
    assert_eq!(self.node(root).color, Color::Black, "root must be black");
    fn walk<K: Ord + std::fmt::Debug, Ext, H: RbHooks<K, Ext>>(
      tree: &RbTree<K, Ext, H>,
      n: NodeId,
    ) -> usize {
      let node = tree.node(n);
      if node.color == Color::Red {
        for child in [node.left, node.right].into_iter().flatten() {
          assert_ne!(
            tree.node(child).color,
            Color::Red,
            "two consecutive red nodes"
          );
        }
      }
      let left_black = node.left.map(|l| walk(tree, l)).unwrap_or(0);
      let right_black = node.right.map(|r| walk(tree, r)).unwrap_or(0);
      assert_eq!(left_black, right_black, "black-height mismatch at {n:?}");
      left_black + if node.color == Color::Black { 1 } else { 0 }
    }
    walk(self, root);

    // sibling chain integrity
    let mut count = 0;
    let mut cur = self.first;
    let mut prev = None;
    while let Some(id) = cur {
      assert_eq!(self.node(id).prev, prev, "prev link broken at {id:?}");
      if let Some(p) = prev {
        assert_eq!(self.node(p).next, Some(id), "next link broken at {p:?}");
      }
      prev = Some(id);
      cur = self.node(id).next;
      count += 1;
    }
    assert_eq!(prev, self.last, "last does not match chain end");
    assert_eq!(count, self.len, "sibling chain length mismatch");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chain_keys(tree: &RbTree<i32, (), NoHooks>) -> Vec<i32> {
    tree.iter_ids().map(|id| *tree.key(id)).collect()
  }

  #[test]
  fn insert_maintains_order_and_rb_invariants() {
    let mut tree: RbTree<i32, (), NoHooks> = RbTree::new();
    for k in [50, 20, 80, 10, 30, 70, 90, 5, 15, 25, 35, 1, 100, -5, 60] {
      tree.insert_key_with(k, || ());
      tree.debug_assert_invariants();
    }
    let mut expected: Vec<i32> = vec![50, 20, 80, 10, 30, 70, 90, 5, 15, 25, 35, 1, 100, -5, 60];
    expected.sort();
    assert_eq!(chain_keys(&tree), expected);
    assert_eq!(*tree.key(tree.first().unwrap()), *expected.first().unwrap());
    assert_eq!(*tree.key(tree.last().unwrap()), *expected.last().unwrap());
  }

  #[test]
  fn insert_duplicate_returns_existing_node() {
    let mut tree: RbTree<i32, (), NoHooks> = RbTree::new();
    let a = tree.insert_key_with(10, || ());
    let b = tree.insert_key_with(10, || ());
    assert_eq!(a, b);
    assert_eq!(tree.len(), 1);
  }

  #[test]
  fn remove_every_order_leaves_empty_balanced_tree() {
    let keys: Vec<i32> = (0..200).collect();
    let mut tree: RbTree<i32, (), NoHooks> = RbTree::new();
    for &k in &keys {
      tree.insert_key_with(k, || ());
    }
    tree.debug_assert_invariants();

    // remove in a scrambled order (not sorted, not reverse-sorted)
    let mut removal_order = keys.clone();
    removal_order.sort_by_key(|k| (k * 37) % 197);
    for k in removal_order {
      assert!(tree.remove_key(&k));
      tree.debug_assert_invariants();
    }
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
    assert!(tree.first().is_none());
    assert!(tree.last().is_none());
  }

  #[test]
  fn remove_absent_key_is_noop() {
    let mut tree: RbTree<i32, (), NoHooks> = RbTree::new();
    tree.insert_key_with(1, || ());
    assert!(!tree.remove_key(&42));
    assert_eq!(tree.len(), 1);
  }

  #[test]
  fn find_ceiling_returns_smallest_not_less() {
    let mut tree: RbTree<i32, (), NoHooks> = RbTree::new();
    for k in [10, 20, 30] {
      tree.insert_key_with(k, || ());
    }
    let n = tree.find_ceiling(&15).unwrap();
    assert_eq!(*tree.key(n), 20);
    let n = tree.find_ceiling(&20).unwrap();
    assert_eq!(*tree.key(n), 20);
    assert!(tree.find_ceiling(&31).is_none());
  }

  struct CountingHooks;
  #[derive(Default)]
  struct Counters {
    rotations: std::cell::Cell<u32>,
  }
  impl RbHooks<i32, Counters> for CountingHooks {
    fn on_rotate_left(tree: &mut RbTree<i32, Counters, Self>, x: NodeId, _y: NodeId) {
      tree.ext_mut(x).rotations.set(tree.ext(x).rotations.get() + 1);
    }
    fn on_rotate_right(tree: &mut RbTree<i32, Counters, Self>, x: NodeId, _y: NodeId) {
      tree.ext_mut(x).rotations.set(tree.ext(x).rotations.get() + 1);
    }
  }

  #[test]
  fn rotation_hooks_fire_on_structural_change() {
    let mut tree: RbTree<i32, Counters, CountingHooks> = RbTree::new();
    for k in 0..64 {
      tree.insert_key_with(k, Counters::default);
    }
    let total: u32 = tree.iter_ids().map(|id| tree.ext(id).rotations.get()).sum();
    assert!(total > 0, "expected at least one rotation while building a 64-node tree");
  }
}
