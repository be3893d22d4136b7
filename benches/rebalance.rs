use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ord_tree::interval::IntervalTree;
use ord_tree::poset::PartialOrderTree;
use ord_tree::rbtree::{NoHooks, RbTree};

fn bench_rbtree_insert(c: &mut Criterion) {
  let mut group = c.benchmark_group("rbtree_insert");
  for &size in &[100usize, 1_000, 10_000] {
    group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &n| {
      b.iter(|| {
        let mut tree: RbTree<u64, (), NoHooks> = RbTree::new();
        // insertion order scrambled relative to key order so the rebalance
        // machinery (the thing this benchmark is named for) actually fires.
        for i in 0..n as u64 {
          let k = (i.wrapping_mul(2_654_435_761)) % (n as u64 * 4 + 1);
          tree.insert_key_with(k, || ());
        }
      });
    });
  }
  group.finish();
}

fn bench_interval_insert_and_query(c: &mut Criterion) {
  let mut group = c.benchmark_group("interval_tree");
  for &size in &[100usize, 1_000, 5_000] {
    group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &n| {
      b.iter(|| {
        let mut tree: IntervalTree<i64, u32> = IntervalTree::new();
        for i in 0..n as i64 {
          let lo = i * 3;
          tree.insert(i as u32, lo, lo + 5, false, false).unwrap();
        }
        let mut total = 0usize;
        for i in 0..n as i64 {
          total += tree.find(i * 3 + 2).len();
        }
        total
      });
    });
  }
  group.finish();
}

fn bench_poset_insert_with_requirement(c: &mut Criterion) {
  let mut group = c.benchmark_group("poset_insert");
  for &size in &[100usize, 1_000, 5_000] {
    group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &n| {
      b.iter(|| {
        let mut tree: PartialOrderTree<u64> = PartialOrderTree::new(|a: &u64, b: &u64| a.cmp(b));
        let _req = tree.add_abs_requirement(n / 2, false, |_: Option<&u64>| {});
        for i in 0..n as u64 {
          let v = (i.wrapping_mul(2_654_435_761)) % (n as u64 * 4 + 1);
          tree.insert_element(v);
        }
      });
    });
  }
  group.finish();
}

criterion_group!(
  benches,
  bench_rbtree_insert,
  bench_interval_insert_and_query,
  bench_poset_insert_with_requirement
);
criterion_main!(benches);
