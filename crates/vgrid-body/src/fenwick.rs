#![forbid(unsafe_code)]

//! Fenwick tree (Binary Indexed Tree) over item sizes.
//!
//! Each slot holds the pixel size of one row or column. The tree answers the
//! two questions a windowed grid asks on every scroll: "where does item `i`
//! start?" ([`FenwickTree::offset`]) and "which item covers pixel `y`?"
//! ([`FenwickTree::index_at`]). Both are O(log n).
//!
//! Sums are kept in `u64` so a million 4K-pixel rows cannot overflow.
//!
//! # Invariants
//!
//! 1. `offset(0) == 0` and `offset(len) == total()`.
//! 2. `offset(i + 1) - offset(i) == get(i)`.
//! 3. `index_at(y)` returns the unique `i` with `offset(i) <= y < offset(i + 1)`
//!    for every `y < total()`, skipping zero-sized items.

/// Prefix-sum tree over `u32` item sizes.
#[derive(Debug, Clone, Default)]
pub struct FenwickTree {
    /// 1-indexed tree storage. `tree[0]` is unused.
    tree: Vec<u64>,
    /// Raw sizes, kept so `get` and `resize` are O(1) per item.
    sizes: Vec<u32>,
}

impl FenwickTree {
    /// Create a tree of `n` zero-sized items.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            tree: vec![0; n + 1],
            sizes: vec![0; n],
        }
    }

    /// Build from initial sizes in O(n).
    #[must_use]
    pub fn from_sizes(sizes: &[u32]) -> Self {
        let mut ft = Self {
            tree: Vec::new(),
            sizes: sizes.to_vec(),
        };
        ft.rebuild();
        ft
    }

    /// Number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Whether the tree has no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Size of item `i`.
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    #[inline]
    pub fn get(&self, i: usize) -> u32 {
        self.sizes[i]
    }

    /// Set the size of item `i`. O(log n).
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    pub fn set(&mut self, i: usize, size: u32) {
        let old = self.sizes[i];
        if old == size {
            return;
        }
        self.sizes[i] = size;
        let n = self.sizes.len();
        let mut idx = i + 1;
        if size > old {
            let delta = u64::from(size - old);
            while idx <= n {
                self.tree[idx] += delta;
                idx += lowbit(idx);
            }
        } else {
            let delta = u64::from(old - size);
            while idx <= n {
                self.tree[idx] -= delta;
                idx += lowbit(idx);
            }
        }
    }

    /// Pixel offset where item `i` starts: the sum of items `[0, i)`.
    ///
    /// `offset(len())` is the total size. Indices past the end clamp.
    pub fn offset(&self, i: usize) -> u64 {
        let mut idx = i.min(self.sizes.len());
        let mut sum = 0u64;
        while idx > 0 {
            sum += self.tree[idx];
            idx -= lowbit(idx);
        }
        sum
    }

    /// Total size of all items.
    #[inline]
    pub fn total(&self) -> u64 {
        self.offset(self.sizes.len())
    }

    /// Index of the item covering pixel `y`, or `None` when `y >= total()`.
    pub fn index_at(&self, y: u64) -> Option<usize> {
        let n = self.sizes.len();
        if n == 0 || y >= self.total() {
            return None;
        }
        // Descend to the largest `pos` with offset(pos) <= y.
        let mut pos = 0usize;
        let mut remaining = y;
        let mut step = most_significant_bit(n);
        while step > 0 {
            let next = pos + step;
            if next <= n && self.tree[next] <= remaining {
                remaining -= self.tree[next];
                pos = next;
            }
            step >>= 1;
        }
        Some(pos.min(n - 1))
    }

    /// Resize to `n` items; new items get size 0. O(n).
    pub fn resize(&mut self, n: usize) {
        if n == self.sizes.len() {
            return;
        }
        self.sizes.resize(n, 0);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let n = self.sizes.len();
        self.tree.clear();
        self.tree.resize(n + 1, 0);
        for (i, &size) in self.sizes.iter().enumerate() {
            self.tree[i + 1] = u64::from(size);
        }
        for i in 1..=n {
            let parent = i + lowbit(i);
            if parent <= n {
                self.tree[parent] += self.tree[i];
            }
        }
    }
}

/// Lowest set bit of `x`. E.g., `lowbit(6) = 2`, `lowbit(4) = 4`.
#[inline]
fn lowbit(x: usize) -> usize {
    x & x.wrapping_neg()
}

/// Most significant bit that fits within `n`.
#[inline]
fn most_significant_bit(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    1 << (usize::BITS - 1 - n.leading_zeros())
}
