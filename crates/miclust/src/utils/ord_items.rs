//! Wrappers that impose a total order on partially ordered values.
//!
//! Distance values are `f64`, which is only `PartialOrd`. These wrappers let
//! distances drive `BinaryHeap`s, `sort_by_key`, and `min_by_key` by treating
//! incomparable values (NaNs) as equal.

use core::cmp::Ordering;

/// Orders pairs by the second element in its natural order, ignoring the first.
#[derive(Clone, Copy, Debug)]
pub struct MinItem<A, T>(pub A, pub T);

impl<A, T: PartialOrd> PartialEq for MinItem<A, T> {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}

impl<A, T: PartialOrd> Eq for MinItem<A, T> {}

impl<A, T: PartialOrd> PartialOrd for MinItem<A, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A, T: PartialOrd> Ord for MinItem<A, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.1.partial_cmp(&other.1).unwrap_or(Ordering::Equal)
    }
}
