//! Read-only views over the children of an immutable parent.
//!
//! A [`Range`] holds a shared reference to its parent plus a
//! `(start, step, len)` triple. Indexing rewrites `range[i]` to
//! `parent[start + i * step]`, so slicing never copies children. The length
//! is fixed when the range is created; parents never change after
//! construction, so the view stays consistent for its whole lifetime.

use std::iter::FusedIterator;
use std::sync::Arc;

use crate::KernelError;

/// A fixed-size, index-addressable collection of children.
///
/// `item` is only called with `index < len()`.
pub trait Sequence {
    type Item;

    fn len(&self) -> usize;

    fn item(&self, index: usize) -> Self::Item;
}

/// A bounds-checked view over the children of `P`.
pub struct Range<P> {
    parent: Arc<P>,
    start: usize,
    step: isize,
    len: usize,
}

impl<P> Clone for Range<P> {
    fn clone(&self) -> Self {
        Range {
            parent: Arc::clone(&self.parent),
            start: self.start,
            step: self.step,
            len: self.len,
        }
    }
}

impl<P> std::fmt::Debug for Range<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Range")
            .field("start", &self.start)
            .field("step", &self.step)
            .field("len", &self.len)
            .finish()
    }
}

impl<P: Sequence> Range<P> {
    /// Creates a view over all children of `parent`.
    pub fn new(parent: Arc<P>) -> Self {
        let len = parent.len();
        Range {
            parent,
            start: 0,
            step: 1,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn parent(&self) -> &Arc<P> {
        &self.parent
    }

    fn parent_index(&self, index: usize) -> usize {
        (self.start as isize + index as isize * self.step) as usize
    }

    /// Returns the child at `index`.
    ///
    /// # Errors
    /// [`KernelError::OutOfBounds`] if `index >= self.len()`.
    pub fn get(&self, index: usize) -> Result<P::Item, KernelError> {
        if index >= self.len {
            return Err(KernelError::OutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok(self.parent.item(self.parent_index(index)))
    }

    /// Like [`Range::get`], for hosts with signed indices. Negative indices
    /// are rejected rather than counted from the end.
    pub fn get_signed(&self, index: isize) -> Result<P::Item, KernelError> {
        match usize::try_from(index) {
            Ok(index) => self.get(index),
            Err(_) => Err(KernelError::OutOfBounds {
                index: index.unsigned_abs(),
                len: self.len,
            }),
        }
    }

    /// Derives a sub-range following Python slice semantics: negative bounds
    /// count from the end and out-of-range bounds are clamped.
    ///
    /// # Errors
    /// [`KernelError::InvalidArgument`] if `step` is zero, or if the combined
    /// step of a nested slice does not fit in `isize`.
    pub fn slice(
        &self,
        start: Option<isize>,
        stop: Option<isize>,
        step: Option<isize>,
    ) -> Result<Range<P>, KernelError> {
        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(KernelError::InvalidArgument(
                "slice step cannot be zero".to_string(),
            ));
        }
        let (start, len) = adjust_indices(self.len as isize, start, stop, step);
        let start = if len == 0 { 0 } else { self.parent_index(start) };
        // With fewer than two elements the step is never applied.
        let step = if len < 2 {
            1
        } else {
            self.step.checked_mul(step).ok_or_else(|| {
                KernelError::InvalidArgument("slice step overflows".to_string())
            })?
        };
        Ok(Range {
            parent: Arc::clone(&self.parent),
            start,
            step,
            len,
        })
    }

    pub fn iter(&self) -> Iter<'_, P> {
        Iter {
            range: self,
            front: 0,
            back: self.len,
        }
    }
}

/// Clamps slice bounds against `len`, returning the first index and the
/// number of selected elements.
fn adjust_indices(
    len: isize,
    start: Option<isize>,
    stop: Option<isize>,
    step: isize,
) -> (usize, usize) {
    let clamp = |bound: isize| {
        if bound < 0 {
            let bound = bound + len;
            if bound < 0 {
                if step < 0 {
                    -1
                } else {
                    0
                }
            } else {
                bound
            }
        } else if bound >= len {
            if step < 0 {
                len - 1
            } else {
                len
            }
        } else {
            bound
        }
    };

    let start = match start {
        Some(start) => clamp(start),
        None if step < 0 => len - 1,
        None => 0,
    };
    let stop = match stop {
        Some(stop) => clamp(stop),
        None if step < 0 => -1,
        None => len,
    };

    let stride = step.unsigned_abs();
    let count = if step < 0 {
        if stop < start {
            (start - stop - 1) as usize / stride + 1
        } else {
            0
        }
    } else if start < stop {
        (stop - start - 1) as usize / stride + 1
    } else {
        0
    };

    (start.max(0) as usize, count)
}

/// Double-ended iterator over a [`Range`].
pub struct Iter<'a, P> {
    range: &'a Range<P>,
    front: usize,
    back: usize,
}

impl<'a, P: Sequence> Iterator for Iter<'a, P> {
    type Item = P::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.range.parent.item(self.range.parent_index(self.front));
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a, P: Sequence> DoubleEndedIterator for Iter<'a, P> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.range.parent.item(self.range.parent_index(self.back)))
    }
}

impl<'a, P: Sequence> ExactSizeIterator for Iter<'a, P> {}

impl<'a, P: Sequence> FusedIterator for Iter<'a, P> {}

impl<'a, P: Sequence> IntoIterator for &'a Range<P> {
    type Item = P::Item;
    type IntoIter = Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Digits(Vec<u32>);

    impl Sequence for Digits {
        type Item = u32;

        fn len(&self) -> usize {
            self.0.len()
        }

        fn item(&self, index: usize) -> u32 {
            self.0[index]
        }
    }

    fn digits() -> Range<Digits> {
        Range::new(Arc::new(Digits((0..10).collect())))
    }

    fn collect(range: &Range<Digits>) -> Vec<u32> {
        range.iter().collect()
    }

    #[test]
    fn test_get_bounds() {
        let range = digits();
        assert_eq!(range.len(), 10);
        for i in 0..10 {
            assert_eq!(range.get(i).unwrap(), i as u32);
        }
        assert!(matches!(
            range.get(10),
            Err(KernelError::OutOfBounds { index: 10, len: 10 })
        ));
        assert!(range.get_signed(-1).is_err());
        assert_eq!(range.get_signed(4).unwrap(), 4);
    }

    #[test]
    fn test_iteration_both_ends() {
        let range = digits();
        let mut iter = range.iter();
        assert_eq!(iter.len(), 10);
        assert_eq!(iter.next(), Some(0));
        assert_eq!(iter.next_back(), Some(9));
        assert_eq!(iter.len(), 8);

        let reversed: Vec<u32> = range.iter().rev().collect();
        assert_eq!(reversed, (0..10).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_slices() {
        let range = digits();
        assert_eq!(collect(&range.slice(Some(2), Some(5), None).unwrap()), [2, 3, 4]);
        assert_eq!(collect(&range.slice(None, None, Some(3)).unwrap()), [0, 3, 6, 9]);
        assert_eq!(collect(&range.slice(Some(-3), None, None).unwrap()), [7, 8, 9]);
        assert_eq!(
            collect(&range.slice(None, None, Some(-4)).unwrap()),
            [9, 5, 1]
        );
        assert_eq!(
            collect(&range.slice(Some(8), Some(2), Some(-2)).unwrap()),
            [8, 6, 4]
        );
        assert!(range.slice(Some(7), Some(2), None).unwrap().is_empty());
        assert_eq!(collect(&range.slice(Some(-50), Some(50), None).unwrap()).len(), 10);
        assert!(range.slice(None, None, Some(0)).is_err());
    }

    #[test]
    fn test_nested_slices() {
        let range = digits();
        let odd = range.slice(Some(1), None, Some(2)).unwrap();
        assert_eq!(collect(&odd), [1, 3, 5, 7, 9]);

        let tail_reversed = odd.slice(None, Some(1), Some(-1)).unwrap();
        assert_eq!(collect(&tail_reversed), [9, 7, 5]);
        assert_eq!(tail_reversed.get(1).unwrap(), 7);
        assert!(tail_reversed.get(3).is_err());
    }

    #[test]
    fn test_extreme_steps() {
        let range = digits();
        assert_eq!(collect(&range.slice(None, None, Some(isize::MIN)).unwrap()), [9]);
        assert_eq!(collect(&range.slice(None, None, Some(isize::MAX)).unwrap()), [0]);

        let even = range.slice(None, None, Some(2)).unwrap();
        let first = even.slice(None, None, Some(isize::MAX)).unwrap();
        assert_eq!(collect(&first), [0]);
        let last = even.slice(None, None, Some(isize::MIN)).unwrap();
        assert_eq!(collect(&last), [8]);
        assert_eq!(collect(&last.slice(None, None, Some(-1)).unwrap()), [8]);
    }

    #[test]
    fn test_range_keeps_parent_alive() {
        let parent = Arc::new(Digits(vec![7, 8]));
        let range = Range::new(Arc::clone(&parent));
        drop(parent);
        assert_eq!(range.get(1).unwrap(), 8);
        assert_eq!(Arc::strong_count(range.parent()), 1);
    }
}
