use std::iter::FusedIterator;

use crate::Error;

/// An object with indexed children, each fetched as a new reference.
pub trait Parent {
    type Child;

    fn child_count(&self) -> usize;

    /// Fetches one child. Out-of-range indices are reported by the C API.
    fn child_at(&self, index: usize) -> Result<Self::Child, Error>;
}

/// A lazy view over the children of a parent.
///
/// Nothing is fetched until an element is requested. The count is read
/// once, when the view is created.
#[derive(Debug)]
pub struct Children<'a, P: Parent> {
    parent: &'a P,
    len: usize,
}

impl<'a, P: Parent> Children<'a, P> {
    pub(crate) fn new(parent: &'a P) -> Self {
        Children {
            parent,
            len: parent.child_count(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Result<P::Child, Error> {
        self.parent.child_at(index)
    }

    /// The first child, or `None` when there are no children.
    pub fn first(&self) -> Result<Option<P::Child>, Error> {
        self.iter().next().transpose()
    }

    pub fn last(&self) -> Result<Option<P::Child>, Error> {
        self.iter().next_back().transpose()
    }

    pub fn iter(&self) -> ChildIter<'a, P> {
        ChildIter {
            parent: self.parent,
            front: 0,
            back: self.len,
        }
    }
}

impl<'a, P: Parent> Clone for Children<'a, P> {
    fn clone(&self) -> Self {
        Children {
            parent: self.parent,
            len: self.len,
        }
    }
}

impl<'a, P: Parent> IntoIterator for &Children<'a, P> {
    type Item = Result<P::Child, Error>;
    type IntoIter = ChildIter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`Children`].
///
/// Yields exactly as many items as the view's length. A child that cannot
/// be fetched is yielded as an error in its place.
#[derive(Debug)]
pub struct ChildIter<'a, P: Parent> {
    parent: &'a P,
    front: usize,
    back: usize,
}

impl<'a, P: Parent> Iterator for ChildIter<'a, P> {
    type Item = Result<P::Child, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let child = self.parent.child_at(self.front);
        self.front += 1;
        Some(child)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a, P: Parent> DoubleEndedIterator for ChildIter<'a, P> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.parent.child_at(self.back))
    }
}

impl<'a, P: Parent> ExactSizeIterator for ChildIter<'a, P> {}

impl<'a, P: Parent> FusedIterator for ChildIter<'a, P> {}
