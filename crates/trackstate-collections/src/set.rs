//! 可追蹤的 set

use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, DerefMut};

use trackstate_core::{ContainerShape, OwnerRef, Trackable};

use crate::collection::TrackedCollection;
use crate::delegate::SetDelegate;

/// 可追蹤的 set，變更規則與 [`TrackedCollection`] 相同
pub struct TrackedSet<T, S = HashSet<T>> {
    inner: TrackedCollection<T, S>,
}

impl<T, S> TrackedSet<T, S>
where
    T: Clone + PartialEq,
    S: SetDelegate<T>,
{
    pub fn new(delegate: S, owner: OwnerRef) -> Self {
        Self {
            inner: TrackedCollection::with_shape(delegate, owner, ContainerShape::Set),
        }
    }

    pub fn detached(delegate: S) -> Self {
        Self::new(delegate, OwnerRef::detached())
    }

    pub fn as_collection(&self) -> &TrackedCollection<T, S> {
        &self.inner
    }
}

impl<T, S> TrackedSet<T, S>
where
    T: Clone + PartialEq + Trackable,
    S: SetDelegate<T>,
{
    pub fn with_node_elements(self) -> Self {
        Self {
            inner: self.inner.with_node_elements(),
        }
    }
}

impl<T, S> Deref for TrackedSet<T, S> {
    type Target = TrackedCollection<T, S>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T, S> DerefMut for TrackedSet<T, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<T: fmt::Debug, S: fmt::Debug> fmt::Debug for TrackedSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TrackedSet").field(&self.inner).finish()
    }
}
