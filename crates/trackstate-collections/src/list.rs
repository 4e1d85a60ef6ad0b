//! 可追蹤的有序序列

use std::fmt;
use std::ops::{Deref, DerefMut};

use trackstate_core::{ContainerShape, OwnerRef, Result, TrackError, Trackable};

use crate::collection::TrackedCollection;
use crate::delegate::ListDelegate;

/// 可追蹤的有序序列
///
/// 擴充 [`TrackedCollection`] 的索引操作。序列中沒有空位，
/// 因此 `set` 與 `remove_at` 被取代/移除的值一定存在，一律標記擁有節點。
pub struct TrackedList<T, L = Vec<T>> {
    inner: TrackedCollection<T, L>,
}

impl<T, L> TrackedList<T, L>
where
    T: Clone + PartialEq,
    L: ListDelegate<T>,
{
    pub fn new(delegate: L, owner: OwnerRef) -> Self {
        Self {
            inner: TrackedCollection::with_shape(delegate, owner, ContainerShape::List),
        }
    }

    pub fn detached(delegate: L) -> Self {
        Self::new(delegate, OwnerRef::detached())
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.inner.delegate.get(index)
    }

    /// 取代索引位置的值，回傳被取代的值
    pub fn set(&mut self, index: usize, item: T) -> Result<T> {
        let len = self.inner.len();
        let replaced = self
            .inner
            .delegate
            .replace(index, item.clone())
            .ok_or(TrackError::IndexOutOfBounds { index, len })?;

        self.inner.owner.notify_dirty();
        if replaced != item {
            self.inner.tracker.record_removed(replaced.clone());
            self.inner.tracker.record_added(item);
        }
        Ok(replaced)
    }

    /// 在索引位置插入（一律標記擁有節點）
    pub fn insert_at(&mut self, index: usize, item: T) -> Result<()> {
        let len = self.inner.len();
        if !self.inner.delegate.insert_at(index, item.clone()) {
            return Err(TrackError::IndexOutOfBounds { index, len });
        }

        self.inner.owner.notify_dirty();
        self.inner.tracker.record_added(item);
        Ok(())
    }

    /// 在索引位置依序插入多個項目；實際插入時才標記
    pub fn insert_all_at<I: IntoIterator<Item = T>>(&mut self, index: usize, items: I) -> Result<bool> {
        let len = self.inner.len();
        if index > len {
            return Err(TrackError::IndexOutOfBounds { index, len });
        }
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return Ok(false);
        }

        self.inner.delegate.insert_all_at(index, items.clone());
        self.inner.owner.notify_dirty();
        for item in items {
            self.inner.tracker.record_added(item);
        }
        Ok(true)
    }

    /// 移除索引位置的值
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        let len = self.inner.len();
        let removed = self
            .inner
            .delegate
            .remove_at(index)
            .ok_or(TrackError::IndexOutOfBounds { index, len })?;

        self.inner.owner.notify_dirty();
        self.inner.tracker.record_removed(removed.clone());
        Ok(removed)
    }

    /// 以集合檢視（供欄位回報與評估）
    pub fn as_collection(&self) -> &TrackedCollection<T, L> {
        &self.inner
    }
}

impl<T, L> TrackedList<T, L>
where
    T: Clone + PartialEq + Trackable,
    L: ListDelegate<T>,
{
    /// 建構器模式：元素為可追蹤節點
    pub fn with_node_elements(self) -> Self {
        Self {
            inner: self.inner.with_node_elements(),
        }
    }
}

impl<T, L> Deref for TrackedList<T, L> {
    type Target = TrackedCollection<T, L>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T, L> DerefMut for TrackedList<T, L> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<T: fmt::Debug, L: fmt::Debug> fmt::Debug for TrackedList<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TrackedList").field(&self.inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use trackstate_core::{CollectionTracking, StatusHandle};

    fn tracked(owner: &StatusHandle, items: Vec<&'static str>) -> TrackedList<&'static str> {
        let list = TrackedList::new(items, owner.downgrade());
        list.start_tracking(true, true);
        list
    }

    #[test]
    fn test_insert_at_always_marks() {
        let owner = StatusHandle::tracking(true);
        let mut list = tracked(&owner, vec![]);

        list.insert_at(0, "x").unwrap();

        assert_eq!(list.delegate(), &vec!["x"]);
        assert!(owner.is_dirty());
        assert_eq!(list.new_entries(), vec!["x"]);
    }

    #[test]
    fn test_insert_at_out_of_bounds() {
        let owner = StatusHandle::tracking(true);
        let mut list = tracked(&owner, vec![]);

        let err = list.insert_at(3, "x").unwrap_err();

        assert!(matches!(err, TrackError::IndexOutOfBounds { index: 3, len: 0 }));
        assert!(!owner.is_dirty());
    }

    #[test]
    fn test_set_returns_replaced_and_marks() {
        let owner = StatusHandle::tracking(true);
        let mut list = tracked(&owner, vec!["a", "b"]);

        assert_eq!(list.set(1, "B").unwrap(), "b");

        assert!(owner.is_dirty());
        assert_eq!(list.get(1), Some(&"B"));
        assert_eq!(list.new_entries(), vec!["B"]);
        assert_eq!(list.removed_entries(), vec!["b"]);
        assert!(list.set(5, "z").is_err());
    }

    #[test]
    fn test_insert_all_at() {
        let owner = StatusHandle::tracking(true);
        let mut list = tracked(&owner, vec!["a", "d"]);

        assert!(!list.insert_all_at(1, Vec::new()).unwrap());
        assert!(!owner.is_dirty());

        assert!(list.insert_all_at(1, vec!["b", "c"]).unwrap());
        assert_eq!(list.delegate(), &vec!["a", "b", "c", "d"]);
        assert!(owner.is_dirty());
        assert!(list.insert_all_at(9, vec!["z"]).is_err());
    }

    #[test]
    fn test_remove_at() {
        let owner = StatusHandle::tracking(true);
        let mut list = tracked(&owner, vec!["a", "b"]);

        assert_eq!(list.remove_at(0).unwrap(), "a");
        assert!(owner.is_dirty());
        assert_eq!(list.removed_entries(), vec!["a"]);
        assert!(list.remove_at(1).is_err());
    }

    #[test]
    fn test_collection_operations_through_deref() {
        let owner = StatusHandle::tracking(true);
        let mut list = tracked(&owner, vec![]);

        assert!(list.insert("a"));
        list.clear();

        assert!(list.is_empty());
        assert!(owner.is_dirty());
        // 新增後又移除，變更集互相抵銷
        assert!(list.new_entries().is_empty());
        assert_eq!(CollectionTracking::shape(list.as_collection()), ContainerShape::List);
    }

    #[test]
    fn test_vec_deque_delegate() {
        let owner = StatusHandle::tracking(true);
        let mut list: TrackedList<i32, VecDeque<i32>> =
            TrackedList::new(VecDeque::from(vec![1, 3]), owner.downgrade());
        list.start_tracking(false, true);

        list.insert_at(1, 2).unwrap();

        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(owner.is_dirty());
    }
}
