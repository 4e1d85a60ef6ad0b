//! 可追蹤的鍵值映射

use std::collections::HashMap;
use std::fmt;
use std::ops::ControlFlow;

use trackstate_core::{
    ChangeSetTracker, FieldDescriptor, FieldRef, MapTracking, OwnerRef, StatusHandle, Trackable,
};

use crate::collection::{node_view, NodeView};
use crate::delegate::MapDelegate;

const VALUE: FieldDescriptor = FieldDescriptor::element();

/// 可追蹤的鍵值映射
///
/// 注意：`put` 只有在覆寫既有鍵時才標記擁有節點，寫入新鍵不會標記。
/// 這與集合家族（新增即標記）不一致，為相容既有行為而保留；
/// 新鍵仍會記錄在變更集中，因此 [`is_dirty`](TrackedMap::is_dirty) 會反映它。
pub struct TrackedMap<K, V, M = HashMap<K, V>> {
    delegate: M,
    owner: OwnerRef,
    tracker: ChangeSetTracker<K>,
    value_view: Option<NodeView<V>>,
}

impl<K, V, M> TrackedMap<K, V, M>
where
    K: Clone + PartialEq,
    M: MapDelegate<K, V>,
{
    /// 包裝委派映射（追蹤器尚未開始追蹤）
    pub fn new(delegate: M, owner: OwnerRef) -> Self {
        Self {
            delegate,
            owner,
            tracker: ChangeSetTracker::new(),
            value_view: None,
        }
    }

    pub fn detached(delegate: M) -> Self {
        Self::new(delegate, OwnerRef::detached())
    }

    // ---- 讀取 ----

    pub fn len(&self) -> usize {
        self.delegate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegate.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.delegate.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.delegate.get(key)
    }

    pub fn iter(&self) -> M::Iter<'_> {
        self.delegate.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.delegate.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.delegate.iter().map(|(_, value)| value)
    }

    pub fn delegate(&self) -> &M {
        &self.delegate
    }

    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    // ---- 變更 ----

    /// 寫入鍵值，回傳先前的值
    ///
    /// 只有覆寫既有鍵才標記擁有節點。
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.delegate.insert(key.clone(), value);
        if previous.is_some() {
            self.owner.notify_dirty();
            self.tracker.record_updated(key);
        } else {
            self.tracker.record_added(key);
        }
        previous
    }

    /// 寫入多個鍵值；只要輸入不為空就標記擁有節點
    pub fn put_all<I: IntoIterator<Item = (K, V)>>(&mut self, entries: I) {
        let mut any = false;
        for (key, value) in entries {
            any = true;
            if self.delegate.insert(key.clone(), value).is_some() {
                self.tracker.record_updated(key);
            } else {
                self.tracker.record_added(key);
            }
        }
        if any {
            self.owner.notify_dirty();
        }
    }

    /// 移除鍵；確實移除了值才標記
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.delegate.remove(key)?;
        self.owner.notify_dirty();
        self.tracker.record_removed(key.clone());
        Some(removed)
    }

    /// 清空；清空前鍵集合不為空才標記
    pub fn clear(&mut self) {
        let drained = self.delegate.drain_all();
        if drained.is_empty() {
            return;
        }
        self.owner.notify_dirty();
        for (key, _) in drained {
            self.tracker.record_removed(key);
        }
    }

    // ---- 變更集檢視 ----

    /// 自身簿記或值節點是否為髒
    pub fn is_dirty(&self) -> bool {
        if self.tracker.is_dirty() {
            return true;
        }
        match self.value_view {
            Some(view) => self.values().any(|value| view(value).is_this_dirty()),
            None => false,
        }
    }

    pub fn new_keys(&self) -> Vec<K> {
        self.tracker.new_entries()
    }

    pub fn removed_keys(&self) -> Vec<K> {
        self.tracker.removed_entries()
    }

    /// 被覆寫的鍵
    pub fn updated_keys(&self) -> Vec<K> {
        self.tracker.updated_entries()
    }

    /// 未新增也未覆寫的項目
    pub fn unchanged_entries(&self) -> Vec<(&K, &V)> {
        let unchanged = self.tracker.unchanged_entries(self.keys());
        self.delegate
            .iter()
            .filter(|(key, _)| unchanged.contains(key))
            .collect()
    }

    pub fn change_set_tracker(&self) -> &ChangeSetTracker<K> {
        &self.tracker
    }

    pub fn start_tracking(&self, recurse: bool, compare_before_marking_dirty: bool) {
        self.tracker
            .start_tracking(recurse, compare_before_marking_dirty);
        if let (true, Some(view)) = (recurse, self.value_view) {
            for value in self.values() {
                view(value).enable_tracking(compare_before_marking_dirty);
            }
        }
    }

    pub fn stop_tracking(&self, recurse: bool) {
        self.tracker.stop_tracking(recurse);
        if let (true, Some(view)) = (recurse, self.value_view) {
            for value in self.values() {
                view(value).disable_tracking();
            }
        }
    }
}

impl<K, V, M> TrackedMap<K, V, M>
where
    K: Clone + PartialEq,
    V: Trackable,
    M: MapDelegate<K, V>,
{
    /// 建構器模式：值為可追蹤節點，評估與遍歷時下降到值
    pub fn with_node_values(mut self) -> Self {
        self.value_view = Some(node_view::<V>);
        self
    }
}

impl<K, V, M> Trackable for TrackedMap<K, V, M>
where
    K: Clone + PartialEq,
    M: MapDelegate<K, V>,
{
    fn tracking_status(&self) -> Option<&StatusHandle> {
        Some(self.tracker.status())
    }

    fn for_each_field(
        &self,
        visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        if let Some(view) = self.value_view {
            for value in self.values() {
                visit(&VALUE, FieldRef::Node(view(value)))?;
            }
        }
        ControlFlow::Continue(())
    }

    fn is_this_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    fn touch(&self) {
        self.tracker.mark_dirty();
    }

    fn mark_as_new(&self) {
        self.tracker.mark_as_new();
    }

    fn reset_dirty_state(&self) {
        self.tracker.reset();
    }

    fn enable_tracking(&self, compare_before_marking_dirty: bool) {
        self.start_tracking(true, compare_before_marking_dirty);
    }

    fn disable_tracking(&self) {
        self.stop_tracking(true);
    }
}

impl<K, V, M> MapTracking for TrackedMap<K, V, M>
where
    K: Clone + PartialEq,
    M: MapDelegate<K, V>,
{
    fn is_dirty(&self) -> bool {
        TrackedMap::is_dirty(self)
    }

    fn len(&self) -> usize {
        self.delegate.len()
    }

    fn new_key_count(&self) -> usize {
        self.tracker.new_entry_count()
    }

    fn removed_key_count(&self) -> usize {
        self.tracker.removed_entry_count()
    }

    fn updated_key_count(&self) -> usize {
        self.tracker.updated_entry_count()
    }

    fn as_trackable(&self) -> &dyn Trackable {
        self
    }
}

impl<K: fmt::Debug, V, M: fmt::Debug> fmt::Debug for TrackedMap<K, V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedMap")
            .field("delegate", &self.delegate)
            .field("tracker", &self.tracker)
            .finish()
    }
}
