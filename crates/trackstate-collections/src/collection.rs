//! 可追蹤的無序集合

use std::fmt;
use std::ops::ControlFlow;

use trackstate_core::{
    ChangeSetTracker, CollectionTracking, ContainerShape, FieldDescriptor, FieldRef, OwnerRef,
    StatusHandle, Trackable,
};

use crate::delegate::CollectionDelegate;

/// 將元素視為可追蹤節點的檢視函式
pub(crate) type NodeView<T> = for<'a> fn(&'a T) -> &'a dyn Trackable;

pub(crate) fn node_view<T: Trackable>(item: &T) -> &dyn Trackable {
    item
}

const ELEMENT: FieldDescriptor = FieldDescriptor::element();

/// 可追蹤的無序集合
///
/// 讀取操作直接委派；變更操作先作用於委派容器，實際改變狀態時通知擁有節點，
/// 並同步記錄到變更集追蹤器。序列與 set 版本在此基礎上擴充。
pub struct TrackedCollection<T, C = Vec<T>> {
    pub(crate) delegate: C,
    pub(crate) owner: OwnerRef,
    pub(crate) tracker: ChangeSetTracker<T>,
    pub(crate) shape: ContainerShape,
    pub(crate) element_view: Option<NodeView<T>>,
}

impl<T, C> TrackedCollection<T, C>
where
    T: Clone + PartialEq,
    C: CollectionDelegate<T>,
{
    /// 包裝委派容器（追蹤器尚未開始追蹤）
    pub fn new(delegate: C, owner: OwnerRef) -> Self {
        Self::with_shape(delegate, owner, ContainerShape::Collection)
    }

    /// 沒有擁有節點的獨立容器
    pub fn detached(delegate: C) -> Self {
        Self::new(delegate, OwnerRef::detached())
    }

    pub(crate) fn with_shape(delegate: C, owner: OwnerRef, shape: ContainerShape) -> Self {
        Self {
            delegate,
            owner,
            tracker: ChangeSetTracker::new(),
            shape,
            element_view: None,
        }
    }

    // ---- 讀取（不影響追蹤狀態） ----

    pub fn len(&self) -> usize {
        self.delegate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegate.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.delegate.contains(item)
    }

    pub fn iter(&self) -> C::Iter<'_> {
        self.delegate.iter()
    }

    /// 被包裝的容器（唯讀）
    pub fn delegate(&self) -> &C {
        &self.delegate
    }

    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    // ---- 變更 ----

    /// 加入項目；委派容器回報結構變更時標記擁有節點
    pub fn insert(&mut self, item: T) -> bool {
        let changed = self.delegate.insert(item.clone());
        if changed {
            self.owner.notify_dirty();
            self.tracker.record_added(item);
        }
        changed
    }

    /// 加入多個項目；只要輸入不為空就標記擁有節點
    pub fn insert_all<I: IntoIterator<Item = T>>(&mut self, items: I) -> bool {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return false;
        }

        let mut changed = false;
        for item in items {
            if self.delegate.insert(item.clone()) {
                changed = true;
                self.tracker.record_added(item);
            }
        }
        self.owner.notify_dirty();
        changed
    }

    /// 移除一個相等的項目
    pub fn remove(&mut self, item: &T) -> bool {
        match self.delegate.remove(item) {
            Some(removed) => {
                self.owner.notify_dirty();
                self.tracker.record_removed(removed);
                true
            }
            None => false,
        }
    }

    /// 移除所有出現在 `items` 中的項目
    pub fn remove_all<I: IntoIterator<Item = T>>(&mut self, items: I) -> bool {
        let targets: Vec<T> = items.into_iter().collect();
        let removed = self
            .delegate
            .retain_with(&mut |item: &T| !targets.contains(item));
        self.record_bulk_removal(removed)
    }

    /// 只保留出現在 `items` 中的項目
    pub fn retain_all<I: IntoIterator<Item = T>>(&mut self, items: I) -> bool {
        let targets: Vec<T> = items.into_iter().collect();
        let removed = self.delegate.retain_with(&mut |item: &T| targets.contains(item));
        self.record_bulk_removal(removed)
    }

    /// 清空；清空前不為空才標記擁有節點
    pub fn clear(&mut self) {
        let removed = self.delegate.drain_all();
        self.record_bulk_removal(removed);
    }

    fn record_bulk_removal(&mut self, removed: Vec<T>) -> bool {
        if removed.is_empty() {
            return false;
        }
        self.owner.notify_dirty();
        for item in removed {
            self.tracker.record_removed(item);
        }
        true
    }

    // ---- 變更集檢視 ----

    /// 自身簿記或元素節點是否為髒
    pub fn is_dirty(&self) -> bool {
        if self.tracker.is_dirty() {
            return true;
        }
        match self.element_view {
            Some(view) => self.delegate.iter().any(|item| view(item).is_this_dirty()),
            None => false,
        }
    }

    pub fn new_entries(&self) -> Vec<T> {
        self.tracker.new_entries()
    }

    pub fn removed_entries(&self) -> Vec<T> {
        self.tracker.removed_entries()
    }

    pub fn unchanged_entries(&self) -> Vec<&T> {
        self.tracker.unchanged_entries(self.delegate.iter())
    }

    pub fn change_set_tracker(&self) -> &ChangeSetTracker<T> {
        &self.tracker
    }

    /// 開始追蹤；`recurse` 時一併啟用元素節點
    pub fn start_tracking(&self, recurse: bool, compare_before_marking_dirty: bool) {
        self.tracker
            .start_tracking(recurse, compare_before_marking_dirty);
        if recurse {
            self.for_each_node(|node| node.enable_tracking(compare_before_marking_dirty));
        }
    }

    /// 停止追蹤；`recurse` 時一併停用元素節點
    pub fn stop_tracking(&self, recurse: bool) {
        self.tracker.stop_tracking(recurse);
        if recurse {
            self.for_each_node(|node| node.disable_tracking());
        }
    }

    fn for_each_node(&self, mut apply: impl FnMut(&dyn Trackable)) {
        if let Some(view) = self.element_view {
            for item in self.delegate.iter() {
                apply(view(item));
            }
        }
    }
}

impl<T, C> TrackedCollection<T, C>
where
    T: Clone + PartialEq + Trackable,
    C: CollectionDelegate<T>,
{
    /// 建構器模式：元素為可追蹤節點，評估與遍歷時下降到元素
    pub fn with_node_elements(mut self) -> Self {
        self.element_view = Some(node_view::<T>);
        self
    }
}

impl<T, C> Trackable for TrackedCollection<T, C>
where
    T: Clone + PartialEq,
    C: CollectionDelegate<T>,
{
    fn tracking_status(&self) -> Option<&StatusHandle> {
        Some(self.tracker.status())
    }

    fn for_each_field(
        &self,
        visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        if let Some(view) = self.element_view {
            for item in self.delegate.iter() {
                visit(&ELEMENT, FieldRef::Node(view(item)))?;
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

    /// 容器的追蹤器一律遞迴到自己的元素
    fn enable_tracking(&self, compare_before_marking_dirty: bool) {
        self.start_tracking(true, compare_before_marking_dirty);
    }

    fn disable_tracking(&self) {
        self.stop_tracking(true);
    }
}

impl<T, C> CollectionTracking for TrackedCollection<T, C>
where
    T: Clone + PartialEq,
    C: CollectionDelegate<T>,
{
    fn shape(&self) -> ContainerShape {
        self.shape
    }

    fn is_dirty(&self) -> bool {
        TrackedCollection::is_dirty(self)
    }

    fn len(&self) -> usize {
        self.delegate.len()
    }

    fn new_entry_count(&self) -> usize {
        self.tracker.new_entry_count()
    }

    fn removed_entry_count(&self) -> usize {
        self.tracker.removed_entry_count()
    }

    fn as_trackable(&self) -> &dyn Trackable {
        self
    }
}

impl<T: fmt::Debug, C: fmt::Debug> fmt::Debug for TrackedCollection<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedCollection")
            .field("shape", &self.shape)
            .field("delegate", &self.delegate)
            .field("tracker", &self.tracker)
            .finish()
    }
}
