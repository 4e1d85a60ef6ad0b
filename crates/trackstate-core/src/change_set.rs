//! 變更集簿記

use std::cell::RefCell;

use crate::status::StatusHandle;

/// 容器的變更集追蹤器
///
/// 記錄自上次檢查點以來新增、移除與覆寫的項目。
/// 新增一個先前被移除的項目會互相抵銷，反之亦然。
/// 只有追蹤器自己的追蹤啟用時才會記錄。
#[derive(Debug)]
pub struct ChangeSetTracker<T> {
    status: StatusHandle,
    added: RefCell<Vec<T>>,
    removed: RefCell<Vec<T>>,
    updated: RefCell<Vec<T>>,
}

impl<T> Default for ChangeSetTracker<T> {
    fn default() -> Self {
        Self {
            status: StatusHandle::new(),
            added: RefCell::new(Vec::new()),
            removed: RefCell::new(Vec::new()),
            updated: RefCell::new(Vec::new()),
        }
    }
}

impl<T: Clone + PartialEq> ChangeSetTracker<T> {
    /// 創建未追蹤的空追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 追蹤器自己的狀態
    pub fn status(&self) -> &StatusHandle {
        &self.status
    }

    pub fn is_tracking(&self) -> bool {
        self.status.is_tracking_enabled()
    }

    /// 記錄新增的項目
    pub fn record_added(&self, entry: T) {
        if !self.is_tracking() {
            return;
        }
        let mut removed = self.removed.borrow_mut();
        if let Some(pos) = removed.iter().position(|e| *e == entry) {
            removed.remove(pos);
            return;
        }
        self.added.borrow_mut().push(entry);
    }

    /// 記錄移除的項目
    pub fn record_removed(&self, entry: T) {
        if !self.is_tracking() {
            return;
        }
        let mut added = self.added.borrow_mut();
        if let Some(pos) = added.iter().position(|e| *e == entry) {
            added.remove(pos);
            return;
        }
        drop(added);
        self.updated.borrow_mut().retain(|e| *e != entry);
        self.removed.borrow_mut().push(entry);
    }

    /// 記錄被覆寫的項目（映射的鍵）
    pub fn record_updated(&self, entry: T) {
        if !self.is_tracking() {
            return;
        }
        if self.added.borrow().contains(&entry) || self.updated.borrow().contains(&entry) {
            return;
        }
        self.updated.borrow_mut().push(entry);
    }

    /// 是否有任何變更（含明確標記）
    pub fn is_dirty(&self) -> bool {
        self.status.is_dirty()
            || !self.added.borrow().is_empty()
            || !self.removed.borrow().is_empty()
            || !self.updated.borrow().is_empty()
    }

    /// 自上次檢查點以來新增的項目
    pub fn new_entries(&self) -> Vec<T> {
        self.added.borrow().clone()
    }

    /// 自上次檢查點以來移除的項目
    pub fn removed_entries(&self) -> Vec<T> {
        self.removed.borrow().clone()
    }

    /// 自上次檢查點以來被覆寫的項目
    pub fn updated_entries(&self) -> Vec<T> {
        self.updated.borrow().clone()
    }

    pub fn new_entry_count(&self) -> usize {
        self.added.borrow().len()
    }

    pub fn removed_entry_count(&self) -> usize {
        self.removed.borrow().len()
    }

    pub fn updated_entry_count(&self) -> usize {
        self.updated.borrow().len()
    }

    /// 從目前內容中篩出未變更的項目
    pub fn unchanged_entries<'a, I>(&self, current: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let added = self.added.borrow();
        let updated = self.updated.borrow();
        current
            .into_iter()
            .filter(|entry| !added.contains(entry) && !updated.contains(entry))
            .collect()
    }

    /// 開始追蹤
    ///
    /// 追蹤器本身沒有子節點，`recurse` 由持有它的容器處理。
    pub fn start_tracking(&self, _recurse: bool, compare_before_marking_dirty: bool) {
        self.status.start_tracking(compare_before_marking_dirty);
    }

    /// 停止追蹤（已記錄的變更保留）
    pub fn stop_tracking(&self, _recurse: bool) {
        self.status.stop_tracking();
    }

    /// 檢查點：清除所有簿記與 dirty/new 旗標
    pub fn reset(&self) {
        self.added.borrow_mut().clear();
        self.removed.borrow_mut().clear();
        self.updated.borrow_mut().clear();
        self.status.reset();
    }

    pub fn mark_as_new(&self) {
        self.status.mark_new();
    }

    pub fn mark_dirty(&self) {
        self.status.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracking_tracker() -> ChangeSetTracker<&'static str> {
        let tracker = ChangeSetTracker::new();
        tracker.start_tracking(true, true);
        tracker
    }

    #[test]
    fn test_ignores_changes_while_not_tracking() {
        let tracker = ChangeSetTracker::new();
        tracker.record_added("a");
        tracker.record_removed("b");

        assert!(!tracker.is_dirty());
        assert!(tracker.new_entries().is_empty());
        assert!(tracker.removed_entries().is_empty());
    }

    #[test]
    fn test_add_then_remove_cancels_out() {
        let tracker = tracking_tracker();
        tracker.record_added("a");
        assert!(tracker.is_dirty());

        tracker.record_removed("a");
        assert!(!tracker.is_dirty());
        assert!(tracker.new_entries().is_empty());
        assert!(tracker.removed_entries().is_empty());
    }

    #[test]
    fn test_remove_then_add_cancels_out() {
        let tracker = tracking_tracker();
        tracker.record_removed("a");
        assert_eq!(tracker.removed_entries(), vec!["a"]);

        tracker.record_added("a");
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_updated_entries() {
        let tracker = tracking_tracker();
        tracker.record_updated("k");
        tracker.record_updated("k");
        assert_eq!(tracker.updated_entries(), vec!["k"]);

        // 新增後覆寫仍然算新增
        tracker.record_added("n");
        tracker.record_updated("n");
        assert_eq!(tracker.updated_entry_count(), 1);

        // 移除後不再算覆寫
        tracker.record_removed("k");
        assert!(tracker.updated_entries().is_empty());
        assert_eq!(tracker.removed_entries(), vec!["k"]);
    }

    #[test]
    fn test_unchanged_entries() {
        let tracker = tracking_tracker();
        tracker.record_added("b");
        let current = vec!["a", "b", "c"];

        let unchanged = tracker.unchanged_entries(&current);

        assert_eq!(unchanged, vec![&"a", &"c"]);
    }

    #[test]
    fn test_reset_clears_bookkeeping() {
        let tracker = tracking_tracker();
        tracker.record_added("a");
        tracker.record_removed("b");
        tracker.mark_as_new();

        tracker.reset();

        assert!(!tracker.is_dirty());
        assert!(!tracker.status().is_new());
        assert!(tracker.is_tracking());
    }

    #[test]
    fn test_stop_keeps_recorded_changes() {
        let tracker = tracking_tracker();
        tracker.record_added("a");

        tracker.stop_tracking(true);
        tracker.record_added("b");

        assert_eq!(tracker.new_entries(), vec!["a"]);
        assert!(tracker.status().compare_before_marking_dirty());
    }
}
