//! 追蹤狀態模型

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// 節點的追蹤狀態
///
/// 四個旗標彼此獨立：
/// - `dirty`：自上次重置以來，節點本身或被攔截的容器發生過變更
/// - `new`：節點代表尚未持久化的實體
/// - `tracking_enabled`：目前是否觀察變更
/// - `compare_before_marking_dirty`：純量欄位賦值前是否先比較舊值
///
/// 旗標以 `Cell` 存放，型別本身不是 `Sync`；跨執行緒共用必須由呼叫端自行同步。
#[derive(Debug, Default)]
pub struct TrackingStatus {
    dirty: Cell<bool>,
    new: Cell<bool>,
    tracking_enabled: Cell<bool>,
    compare_before_marking_dirty: Cell<bool>,
}

impl TrackingStatus {
    /// 創建乾淨且未追蹤的狀態
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn is_new(&self) -> bool {
        self.new.get()
    }

    pub fn is_tracking_enabled(&self) -> bool {
        self.tracking_enabled.get()
    }

    pub fn compare_before_marking_dirty(&self) -> bool {
        self.compare_before_marking_dirty.get()
    }

    /// 無條件標記為髒
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    /// 標記為新實體
    pub fn mark_new(&self) {
        self.new.set(true);
    }

    /// 開始追蹤，同時寫入比較模式
    pub fn start_tracking(&self, compare_before_marking_dirty: bool) {
        self.tracking_enabled.set(true);
        self.compare_before_marking_dirty
            .set(compare_before_marking_dirty);
    }

    /// 停止追蹤（比較模式保持不變）
    pub fn stop_tracking(&self) {
        self.tracking_enabled.set(false);
    }

    /// 重置為乾淨狀態：清除 dirty 與 new
    pub fn reset(&self) {
        self.dirty.set(false);
        self.new.set(false);
    }

    /// 純量欄位賦值
    ///
    /// 追蹤啟用時，若 `compare_before_marking_dirty` 為 true 則只有新舊值不同才標記；
    /// 否則任何賦值都會標記。追蹤停用時只寫入值。
    ///
    /// 回傳是否標記為髒。
    pub fn assign<T: PartialEq>(&self, slot: &mut T, value: T) -> bool {
        let marked = self.is_tracking_enabled()
            && (!self.compare_before_marking_dirty() || *slot != value);
        *slot = value;
        if marked {
            self.mark_dirty();
        }
        marked
    }

    /// 取得旗標快照
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            dirty: self.is_dirty(),
            new: self.is_new(),
            tracking_enabled: self.is_tracking_enabled(),
            compare_before_marking_dirty: self.compare_before_marking_dirty(),
        }
    }
}

/// 追蹤狀態快照（供持久層診斷）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub dirty: bool,
    pub new: bool,
    pub tracking_enabled: bool,
    pub compare_before_marking_dirty: bool,
}

/// 節點獨佔持有的追蹤狀態
///
/// 不實作 `Clone`：節點是唯一的強引用持有者，容器只能取得 [`OwnerRef`]。
#[derive(Debug, Default)]
pub struct StatusHandle(Rc<TrackingStatus>);

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：創建時即開始追蹤
    pub fn tracking(compare_before_marking_dirty: bool) -> Self {
        let handle = Self::new();
        handle.start_tracking(compare_before_marking_dirty);
        handle
    }

    /// 建構器模式：標記為新實體
    pub fn with_new(self) -> Self {
        self.mark_new();
        self
    }

    /// 取得非擁有的反向引用
    pub fn downgrade(&self) -> OwnerRef {
        OwnerRef(Rc::downgrade(&self.0))
    }

    /// 狀態的身分識別
    ///
    /// 在狀態存活期間穩定且唯一，與擁有節點在記憶體中的位置無關。
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl Deref for StatusHandle {
    type Target = TrackingStatus;

    fn deref(&self) -> &TrackingStatus {
        &self.0
    }
}

/// 容器指向擁有節點的非擁有反向引用
///
/// 只用於推送髒通知，不影響擁有節點的生命週期。
#[derive(Debug, Clone, Default)]
pub struct OwnerRef(Weak<TrackingStatus>);

impl OwnerRef {
    /// 沒有擁有者的引用（獨立容器）
    pub fn detached() -> Self {
        Self(Weak::new())
    }

    /// 擁有者是否仍存在
    pub fn is_attached(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// 通知擁有者已變更
    ///
    /// 只有擁有者存在且正在追蹤時才會標記。回傳是否標記成功。
    pub fn notify_dirty(&self) -> bool {
        match self.0.upgrade() {
            Some(status) if status.is_tracking_enabled() => {
                status.mark_dirty();
                true
            }
            Some(_) => false,
            None => {
                tracing::trace!("擁有節點已釋放，忽略髒通知");
                false
            }
        }
    }

    /// 是否指向指定的狀態
    pub fn points_to(&self, handle: &StatusHandle) -> bool {
        Weak::ptr_eq(&self.0, &Rc::downgrade(&handle.0))
    }
}
