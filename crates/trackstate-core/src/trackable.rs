//! 可追蹤節點能力

use std::ops::ControlFlow;
use std::rc::Rc;

use crate::schema::{ContainerShape, FieldDescriptor, FieldRef};
use crate::status::StatusHandle;

/// 可追蹤節點
///
/// 節點公開自己的追蹤狀態，並透過 [`for_each_field`](Trackable::for_each_field)
/// 顯式列出欄位（含「繼承」自內嵌基底結構的欄位）。
/// 遞迴的 `is_dirty` 與整圖開始/停止追蹤由 `trackstate-graph` 提供。
pub trait Trackable {
    /// 節點的追蹤狀態；不一致的節點可能回傳 `None`
    fn tracking_status(&self) -> Option<&StatusHandle>;

    /// 依序回報每個欄位；回呼回傳 `Break` 時停止列舉
    fn for_each_field(
        &self,
        _visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// 型別名稱（診斷用）
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// 僅節點本身是否為髒
    fn is_this_dirty(&self) -> bool {
        self.tracking_status().map_or(false, |status| status.is_dirty())
    }

    fn is_new(&self) -> bool {
        self.tracking_status().map_or(false, |status| status.is_new())
    }

    fn is_tracking(&self) -> bool {
        self.tracking_status()
            .map_or(false, |status| status.is_tracking_enabled())
    }

    /// 無條件標記為髒
    fn touch(&self) {
        match self.tracking_status() {
            Some(status) => status.mark_dirty(),
            None => tracing::warn!("節點 {} 缺少追蹤狀態，無法標記為髒", self.type_name()),
        }
    }

    /// 標記為新實體
    fn mark_as_new(&self) {
        match self.tracking_status() {
            Some(status) => status.mark_new(),
            None => tracing::warn!("節點 {} 缺少追蹤狀態，無法標記為新", self.type_name()),
        }
    }

    /// 清除 dirty 與 new（不遞迴）
    fn reset_dirty_state(&self) {
        if let Some(status) = self.tracking_status() {
            status.reset();
        }
    }

    /// 啟用本節點的追蹤（不遞迴）
    fn enable_tracking(&self, compare_before_marking_dirty: bool) {
        if let Some(status) = self.tracking_status() {
            status.start_tracking(compare_before_marking_dirty);
        }
    }

    /// 停用本節點的追蹤（不遞迴）
    fn disable_tracking(&self) {
        if let Some(status) = self.tracking_status() {
            status.stop_tracking();
        }
    }
}

macro_rules! forward_trackable {
    ($($pointer:ident),*) => {$(
        /// 共享或裝箱的節點沿用內部節點的追蹤狀態與欄位
        impl<T: Trackable + ?Sized> Trackable for $pointer<T> {
            fn tracking_status(&self) -> Option<&StatusHandle> {
                (**self).tracking_status()
            }

            fn for_each_field(
                &self,
                visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
            ) -> ControlFlow<()> {
                (**self).for_each_field(visit)
            }

            fn type_name(&self) -> &'static str {
                (**self).type_name()
            }

            fn is_this_dirty(&self) -> bool {
                (**self).is_this_dirty()
            }

            fn touch(&self) {
                (**self).touch()
            }

            fn mark_as_new(&self) {
                (**self).mark_as_new()
            }

            fn reset_dirty_state(&self) {
                (**self).reset_dirty_state()
            }

            fn enable_tracking(&self, compare_before_marking_dirty: bool) {
                (**self).enable_tracking(compare_before_marking_dirty)
            }

            fn disable_tracking(&self) {
                (**self).disable_tracking()
            }
        }
    )*};
}

forward_trackable!(Box, Rc);

/// 集合追蹤能力（無序集合、有序序列、set）
pub trait CollectionTracking: Trackable {
    fn shape(&self) -> ContainerShape;

    /// 容器自身簿記或其元素節點是否為髒
    fn is_dirty(&self) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn new_entry_count(&self) -> usize;

    fn removed_entry_count(&self) -> usize;

    fn as_trackable(&self) -> &dyn Trackable;
}

/// 映射追蹤能力
pub trait MapTracking: Trackable {
    /// 容器自身簿記或其值節點是否為髒
    fn is_dirty(&self) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn new_key_count(&self) -> usize;

    fn removed_key_count(&self) -> usize;

    fn updated_key_count(&self) -> usize;

    fn as_trackable(&self) -> &dyn Trackable;
}
