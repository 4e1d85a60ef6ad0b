//! # Trackstate Graph
//!
//! 整圖操作：遞迴髒狀態評估、追蹤切換與階層遍歷

pub mod evaluator;
pub mod toggle;
pub mod walk;

// Re-export 主要類型
pub use evaluator::{DirtyScope, GraphDirtyEvaluator};
pub use toggle::GraphTrackingToggle;
pub use walk::HierarchyWalker;

use trackstate_core::{Result, Trackable};

/// 以預設配置評估節點與可達欄位是否為髒
pub fn is_dirty(node: &dyn Trackable) -> Result<bool> {
    GraphDirtyEvaluator::default().is_dirty(node)
}

/// 以預設配置重置整個可達圖
pub fn reset_dirty_status(root: &dyn Trackable, recurse: bool) -> Result<usize> {
    GraphTrackingToggle::default().reset_dirty_status(root, recurse)
}

/// 以預設配置開始追蹤整個可達圖
pub fn start_tracking_changes_in_state(
    root: &dyn Trackable,
    compare_before_marking_dirty: bool,
    recurse: bool,
) -> Result<usize> {
    GraphTrackingToggle::default().start_tracking_changes_in_state(
        root,
        compare_before_marking_dirty,
        recurse,
    )
}

/// 以預設配置停止追蹤整個可達圖
pub fn stop_tracking_changes_in_state(root: &dyn Trackable, recurse: bool) -> Result<usize> {
    GraphTrackingToggle::default().stop_tracking_changes_in_state(root, recurse)
}
