//! # Trackstate Core
//!
//! 髒狀態追蹤核心：追蹤狀態、可追蹤節點能力、欄位描述與變更集簿記

pub mod change_set;
pub mod config;
pub mod registry;
pub mod schema;
pub mod status;
pub mod trackable;

// Re-export 主要類型
pub use change_set::ChangeSetTracker;
pub use config::TrackingConfig;
pub use registry::ConvertibleRegistry;
pub use schema::{ContainerShape, FieldDescriptor, FieldKind, FieldMarkers, FieldOrigin, FieldRef};
pub use status::{OwnerRef, StatusHandle, StatusSnapshot, TrackingStatus};
pub use trackable::{CollectionTracking, MapTracking, Trackable};

/// 追蹤錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("欄位 {field} 的宣告型別不是可追蹤的容器")]
    NotAContainer { field: &'static str },

    #[error("欄位 {field} 宣告為 {declared:?}，但包裝器為 {actual:?}")]
    ShapeMismatch {
        field: &'static str,
        declared: ContainerShape,
        actual: ContainerShape,
    },

    #[error("欄位 {field} 宣告為 {expected:?}，但其值無法視為對應的追蹤器")]
    TrackerTypeMismatch {
        field: &'static str,
        expected: ContainerShape,
    },

    #[error("欄位 {field} 的值無法轉換為可追蹤節點")]
    NotTrackable { field: &'static str },

    #[error("索引超出範圍: {index}（長度 {len}）")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("圖遍歷超過最大深度 {0}")]
    DepthExceeded(usize),

    #[error("無效的追蹤配置: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TrackError>;
