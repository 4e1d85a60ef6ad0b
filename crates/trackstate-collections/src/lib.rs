//! # Trackstate Collections
//!
//! 可追蹤容器家族與延遲欄位升級

pub mod collection;
pub mod delegate;
pub mod list;
pub mod map;
pub mod promote;
pub mod set;

// Re-export 主要類型
pub use collection::TrackedCollection;
pub use delegate::{CollectionDelegate, ListDelegate, MapDelegate, SetDelegate};
pub use list::TrackedList;
pub use map::TrackedMap;
pub use promote::{FieldPromoter, TrackedField, TrackedWrapper};
pub use set::TrackedSet;

/// 有序序列欄位
pub type ListField<T> = TrackedField<TrackedList<T>>;

/// 無序集合欄位
pub type CollectionField<T> = TrackedField<TrackedCollection<T>>;

/// Set 欄位
pub type SetField<T> = TrackedField<TrackedSet<T>>;

/// 映射欄位
pub type MapField<K, V> = TrackedField<TrackedMap<K, V>>;
