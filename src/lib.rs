//! # Trackstate
//!
//! 領域物件的髒狀態追蹤：節點追蹤狀態、可追蹤容器、延遲欄位升級與整圖操作
//!
//! ## 使用範例
//!
//! ```
//! use std::ops::ControlFlow;
//! use trackstate::prelude::*;
//!
//! struct Customer {
//!     status: StatusHandle,
//!     name: String,
//! }
//!
//! const NAME: FieldDescriptor = FieldDescriptor::scalar("name");
//!
//! impl Trackable for Customer {
//!     fn tracking_status(&self) -> Option<&StatusHandle> {
//!         Some(&self.status)
//!     }
//!
//!     fn for_each_field(
//!         &self,
//!         visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
//!     ) -> ControlFlow<()> {
//!         visit(&NAME, FieldRef::value(&self.name))
//!     }
//! }
//!
//! let mut customer = Customer {
//!     status: StatusHandle::new(),
//!     name: "Alice".to_string(),
//! };
//! GraphTrackingToggle::default().start_tracking_default(&customer, true).unwrap();
//!
//! let status = &customer.status;
//! status.assign(&mut customer.name, "Alice".to_string());
//! assert!(!customer.is_this_dirty());
//!
//! status.assign(&mut customer.name, "Bob".to_string());
//! assert!(GraphDirtyEvaluator::default().is_dirty(&customer).unwrap());
//! ```

pub use {trackstate_collections, trackstate_core, trackstate_graph};

pub use trackstate_core::{Result, TrackError};

/// 常用類型
pub mod prelude {
    pub use trackstate_collections::{
        CollectionField, FieldPromoter, ListField, MapField, SetField, TrackedCollection,
        TrackedField, TrackedList, TrackedMap, TrackedSet,
    };
    pub use trackstate_core::{
        ChangeSetTracker, CollectionTracking, ContainerShape, ConvertibleRegistry,
        FieldDescriptor, FieldKind, FieldOrigin, FieldRef, MapTracking, OwnerRef, StatusHandle,
        TrackError, Trackable, TrackingConfig,
    };
    pub use trackstate_graph::{
        DirtyScope, GraphDirtyEvaluator, GraphTrackingToggle, HierarchyWalker,
    };
}
