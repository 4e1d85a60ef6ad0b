//! 延遲欄位升級：第一次使用時把一般容器換成可追蹤容器

use std::any::Any;
use std::fmt;

use trackstate_core::{
    ContainerShape, FieldDescriptor, FieldRef, OwnerRef, Result, StatusHandle, TrackError,
    Trackable,
};

use crate::collection::TrackedCollection;
use crate::delegate::{CollectionDelegate, ListDelegate, MapDelegate, SetDelegate};
use crate::list::TrackedList;
use crate::map::TrackedMap;
use crate::set::TrackedSet;

/// 可由升級建立的可追蹤容器
pub trait TrackedWrapper: Sized {
    /// 被包裝的一般容器
    type Delegate: Default + Any;

    /// 包裝器對應的容器形狀
    const SHAPE: ContainerShape;

    fn wrap(delegate: Self::Delegate, owner: OwnerRef) -> Self;

    fn delegate(&self) -> &Self::Delegate;

    /// 以可追蹤節點檢視（用於傳遞追蹤旗標）
    fn node(&self) -> &dyn Trackable;

    /// 以欄位值回報
    fn field_ref(&self) -> FieldRef<'_>;
}

impl<T, C> TrackedWrapper for TrackedCollection<T, C>
where
    T: Clone + PartialEq + 'static,
    C: CollectionDelegate<T> + 'static,
{
    type Delegate = C;
    const SHAPE: ContainerShape = ContainerShape::Collection;

    fn wrap(delegate: C, owner: OwnerRef) -> Self {
        TrackedCollection::new(delegate, owner)
    }

    fn delegate(&self) -> &C {
        TrackedCollection::delegate(self)
    }

    fn node(&self) -> &dyn Trackable {
        self
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Collection(self)
    }
}

impl<T, L> TrackedWrapper for TrackedList<T, L>
where
    T: Clone + PartialEq + 'static,
    L: ListDelegate<T> + 'static,
{
    type Delegate = L;
    const SHAPE: ContainerShape = ContainerShape::List;

    fn wrap(delegate: L, owner: OwnerRef) -> Self {
        TrackedList::new(delegate, owner)
    }

    fn delegate(&self) -> &L {
        self.as_collection().delegate()
    }

    fn node(&self) -> &dyn Trackable {
        self.as_collection()
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Collection(self.as_collection())
    }
}

impl<T, S> TrackedWrapper for TrackedSet<T, S>
where
    T: Clone + PartialEq + 'static,
    S: SetDelegate<T> + 'static,
{
    type Delegate = S;
    const SHAPE: ContainerShape = ContainerShape::Set;

    fn wrap(delegate: S, owner: OwnerRef) -> Self {
        TrackedSet::new(delegate, owner)
    }

    fn delegate(&self) -> &S {
        self.as_collection().delegate()
    }

    fn node(&self) -> &dyn Trackable {
        self.as_collection()
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Collection(self.as_collection())
    }
}

impl<K, V, M> TrackedWrapper for TrackedMap<K, V, M>
where
    K: Clone + PartialEq + 'static,
    V: 'static,
    M: MapDelegate<K, V> + 'static,
{
    type Delegate = M;
    const SHAPE: ContainerShape = ContainerShape::Map;

    fn wrap(delegate: M, owner: OwnerRef) -> Self {
        TrackedMap::new(delegate, owner)
    }

    fn delegate(&self) -> &M {
        TrackedMap::delegate(self)
    }

    fn node(&self) -> &dyn Trackable {
        self
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Map(self)
    }
}

/// 可升級的容器欄位
///
/// 升級是這個列舉上的一次狀態轉換，之後永遠保持 `Tracked`。
pub enum TrackedField<W: TrackedWrapper> {
    Unwrapped(W::Delegate),
    Tracked(W),
}

impl<W: TrackedWrapper> TrackedField<W> {
    pub fn unwrapped(delegate: W::Delegate) -> Self {
        TrackedField::Unwrapped(delegate)
    }

    pub fn is_tracked(&self) -> bool {
        matches!(self, TrackedField::Tracked(_))
    }

    /// 讀取委派容器（不論是否已包裝）
    pub fn get(&self) -> &W::Delegate {
        match self {
            TrackedField::Unwrapped(delegate) => delegate,
            TrackedField::Tracked(wrapper) => wrapper.delegate(),
        }
    }

    pub fn as_tracked(&self) -> Option<&W> {
        match self {
            TrackedField::Tracked(wrapper) => Some(wrapper),
            TrackedField::Unwrapped(_) => None,
        }
    }

    pub fn as_tracked_mut(&mut self) -> Option<&mut W> {
        match self {
            TrackedField::Tracked(wrapper) => Some(wrapper),
            TrackedField::Unwrapped(_) => None,
        }
    }

    /// 以欄位值回報：已包裝為追蹤器，未包裝為一般值
    pub fn field_ref(&self) -> FieldRef<'_> {
        match self {
            TrackedField::Unwrapped(delegate) => FieldRef::Value(delegate),
            TrackedField::Tracked(wrapper) => wrapper.field_ref(),
        }
    }

    /// 依擁有節點的追蹤狀態決定是否升級，見 [`FieldPromoter::promote`]
    pub fn promote(
        &mut self,
        owner: Option<&StatusHandle>,
        field: &FieldDescriptor,
    ) -> Result<&mut Self> {
        FieldPromoter::promote(owner, field, self)
    }
}

impl<W: TrackedWrapper> Default for TrackedField<W> {
    fn default() -> Self {
        TrackedField::Unwrapped(W::Delegate::default())
    }
}

impl<W> fmt::Debug for TrackedField<W>
where
    W: TrackedWrapper + fmt::Debug,
    W::Delegate: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackedField::Unwrapped(delegate) => f.debug_tuple("Unwrapped").field(delegate).finish(),
            TrackedField::Tracked(wrapper) => f.debug_tuple("Tracked").field(wrapper).finish(),
        }
    }
}

/// 欄位升級器
pub struct FieldPromoter;

impl FieldPromoter {
    /// 依擁有節點的追蹤狀態與欄位目前的包裝狀態決定是否升級
    ///
    /// 1. 擁有節點正在追蹤且欄位未包裝：驗證宣告形狀，包裝並沿用擁有節點的比較模式開始追蹤，原地替換
    /// 2. 擁有節點未追蹤且欄位已包裝：保持原樣（包裝不會還原）
    /// 3. 其他組合：保持原樣
    ///
    /// 擁有節點缺少追蹤狀態時記錄警告並回傳未包裝的值。
    pub fn promote<'f, W: TrackedWrapper>(
        owner: Option<&StatusHandle>,
        field: &FieldDescriptor,
        slot: &'f mut TrackedField<W>,
    ) -> Result<&'f mut TrackedField<W>> {
        let Some(status) = owner else {
            tracing::warn!("欄位 {} 的擁有節點缺少追蹤狀態，維持未包裝", field.name);
            return Ok(slot);
        };

        let tracking = status.is_tracking_enabled();
        match slot {
            TrackedField::Unwrapped(delegate) if tracking => {
                let declared = field
                    .kind
                    .container_shape()
                    .ok_or(TrackError::NotAContainer { field: field.name })?;
                if declared != W::SHAPE {
                    return Err(TrackError::ShapeMismatch {
                        field: field.name,
                        declared,
                        actual: W::SHAPE,
                    });
                }

                let wrapper = W::wrap(std::mem::take(delegate), status.downgrade());
                wrapper
                    .node()
                    .enable_tracking(status.compare_before_marking_dirty());
                *slot = TrackedField::Tracked(wrapper);
                tracing::debug!("欄位 {} 已升級為 {:?} 追蹤容器", field.name, declared);
            }
            TrackedField::Tracked(_) if !tracking => {
                tracing::trace!("欄位 {} 已包裝，追蹤停用時保持不變", field.name);
            }
            _ => {}
        }
        Ok(slot)
    }
}
