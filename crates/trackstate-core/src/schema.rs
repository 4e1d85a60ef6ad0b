//! 欄位描述（取代執行期反射的顯式 schema）

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;

use crate::trackable::{CollectionTracking, MapTracking, Trackable};

/// 可追蹤容器的四種形狀
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerShape {
    /// 無序集合
    Collection,
    /// 有序序列
    List,
    /// 集合（不重複）
    Set,
    /// 鍵值映射
    Map,
}

impl ContainerShape {
    pub fn is_map(self) -> bool {
        matches!(self, ContainerShape::Map)
    }
}

/// 欄位宣告的靜態類別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 純量或不可追蹤的值
    Scalar,
    /// 可追蹤節點
    Node,
    /// 容器欄位
    Container(ContainerShape),
}

impl FieldKind {
    pub fn container_shape(self) -> Option<ContainerShape> {
        match self {
            FieldKind::Container(shape) => Some(shape),
            _ => None,
        }
    }
}

/// 欄位宣告標記
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMarkers {
    /// 排除於追蹤之外（切斷遞迴下降）
    pub excluded: bool,
    /// 組合關係（僅自身模式下也會下降）
    pub composition: bool,
    /// 宣告此欄位的型別可轉換為可追蹤節點
    pub convertible: bool,
}

/// 欄位來源
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldOrigin {
    /// 領域型別宣告的欄位
    #[default]
    Domain,
    /// 平台或函式庫型別宣告的欄位
    Library,
    /// 編譯器或工具注入的合成欄位
    Synthetic,
    /// 追蹤簿記本身的內部欄位
    Bookkeeping,
}

/// 欄位描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub markers: FieldMarkers,
    pub origin: FieldOrigin,
    /// 宣告型別（用於可轉換型別登錄表查詢）
    pub declared_type: Option<TypeId>,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            markers: FieldMarkers {
                excluded: false,
                composition: false,
                convertible: false,
            },
            origin: FieldOrigin::Domain,
            declared_type: None,
        }
    }

    pub const fn scalar(name: &'static str) -> Self {
        Self::new(name, FieldKind::Scalar)
    }

    pub const fn node(name: &'static str) -> Self {
        Self::new(name, FieldKind::Node)
    }

    pub const fn container(name: &'static str, shape: ContainerShape) -> Self {
        Self::new(name, FieldKind::Container(shape))
    }

    /// 容器元素的描述（元素屬於容器本身，視為組合關係）
    pub const fn element() -> Self {
        Self::node("<element>").composition()
    }

    /// 建構器模式：排除於追蹤之外
    pub const fn excluded(mut self) -> Self {
        self.markers.excluded = true;
        self
    }

    /// 建構器模式：組合關係
    pub const fn composition(mut self) -> Self {
        self.markers.composition = true;
        self
    }

    /// 建構器模式：可轉換為可追蹤節點
    pub const fn convertible(mut self) -> Self {
        self.markers.convertible = true;
        self
    }

    /// 建構器模式：設置欄位來源
    pub const fn with_origin(mut self, origin: FieldOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// 建構器模式：設置宣告型別
    pub fn declared<T: Any>(mut self) -> Self {
        self.declared_type = Some(TypeId::of::<T>());
        self
    }

    pub fn is_excluded(&self) -> bool {
        self.markers.excluded
    }

    pub fn is_composition(&self) -> bool {
        self.markers.composition
    }
}

/// 欄位目前的值
///
/// 取代反射讀取：節點在 [`Trackable::for_each_field`] 中以此回報每個欄位的內容。
#[derive(Clone, Copy)]
pub enum FieldRef<'a> {
    /// 值不存在
    Absent,
    /// 可追蹤節點
    Node(&'a dyn Trackable),
    /// 已包裝的集合、序列或 set
    Collection(&'a dyn CollectionTracking),
    /// 已包裝的映射
    Map(&'a dyn MapTracking),
    /// 其他值（純量、未包裝的容器、可轉換型別）
    Value(&'a (dyn Any + 'static)),
}

impl<'a> FieldRef<'a> {
    pub fn value<T: Any>(value: &'a T) -> Self {
        FieldRef::Value(value)
    }

    /// `Option` 欄位：`None` 視為不存在
    pub fn optional_node<T: Trackable>(node: Option<&'a T>) -> Self {
        match node {
            Some(node) => FieldRef::Node(node),
            None => FieldRef::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldRef::Absent)
    }

    /// 值本身是否具備可追蹤能力
    pub fn is_tracker(&self) -> bool {
        matches!(
            self,
            FieldRef::Node(_) | FieldRef::Collection(_) | FieldRef::Map(_)
        )
    }

    /// 以可追蹤節點檢視（`Value` 與 `Absent` 回傳 `None`）
    pub fn as_trackable(&self) -> Option<&'a dyn Trackable> {
        match *self {
            FieldRef::Node(node) => Some(node),
            FieldRef::Collection(collection) => Some(collection.as_trackable()),
            FieldRef::Map(map) => Some(map.as_trackable()),
            FieldRef::Absent | FieldRef::Value(_) => None,
        }
    }

    /// `Value` 的執行期型別
    pub fn runtime_type(&self) -> Option<TypeId> {
        match self {
            FieldRef::Value(value) => Some((**value).type_id()),
            _ => None,
        }
    }
}

impl fmt::Debug for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Absent => f.write_str("Absent"),
            FieldRef::Node(node) => write!(f, "Node({})", node.type_name()),
            FieldRef::Collection(collection) => {
                write!(f, "Collection({:?}, len={})", collection.shape(), collection.len())
            }
            FieldRef::Map(map) => write!(f, "Map(len={})", map.len()),
            FieldRef::Value(_) => f.write_str("Value(..)"),
        }
    }
}
