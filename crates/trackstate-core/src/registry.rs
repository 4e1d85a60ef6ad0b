//! 可轉換型別登錄表

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::trackable::Trackable;

type Converter = for<'a> fn(&'a (dyn Any + 'static)) -> Option<&'a dyn Trackable>;

fn convert_as<'a, T: Trackable + 'static>(
    value: &'a (dyn Any + 'static),
) -> Option<&'a dyn Trackable> {
    value.downcast_ref::<T>().map(|node| node as &dyn Trackable)
}

/// 顯式登記「可轉換為可追蹤節點」的型別
///
/// 欄位以 [`FieldRef::Value`](crate::FieldRef::Value) 回報的值，
/// 若其型別已登記，評估器與遍歷器會把它視為可追蹤節點。
#[derive(Default, Clone)]
pub struct ConvertibleRegistry {
    converters: HashMap<TypeId, Converter>,
}

impl ConvertibleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登記型別
    pub fn register<T: Trackable + 'static>(&mut self) -> &mut Self {
        self.converters.insert(TypeId::of::<T>(), convert_as::<T>);
        self
    }

    /// 建構器模式：登記型別
    pub fn with<T: Trackable + 'static>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn is_convertible(&self, type_id: TypeId) -> bool {
        self.converters.contains_key(&type_id)
    }

    /// 將值轉換為可追蹤節點；未登記的型別回傳 `None`
    pub fn convert<'a>(&self, value: &'a (dyn Any + 'static)) -> Option<&'a dyn Trackable> {
        let converter = self.converters.get(&(*value).type_id())?;
        converter(value)
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for ConvertibleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertibleRegistry")
            .field("registered", &self.converters.len())
            .finish()
    }
}
