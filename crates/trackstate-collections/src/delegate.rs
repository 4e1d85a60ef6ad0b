//! 容器委派形狀
//!
//! 被包裝的容器必須實作其中一種形狀；其他型別無法包裝。

use std::collections::{btree_map, btree_set, hash_map, hash_set, vec_deque};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// 集合形狀（無序集合、序列與 set 的共同介面）
pub trait CollectionDelegate<T>: Default {
    type Iter<'a>: Iterator<Item = &'a T>
    where
        Self: 'a,
        T: 'a;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, item: &T) -> bool;

    /// 加入項目，回傳是否造成結構變更
    fn insert(&mut self, item: T) -> bool;

    /// 移除一個相等的項目
    fn remove(&mut self, item: &T) -> Option<T>;

    /// 只保留 `keep` 為 true 的項目，回傳被移除的項目
    fn retain_with(&mut self, keep: &mut dyn FnMut(&T) -> bool) -> Vec<T>;

    /// 取出全部項目
    fn drain_all(&mut self) -> Vec<T>;

    fn iter(&self) -> Self::Iter<'_>;
}

/// 有序序列形狀
pub trait ListDelegate<T>: CollectionDelegate<T> {
    fn get(&self, index: usize) -> Option<&T>;

    /// 取代索引位置的值；索引越界回傳 `None`
    fn replace(&mut self, index: usize, item: T) -> Option<T>;

    /// 在索引位置插入；索引越界回傳 false
    fn insert_at(&mut self, index: usize, item: T) -> bool;

    /// 在索引位置依序插入多個項目；索引越界回傳 false
    fn insert_all_at(&mut self, index: usize, items: Vec<T>) -> bool;

    fn remove_at(&mut self, index: usize) -> Option<T>;
}

/// Set 形狀（不重複）
pub trait SetDelegate<T>: CollectionDelegate<T> {}

/// 鍵值映射形狀
pub trait MapDelegate<K, V>: Default {
    type Iter<'a>: Iterator<Item = (&'a K, &'a V)>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key(&self, key: &K) -> bool;

    fn get(&self, key: &K) -> Option<&V>;

    /// 寫入鍵值，回傳先前的值
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    fn remove(&mut self, key: &K) -> Option<V>;

    fn drain_all(&mut self) -> Vec<(K, V)>;

    fn iter(&self) -> Self::Iter<'_>;
}

fn partition_out<T>(items: impl IntoIterator<Item = T>, keep: &mut dyn FnMut(&T) -> bool) -> (Vec<T>, Vec<T>) {
    let mut kept = Vec::new();
    let mut removed = Vec::new();
    for item in items {
        if keep(&item) {
            kept.push(item);
        } else {
            removed.push(item);
        }
    }
    (kept, removed)
}

impl<T: PartialEq> CollectionDelegate<T> for Vec<T> {
    type Iter<'a> = std::slice::Iter<'a, T> where T: 'a;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn contains(&self, item: &T) -> bool {
        <[T]>::contains(self, item)
    }

    fn insert(&mut self, item: T) -> bool {
        self.push(item);
        true
    }

    fn remove(&mut self, item: &T) -> Option<T> {
        let pos = <[T]>::iter(self).position(|e| e == item)?;
        Some(Vec::remove(self, pos))
    }

    fn retain_with(&mut self, keep: &mut dyn FnMut(&T) -> bool) -> Vec<T> {
        let (kept, removed) = partition_out(std::mem::take(self), keep);
        *self = kept;
        removed
    }

    fn drain_all(&mut self) -> Vec<T> {
        std::mem::take(self)
    }

    fn iter(&self) -> Self::Iter<'_> {
        <[T]>::iter(self)
    }
}

impl<T: PartialEq> ListDelegate<T> for Vec<T> {
    fn get(&self, index: usize) -> Option<&T> {
        <[T]>::get(self, index)
    }

    fn replace(&mut self, index: usize, item: T) -> Option<T> {
        let slot = <[T]>::get_mut(self, index)?;
        Some(std::mem::replace(slot, item))
    }

    fn insert_at(&mut self, index: usize, item: T) -> bool {
        if index > Vec::len(self) {
            return false;
        }
        Vec::insert(self, index, item);
        true
    }

    fn insert_all_at(&mut self, index: usize, items: Vec<T>) -> bool {
        if index > Vec::len(self) {
            return false;
        }
        self.splice(index..index, items);
        true
    }

    fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= Vec::len(self) {
            return None;
        }
        Some(Vec::remove(self, index))
    }
}

impl<T: PartialEq> CollectionDelegate<T> for VecDeque<T> {
    type Iter<'a> = vec_deque::Iter<'a, T> where T: 'a;

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn contains(&self, item: &T) -> bool {
        VecDeque::contains(self, item)
    }

    fn insert(&mut self, item: T) -> bool {
        self.push_back(item);
        true
    }

    fn remove(&mut self, item: &T) -> Option<T> {
        let pos = VecDeque::iter(self).position(|e| e == item)?;
        VecDeque::remove(self, pos)
    }

    fn retain_with(&mut self, keep: &mut dyn FnMut(&T) -> bool) -> Vec<T> {
        let (kept, removed) = partition_out(std::mem::take(self), keep);
        *self = kept.into();
        removed
    }

    fn drain_all(&mut self) -> Vec<T> {
        std::mem::take(self).into()
    }

    fn iter(&self) -> Self::Iter<'_> {
        VecDeque::iter(self)
    }
}

impl<T: PartialEq> ListDelegate<T> for VecDeque<T> {
    fn get(&self, index: usize) -> Option<&T> {
        VecDeque::get(self, index)
    }

    fn replace(&mut self, index: usize, item: T) -> Option<T> {
        let slot = VecDeque::get_mut(self, index)?;
        Some(std::mem::replace(slot, item))
    }

    fn insert_at(&mut self, index: usize, item: T) -> bool {
        if index > VecDeque::len(self) {
            return false;
        }
        VecDeque::insert(self, index, item);
        true
    }

    fn insert_all_at(&mut self, index: usize, items: Vec<T>) -> bool {
        if index > VecDeque::len(self) {
            return false;
        }
        for (offset, item) in items.into_iter().enumerate() {
            VecDeque::insert(self, index + offset, item);
        }
        true
    }

    fn remove_at(&mut self, index: usize) -> Option<T> {
        VecDeque::remove(self, index)
    }
}

impl<T: Eq + Hash> CollectionDelegate<T> for HashSet<T> {
    type Iter<'a> = hash_set::Iter<'a, T> where T: 'a;

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn contains(&self, item: &T) -> bool {
        HashSet::contains(self, item)
    }

    fn insert(&mut self, item: T) -> bool {
        HashSet::insert(self, item)
    }

    fn remove(&mut self, item: &T) -> Option<T> {
        self.take(item)
    }

    fn retain_with(&mut self, keep: &mut dyn FnMut(&T) -> bool) -> Vec<T> {
        let (kept, removed) = partition_out(std::mem::take(self), keep);
        *self = kept.into_iter().collect();
        removed
    }

    fn drain_all(&mut self) -> Vec<T> {
        self.drain().collect()
    }

    fn iter(&self) -> Self::Iter<'_> {
        HashSet::iter(self)
    }
}

impl<T: Eq + Hash> SetDelegate<T> for HashSet<T> {}

impl<T: Ord> CollectionDelegate<T> for BTreeSet<T> {
    type Iter<'a> = btree_set::Iter<'a, T> where T: 'a;

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn contains(&self, item: &T) -> bool {
        BTreeSet::contains(self, item)
    }

    fn insert(&mut self, item: T) -> bool {
        BTreeSet::insert(self, item)
    }

    fn remove(&mut self, item: &T) -> Option<T> {
        self.take(item)
    }

    fn retain_with(&mut self, keep: &mut dyn FnMut(&T) -> bool) -> Vec<T> {
        let (kept, removed) = partition_out(std::mem::take(self), keep);
        *self = kept.into_iter().collect();
        removed
    }

    fn drain_all(&mut self) -> Vec<T> {
        std::mem::take(self).into_iter().collect()
    }

    fn iter(&self) -> Self::Iter<'_> {
        BTreeSet::iter(self)
    }
}

impl<T: Ord> SetDelegate<T> for BTreeSet<T> {}

impl<K: Eq + Hash, V> MapDelegate<K, V> for HashMap<K, V> {
    type Iter<'a> = hash_map::Iter<'a, K, V> where K: 'a, V: 'a;

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn contains_key(&self, key: &K) -> bool {
        HashMap::contains_key(self, key)
    }

    fn get(&self, key: &K) -> Option<&V> {
        HashMap::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        HashMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        HashMap::remove(self, key)
    }

    fn drain_all(&mut self) -> Vec<(K, V)> {
        self.drain().collect()
    }

    fn iter(&self) -> Self::Iter<'_> {
        HashMap::iter(self)
    }
}

impl<K: Ord, V> MapDelegate<K, V> for BTreeMap<K, V> {
    type Iter<'a> = btree_map::Iter<'a, K, V> where K: 'a, V: 'a;

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn contains_key(&self, key: &K) -> bool {
        BTreeMap::contains_key(self, key)
    }

    fn get(&self, key: &K) -> Option<&V> {
        BTreeMap::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        BTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        BTreeMap::remove(self, key)
    }

    fn drain_all(&mut self) -> Vec<(K, V)> {
        std::mem::take(self).into_iter().collect()
    }

    fn iter(&self) -> Self::Iter<'_> {
        BTreeMap::iter(self)
    }
}
