//! 整圖髒狀態評估

use std::collections::HashSet;
use std::ops::ControlFlow;

use trackstate_core::{
    ConvertibleRegistry, FieldDescriptor, FieldKind, FieldRef, Result, TrackError, Trackable,
    TrackingConfig,
};

use crate::walk::{node_key, resolve_node, NodeKey};

/// 評估範圍
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirtyScope {
    /// 節點本身加上組合關係的欄位
    SelfOnly,
    /// 所有可追蹤欄位
    #[default]
    Full,
}

/// 整圖髒狀態評估器
///
/// 以欄位描述列舉節點的欄位，遇到第一個髒的欄位即回傳。
/// 已造訪集合以節點識別為鍵，父子互相引用時也會終止。
#[derive(Debug, Default)]
pub struct GraphDirtyEvaluator {
    config: TrackingConfig,
    registry: ConvertibleRegistry,
}

impl GraphDirtyEvaluator {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            config,
            registry: ConvertibleRegistry::new(),
        }
    }

    /// 建構器模式：設置可轉換型別登錄表
    pub fn with_registry(mut self, registry: ConvertibleRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// 僅節點本身是否為髒
    pub fn is_this_dirty(&self, node: &dyn Trackable) -> bool {
        node.is_this_dirty()
    }

    /// 節點或任何可達的可追蹤欄位是否為髒
    pub fn is_dirty(&self, node: &dyn Trackable) -> Result<bool> {
        self.is_dirty_in(node, DirtyScope::Full)
    }

    /// 依指定範圍評估
    pub fn is_dirty_in(&self, node: &dyn Trackable, scope: DirtyScope) -> Result<bool> {
        let mut visited = HashSet::new();
        let dirty = self.evaluate(node, scope, &mut visited, 0)?;
        tracing::debug!(
            "評估 {} ({:?})：{}，造訪 {} 個節點",
            node.type_name(),
            scope,
            if dirty { "髒" } else { "乾淨" },
            visited.len()
        );
        Ok(dirty)
    }

    fn evaluate(
        &self,
        node: &dyn Trackable,
        scope: DirtyScope,
        visited: &mut HashSet<NodeKey>,
        depth: usize,
    ) -> Result<bool> {
        if let Some(max_depth) = self.config.max_depth {
            if depth > max_depth {
                return Err(TrackError::DepthExceeded(max_depth));
            }
        }
        // 循環中再次遇到的節點已在評估中，不重複計算
        if self.config.detect_cycles && !visited.insert(node_key(node)) {
            return Ok(false);
        }
        if node.is_this_dirty() {
            return Ok(true);
        }

        let mut outcome = Ok(false);
        let _ = node.for_each_field(&mut |field, value| {
            match self.evaluate_field(field, value, scope, visited, depth) {
                Ok(false) => ControlFlow::Continue(()),
                found => {
                    outcome = found;
                    ControlFlow::Break(())
                }
            }
        });
        outcome
    }

    fn evaluate_field(
        &self,
        field: &FieldDescriptor,
        value: FieldRef<'_>,
        scope: DirtyScope,
        visited: &mut HashSet<NodeKey>,
        depth: usize,
    ) -> Result<bool> {
        if field.is_excluded() {
            tracing::trace!("欄位 {} 已排除", field.name);
            return Ok(false);
        }
        if scope == DirtyScope::SelfOnly && !field.is_composition() {
            return Ok(false);
        }
        if value.is_absent() || !self.is_trackable(field, &value) {
            return Ok(false);
        }

        match field.kind {
            FieldKind::Container(shape) if shape.is_map() => match value {
                FieldRef::Map(map) => {
                    tracing::trace!(
                        "映射欄位 {}：{} 個鍵，新增 {}、移除 {}、更新 {}",
                        field.name,
                        map.len(),
                        map.new_key_count(),
                        map.removed_key_count(),
                        map.updated_key_count()
                    );
                    Ok(map.is_dirty()
                        || self.evaluate(map.as_trackable(), scope, visited, depth + 1)?)
                }
                _ => Err(TrackError::TrackerTypeMismatch {
                    field: field.name,
                    expected: shape,
                }),
            },
            FieldKind::Container(shape) => match value {
                FieldRef::Collection(collection) => {
                    tracing::trace!(
                        "容器欄位 {}：{} 個元素，新增 {}、移除 {}",
                        field.name,
                        collection.len(),
                        collection.new_entry_count(),
                        collection.removed_entry_count()
                    );
                    Ok(collection.is_dirty()
                        || self.evaluate(collection.as_trackable(), scope, visited, depth + 1)?)
                }
                _ => Err(TrackError::TrackerTypeMismatch {
                    field: field.name,
                    expected: shape,
                }),
            },
            FieldKind::Node | FieldKind::Scalar => match resolve_node(value, &self.registry) {
                Some(child) => self.evaluate(child, scope, visited, depth + 1),
                None => Err(TrackError::NotTrackable { field: field.name }),
            },
        }
    }

    /// 宣告為節點、值本身是追蹤器，或宣告/執行期型別已登記為可轉換
    fn is_trackable(&self, field: &FieldDescriptor, value: &FieldRef<'_>) -> bool {
        value.is_tracker()
            || field.kind == FieldKind::Node
            || field.markers.convertible
            || field
                .declared_type
                .map_or(false, |type_id| self.registry.is_convertible(type_id))
            || value
                .runtime_type()
                .map_or(false, |type_id| self.registry.is_convertible(type_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use trackstate_collections::{CollectionField, ListField, TrackedList, TrackedMap};
    use trackstate_core::{ContainerShape, FieldOrigin, StatusHandle};

    struct Part {
        status: StatusHandle,
    }

    impl Part {
        fn new() -> Self {
            Self {
                status: StatusHandle::tracking(true),
            }
        }
    }

    impl Trackable for Part {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }
    }

    struct Assembly {
        status: StatusHandle,
        body: Part,
        supplier: Part,
        memo: String,
        spare: Option<Part>,
    }

    const BODY: FieldDescriptor = FieldDescriptor::node("body").composition();
    const SUPPLIER: FieldDescriptor = FieldDescriptor::node("supplier");
    const MEMO: FieldDescriptor = FieldDescriptor::scalar("memo");
    const SPARE: FieldDescriptor = FieldDescriptor::node("spare").excluded();

    impl Assembly {
        fn new() -> Self {
            Self {
                status: StatusHandle::tracking(true),
                body: Part::new(),
                supplier: Part::new(),
                memo: String::new(),
                spare: None,
            }
        }
    }

    impl Trackable for Assembly {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }

        fn for_each_field(
            &self,
            visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
        ) -> ControlFlow<()> {
            visit(&BODY, FieldRef::Node(&self.body))?;
            visit(&SUPPLIER, FieldRef::Node(&self.supplier))?;
            visit(&MEMO, FieldRef::value(&self.memo))?;
            visit(&SPARE, FieldRef::optional_node(self.spare.as_ref()))
        }
    }

    /// 單向鏈結
    struct Link {
        status: StatusHandle,
        next: Option<Box<Link>>,
    }

    const NEXT: FieldDescriptor = FieldDescriptor::node("next");

    impl Trackable for Link {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }

        fn for_each_field(
            &self,
            visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
        ) -> ControlFlow<()> {
            visit(&NEXT, FieldRef::optional_node(self.next.as_deref()))
        }
    }

    fn chain(len: usize) -> Link {
        let mut link = Link {
            status: StatusHandle::tracking(true),
            next: None,
        };
        for _ in 1..len {
            link = Link {
                status: StatusHandle::tracking(true),
                next: Some(Box::new(link)),
            };
        }
        link
    }

    #[test]
    fn test_clean_graph() {
        let evaluator = GraphDirtyEvaluator::default();
        let assembly = Assembly::new();

        assert!(!evaluator.is_this_dirty(&assembly));
        assert!(!evaluator.is_dirty(&assembly).unwrap());
    }

    #[test]
    fn test_recursive_descent_finds_nested_dirt() {
        let evaluator = GraphDirtyEvaluator::default();
        let root = chain(3);
        let leaf = root.next.as_ref().and_then(|child| child.next.as_ref()).unwrap();
        leaf.touch();

        assert!(!evaluator.is_this_dirty(&root));
        assert!(evaluator.is_dirty(&root).unwrap());
    }

    #[rstest]
    #[case::composition_self_only(true, false, DirtyScope::SelfOnly, true)]
    #[case::composition_full(true, false, DirtyScope::Full, true)]
    #[case::association_self_only(false, true, DirtyScope::SelfOnly, false)]
    #[case::association_full(false, true, DirtyScope::Full, true)]
    fn test_self_only_vs_full(
        #[case] dirty_body: bool,
        #[case] dirty_supplier: bool,
        #[case] scope: DirtyScope,
        #[case] expected: bool,
    ) {
        let evaluator = GraphDirtyEvaluator::default();
        let assembly = Assembly::new();
        if dirty_body {
            assembly.body.touch();
        }
        if dirty_supplier {
            assembly.supplier.touch();
        }

        assert!(!evaluator.is_this_dirty(&assembly));
        assert_eq!(evaluator.is_dirty_in(&assembly, scope).unwrap(), expected);
    }

    #[test]
    fn test_excluded_field_is_skipped() {
        let evaluator = GraphDirtyEvaluator::default();
        let mut assembly = Assembly::new();
        let spare = Part::new();
        spare.touch();
        assembly.spare = Some(spare);

        assert!(!evaluator.is_dirty(&assembly).unwrap());
    }

    struct Person {
        status: StatusHandle,
        friend: RefCell<Option<Rc<Person>>>,
    }

    const FRIEND: FieldDescriptor = FieldDescriptor::node("friend");

    impl Trackable for Person {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }

        fn for_each_field(
            &self,
            visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
        ) -> ControlFlow<()> {
            let friend = self.friend.borrow();
            visit(&FRIEND, FieldRef::optional_node(friend.as_deref()))
        }
    }

    #[test]
    fn test_cycle_terminates() {
        let evaluator = GraphDirtyEvaluator::default();
        let a = Rc::new(Person {
            status: StatusHandle::tracking(true),
            friend: RefCell::new(None),
        });
        let b = Rc::new(Person {
            status: StatusHandle::tracking(true),
            friend: RefCell::new(Some(a.clone())),
        });
        *a.friend.borrow_mut() = Some(b.clone());

        assert!(!evaluator.is_dirty(&*a).unwrap());

        b.touch();
        assert!(evaluator.is_dirty(&*a).unwrap());

        a.friend.borrow_mut().take();
    }

    #[test]
    fn test_depth_limit() {
        let evaluator = GraphDirtyEvaluator::new(TrackingConfig::default().with_max_depth(2));

        assert!(!evaluator.is_dirty(&chain(3)).unwrap());
        let err = evaluator.is_dirty(&chain(4)).unwrap_err();
        assert!(matches!(err, TrackError::DepthExceeded(2)));
    }

    /// 由外部函式庫提供、不屬於領域模型的型別
    struct Legacy {
        status: StatusHandle,
    }

    impl Trackable for Legacy {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }
    }

    struct Wrapper {
        status: StatusHandle,
        legacy: Legacy,
        code: u32,
    }

    const LEGACY: FieldDescriptor = FieldDescriptor::scalar("legacy").with_origin(FieldOrigin::Library);
    const CODE: FieldDescriptor = FieldDescriptor::scalar("code").convertible();

    impl Trackable for Wrapper {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }

        fn for_each_field(
            &self,
            visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
        ) -> ControlFlow<()> {
            visit(&LEGACY, FieldRef::value(&self.legacy))?;
            visit(&CODE, FieldRef::value(&self.code))
        }
    }

    #[test]
    fn test_registered_convertible_value() {
        let wrapper = Wrapper {
            status: StatusHandle::tracking(true),
            legacy: Legacy {
                status: StatusHandle::tracking(true),
            },
            code: 7,
        };
        wrapper.legacy.touch();

        // 未登記：以 `convertible` 標記的 code 無法轉換
        let plain = GraphDirtyEvaluator::default();
        let err = plain.is_dirty(&wrapper).unwrap_err();
        assert!(matches!(err, TrackError::NotTrackable { field: "code" }));

        let evaluator = GraphDirtyEvaluator::default()
            .with_registry(ConvertibleRegistry::new().with::<Legacy>());
        assert!(evaluator.is_dirty(&wrapper).unwrap());
    }

    struct Basket {
        status: StatusHandle,
        items: ListField<String>,
        prices: TrackedMap<String, u32>,
    }

    const ITEMS: FieldDescriptor = FieldDescriptor::container("items", ContainerShape::List);
    const PRICES: FieldDescriptor = FieldDescriptor::container("prices", ContainerShape::Map);
    /// 宣告形狀與實際追蹤器不符
    const MISDECLARED: FieldDescriptor = FieldDescriptor::container("prices", ContainerShape::Set);

    impl Trackable for Basket {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }

        fn for_each_field(
            &self,
            visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
        ) -> ControlFlow<()> {
            visit(&ITEMS, self.items.field_ref())?;
            visit(&PRICES, FieldRef::Map(&self.prices))
        }
    }

    fn basket() -> Basket {
        let status = StatusHandle::tracking(true);
        let prices = TrackedMap::new(HashMap::new(), status.downgrade());
        prices.start_tracking(true, true);
        Basket {
            status,
            items: ListField::default(),
            prices,
        }
    }

    #[test]
    fn test_container_bookkeeping_counts_as_dirty() {
        let evaluator = GraphDirtyEvaluator::default();
        let mut basket = basket();

        // 未包裝的容器不可追蹤
        assert!(!evaluator.is_dirty(&basket).unwrap());

        // 新鍵不標記擁有節點，但映射的變更集仍記錄
        basket.prices.put("apple".to_string(), 3);
        assert!(!basket.status.is_dirty());
        assert!(evaluator.is_dirty(&basket).unwrap());
    }

    #[test]
    fn test_promoted_list_is_evaluated() {
        let evaluator = GraphDirtyEvaluator::default();
        let mut basket = basket();

        let items = basket
            .items
            .promote(Some(&basket.status), &ITEMS)
            .unwrap()
            .as_tracked_mut()
            .unwrap();
        items.insert("pear".to_string());
        basket.status.reset();

        assert!(!evaluator.is_this_dirty(&basket));
        assert!(evaluator.is_dirty(&basket).unwrap());
    }

    struct Misdeclared {
        status: StatusHandle,
        prices: TrackedMap<String, u32>,
    }

    impl Trackable for Misdeclared {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }

        fn for_each_field(
            &self,
            visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
        ) -> ControlFlow<()> {
            visit(&MISDECLARED, FieldRef::Map(&self.prices))
        }
    }

    #[test]
    fn test_tracker_type_mismatch_is_reported() {
        let evaluator = GraphDirtyEvaluator::default();
        let node = Misdeclared {
            status: StatusHandle::tracking(true),
            prices: TrackedMap::detached(HashMap::new()),
        };

        let err = evaluator.is_dirty(&node).unwrap_err();

        assert!(matches!(
            err,
            TrackError::TrackerTypeMismatch {
                field: "prices",
                expected: ContainerShape::Set,
            }
        ));
    }

    struct Order {
        status: StatusHandle,
        lines: TrackedList<Rc<LineNode>>,
    }

    struct LineNode {
        status: StatusHandle,
        sku: &'static str,
    }

    impl PartialEq for LineNode {
        fn eq(&self, other: &Self) -> bool {
            self.sku == other.sku
        }
    }

    impl Trackable for LineNode {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }
    }

    const LINES: FieldDescriptor = FieldDescriptor::container("lines", ContainerShape::List);

    impl Trackable for Order {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }

        fn for_each_field(
            &self,
            visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
        ) -> ControlFlow<()> {
            visit(&LINES, FieldRef::Collection(self.lines.as_collection()))
        }
    }

    #[rstest]
    #[case(DirtyScope::SelfOnly)]
    #[case(DirtyScope::Full)]
    fn test_dirty_element_inside_clean_container(#[case] scope: DirtyScope) {
        let evaluator = GraphDirtyEvaluator::default();
        let status = StatusHandle::tracking(true);
        let line = Rc::new(LineNode {
            status: StatusHandle::tracking(true),
            sku: "A-1",
        });
        let order = Order {
            lines: TrackedList::new(vec![line.clone()], status.downgrade()).with_node_elements(),
            status,
        };
        order.lines.start_tracking(true, true);

        // 欄位未標記為組合關係，只有完整評估會下降
        assert!(!evaluator.is_dirty_in(&order, scope).unwrap());

        line.touch();
        assert_eq!(
            evaluator.is_dirty_in(&order, scope).unwrap(),
            scope == DirtyScope::Full
        );
    }

    /// 下一個節點放在開頭，與外層節點共用位址與型別名稱
    #[repr(C)]
    struct HeadLink {
        next: Option<Box<HeadLink>>,
        status: StatusHandle,
    }

    impl Trackable for HeadLink {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }

        fn for_each_field(
            &self,
            visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
        ) -> ControlFlow<()> {
            visit(&NEXT, FieldRef::optional_node(self.next.as_deref()))
        }
    }

    #[test]
    fn test_child_at_parent_address_is_evaluated() {
        let evaluator = GraphDirtyEvaluator::default();
        let head = HeadLink {
            next: Some(Box::new(HeadLink {
                next: None,
                status: StatusHandle::tracking(true),
            })),
            status: StatusHandle::tracking(true),
        };
        assert!(!evaluator.is_dirty(&head).unwrap());

        head.next.as_deref().unwrap().touch();

        assert!(!evaluator.is_this_dirty(&head));
        assert!(evaluator.is_dirty(&head).unwrap());
    }

    struct Catalog {
        status: StatusHandle,
        chains: TrackedMap<String, Link>,
    }

    const CHAINS: FieldDescriptor = FieldDescriptor::container("chains", ContainerShape::Map);

    impl Trackable for Catalog {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }

        fn for_each_field(
            &self,
            visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
        ) -> ControlFlow<()> {
            visit(&CHAINS, FieldRef::Map(&self.chains))
        }
    }

    #[test]
    fn test_map_values_are_descended() {
        let evaluator = GraphDirtyEvaluator::default();
        let status = StatusHandle::tracking(true);
        let mut values = HashMap::new();
        values.insert("frame".to_string(), chain(2));
        let chains = TrackedMap::new(values, status.downgrade()).with_node_values();
        chains.start_tracking(false, true);
        let catalog = Catalog { status, chains };
        assert!(!evaluator.is_dirty(&catalog).unwrap());

        // 值本身乾淨，只有值的下一個節點被修改
        let value = catalog.chains.get(&"frame".to_string()).unwrap();
        value.next.as_deref().unwrap().touch();

        assert!(!value.is_this_dirty());
        assert!(!catalog.chains.is_dirty());
        assert!(evaluator.is_dirty(&catalog).unwrap());
    }

    struct Pantry {
        status: StatusHandle,
        stock: CollectionField<String>,
    }

    const STOCK: FieldDescriptor = FieldDescriptor::container("stock", ContainerShape::Collection);

    impl Trackable for Pantry {
        fn tracking_status(&self) -> Option<&StatusHandle> {
            Some(&self.status)
        }

        fn for_each_field(
            &self,
            visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
        ) -> ControlFlow<()> {
            visit(&STOCK, self.stock.field_ref())
        }
    }

    #[test]
    fn test_promoted_collection_is_evaluated() {
        let evaluator = GraphDirtyEvaluator::default();
        let mut pantry = Pantry {
            status: StatusHandle::tracking(true),
            stock: CollectionField::unwrapped(vec!["rice".to_string()]),
        };

        let stock = pantry
            .stock
            .promote(Some(&pantry.status), &STOCK)
            .unwrap()
            .as_tracked_mut()
            .unwrap();
        assert!(stock.is_tracking());
        assert!(stock.insert("salt".to_string()));
        assert!(pantry.stock.is_tracked());
        assert!(pantry.status.is_dirty());

        pantry.status.reset();

        assert!(!evaluator.is_this_dirty(&pantry));
        assert!(evaluator.is_dirty(&pantry).unwrap());
        assert_eq!(
            pantry.stock.as_tracked().unwrap().new_entries(),
            vec!["salt".to_string()]
        );
    }
}
