//! 階層遍歷：對可達的每個可追蹤節點套用狀態變更函式

use std::collections::HashSet;
use std::ops::ControlFlow;

use trackstate_core::{
    ConvertibleRegistry, FieldDescriptor, FieldRef, Result, TrackError, Trackable, TrackingConfig,
};

/// 節點識別
///
/// 有追蹤狀態的節點以狀態身分識別。子節點可能位於外層節點的開頭，
/// 位址與型別名稱都可能相同（例如經由 `Box` 指向同型別的下一個節點），
/// 因此位址只用於沒有追蹤狀態的節點。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum NodeKey {
    Status(usize),
    Address(usize, &'static str),
}

pub(crate) fn node_key(node: &dyn Trackable) -> NodeKey {
    match node.tracking_status() {
        Some(status) => NodeKey::Status(status.id()),
        None => NodeKey::Address(
            node as *const dyn Trackable as *const () as usize,
            node.type_name(),
        ),
    }
}

/// 將欄位值解析為可追蹤節點；不可追蹤的值回傳 `None`
pub(crate) fn resolve_node<'a>(
    value: FieldRef<'a>,
    registry: &ConvertibleRegistry,
) -> Option<&'a dyn Trackable> {
    match value {
        FieldRef::Value(value) => registry.convert(value),
        other => other.as_trackable(),
    }
}

/// 階層遍歷器
pub struct HierarchyWalker<'w> {
    registry: &'w ConvertibleRegistry,
    config: &'w TrackingConfig,
}

impl<'w> HierarchyWalker<'w> {
    pub fn new(registry: &'w ConvertibleRegistry, config: &'w TrackingConfig) -> Self {
        Self { registry, config }
    }

    /// 從 `root` 開始，對每個可達節點呼叫 `apply`
    ///
    /// `recurse` 為 false 時只處理 `root`；`accept` 決定要下降哪些欄位。
    /// 回傳造訪的節點數。
    pub fn walk(
        &self,
        root: &dyn Trackable,
        recurse: bool,
        accept: &dyn Fn(&FieldDescriptor) -> bool,
        apply: &mut dyn FnMut(&dyn Trackable),
    ) -> Result<usize> {
        let mut visited = HashSet::new();
        self.visit(root, recurse, accept, apply, &mut visited, 0)
    }

    fn visit(
        &self,
        node: &dyn Trackable,
        recurse: bool,
        accept: &dyn Fn(&FieldDescriptor) -> bool,
        apply: &mut dyn FnMut(&dyn Trackable),
        visited: &mut HashSet<NodeKey>,
        depth: usize,
    ) -> Result<usize> {
        if let Some(max_depth) = self.config.max_depth {
            if depth > max_depth {
                return Err(TrackError::DepthExceeded(max_depth));
            }
        }
        if self.config.detect_cycles && !visited.insert(node_key(node)) {
            tracing::trace!("節點 {} 已造訪，略過", node.type_name());
            return Ok(0);
        }

        apply(node);
        if !recurse {
            return Ok(1);
        }

        let mut outcome: Result<usize> = Ok(1);
        let _ = node.for_each_field(&mut |field, value| {
            if !accept(field) {
                tracing::trace!("欄位 {} 不在遍歷範圍內", field.name);
                return ControlFlow::Continue(());
            }
            let Some(child) = resolve_node(value, self.registry) else {
                return ControlFlow::Continue(());
            };
            match self.visit(child, recurse, accept, apply, visited, depth + 1) {
                Ok(count) => {
                    if let Ok(total) = outcome.as_mut() {
                        *total += count;
                    }
                    ControlFlow::Continue(())
                }
                Err(e) => {
                    outcome = Err(e);
                    ControlFlow::Break(())
                }
            }
        });
        outcome
    }
}
