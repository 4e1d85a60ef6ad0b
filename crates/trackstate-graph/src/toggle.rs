//! 整圖追蹤切換：重置、開始與停止追蹤

use trackstate_core::{
    ConvertibleRegistry, FieldDescriptor, FieldOrigin, Result, Trackable, TrackingConfig,
};

use crate::walk::HierarchyWalker;

/// 整圖追蹤切換器
///
/// 透過 [`HierarchyWalker`] 對每個可達節點套用狀態變更。
/// 容器節點開始追蹤時一律連同自己的元素一起啟用，不受外層 `recurse` 影響。
#[derive(Debug, Default)]
pub struct GraphTrackingToggle {
    config: TrackingConfig,
    registry: ConvertibleRegistry,
}

impl GraphTrackingToggle {
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

    /// 遍歷是否下降到此欄位
    ///
    /// 排除欄位與追蹤簿記欄位永遠不下降；函式庫與合成欄位
    /// 只有在 `include_library_fields` 啟用時才下降。
    pub fn accepts_field(&self, field: &FieldDescriptor) -> bool {
        if field.is_excluded() {
            return false;
        }
        match field.origin {
            FieldOrigin::Domain => true,
            FieldOrigin::Library | FieldOrigin::Synthetic => self.config.include_library_fields,
            FieldOrigin::Bookkeeping => false,
        }
    }

    /// 檢查點：清除每個造訪節點的 dirty 與 new
    ///
    /// 回傳造訪的節點數。
    pub fn reset_dirty_status(&self, root: &dyn Trackable, recurse: bool) -> Result<usize> {
        let visited = self.walk(root, recurse, &mut |node: &dyn Trackable| node.reset_dirty_state())?;
        tracing::debug!("已重置 {} 個節點的髒狀態 (recurse={})", visited, recurse);
        Ok(visited)
    }

    /// 以指定的比較模式開始追蹤每個造訪節點
    pub fn start_tracking_changes_in_state(
        &self,
        root: &dyn Trackable,
        compare_before_marking_dirty: bool,
        recurse: bool,
    ) -> Result<usize> {
        let visited = self.walk(root, recurse, &mut |node: &dyn Trackable| {
            node.enable_tracking(compare_before_marking_dirty)
        })?;
        tracing::debug!(
            "已開始追蹤 {} 個節點 (compare={}, recurse={})",
            visited,
            compare_before_marking_dirty,
            recurse
        );
        Ok(visited)
    }

    /// 以配置中的預設比較模式開始追蹤
    pub fn start_tracking_default(&self, root: &dyn Trackable, recurse: bool) -> Result<usize> {
        self.start_tracking_changes_in_state(
            root,
            self.config.compare_before_marking_dirty,
            recurse,
        )
    }

    /// 停止追蹤每個造訪節點（比較模式保持不變）
    pub fn stop_tracking_changes_in_state(
        &self,
        root: &dyn Trackable,
        recurse: bool,
    ) -> Result<usize> {
        let visited = self.walk(root, recurse, &mut |node: &dyn Trackable| node.disable_tracking())?;
        tracing::debug!("已停止追蹤 {} 個節點 (recurse={})", visited, recurse);
        Ok(visited)
    }

    fn walk(
        &self,
        root: &dyn Trackable,
        recurse: bool,
        apply: &mut dyn FnMut(&dyn Trackable),
    ) -> Result<usize> {
        let accept = |field: &FieldDescriptor| self.accepts_field(field);
        HierarchyWalker::new(&self.registry, &self.config).walk(root, recurse, &accept, apply)
    }
}
