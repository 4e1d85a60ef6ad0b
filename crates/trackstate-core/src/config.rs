//! 追蹤配置

use serde::{Deserialize, Serialize};

use crate::{Result, TrackError};

/// 整圖評估與追蹤切換的配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// 開始追蹤時預設的比較模式
    pub compare_before_marking_dirty: bool,

    /// 以節點識別的已造訪集合防止循環
    /// - true: 父子互相引用也能安全遍歷（預設）
    /// - false: 只依賴排除標記切斷循環
    pub detect_cycles: bool,

    /// 最大遞迴深度（None 表示不限制）
    pub max_depth: Option<usize>,

    /// 遍歷時是否也下降到函式庫、合成與簿記欄位
    pub include_library_fields: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            compare_before_marking_dirty: true,
            detect_cycles: true,
            max_depth: None,
            include_library_fields: false,
        }
    }
}

impl TrackingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 載入配置（缺少的欄位使用預設值）
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TrackError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 檢查配置是否合理
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == Some(0) {
            return Err(TrackError::InvalidConfig(
                "max_depth 必須大於 0".to_string(),
            ));
        }
        if !self.detect_cycles && self.max_depth.is_none() {
            tracing::warn!("已停用循環偵測且未設置最大深度，循環引用將導致無限遞迴");
        }
        Ok(())
    }

    /// 建構器模式：設置預設比較模式
    pub fn with_compare_before_marking_dirty(mut self, compare: bool) -> Self {
        self.compare_before_marking_dirty = compare;
        self
    }

    /// 建構器模式：設置循環偵測
    pub fn with_detect_cycles(mut self, detect: bool) -> Self {
        self.detect_cycles = detect;
        self
    }

    /// 建構器模式：設置最大深度
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// 建構器模式：設置是否包含函式庫欄位
    pub fn with_include_library_fields(mut self, include: bool) -> Self {
        self.include_library_fields = include;
        self
    }
}
