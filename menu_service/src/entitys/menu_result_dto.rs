use crate::entitys::menu_permission_entity::{MenuStatus, MenuType};
use crate::manager::permission_evaluator::HiddenReason;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteMenuResult {
    /// 实际删除的 key（级联时含整棵子树，先序）
    pub deleted_keys: Vec<String>,
}

/// 移动结果，校验失败时 success=false 且存储不变
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuMoveResult {
    pub success: bool,
    pub message: Option<String>,
    pub new_parent_key: Option<String>,
    pub new_sort_order: Option<i32>,
    /// 排序号或层级发生变化的 key
    pub updated_keys: Vec<String>,
}

impl MenuMoveResult {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()), ..Default::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchItemResult {
    pub menu_key: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchOperationResult {
    pub success: bool,
    pub success_count: usize,
    pub failed_count: usize,
    pub results: Vec<BatchItemResult>,
}

impl BatchOperationResult {
    pub fn push(&mut self, menu_key: &str, outcome: Result<(), String>) {
        match outcome {
            Ok(()) => {
                self.success_count += 1;
                self.results.push(BatchItemResult { menu_key: menu_key.to_string(), success: true, error: None });
            }
            Err(e) => {
                self.failed_count += 1;
                self.results.push(BatchItemResult { menu_key: menu_key.to_string(), success: false, error: Some(e) });
            }
        }
        self.success = self.failed_count == 0;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportItemError {
    pub menu_key: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuImportResult {
    pub success: bool,
    pub imported_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub imported_ids: Vec<String>,
    pub errors: Vec<ImportItemError>,
    pub warnings: Vec<String>,
}

impl MenuImportResult {
    pub(crate) fn fail(&mut self, menu_key: &str, message: impl Into<String>) {
        self.failed_count += 1;
        self.errors.push(ImportItemError { menu_key: menu_key.to_string(), message: message.into() });
    }

    pub(crate) fn skip(&mut self, warning: impl Into<String>) {
        self.skipped_count += 1;
        self.warnings.push(warning.into());
    }
}

/// 预览树节点
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreviewMenuNode {
    pub menu_key: String,
    pub menu_name: String,
    /// 树中的父节点 key（孤儿、断环节点为空）
    pub parent_key: Option<String>,
    pub menu_type: MenuType,
    pub status: MenuStatus,
    pub level: i32,
    pub has_permission: bool,
    pub is_visible: bool,
    /// 仅 show_permission_info 时填充
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_permissions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_permissions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden_reason: Option<HiddenReason>,
    pub children: Vec<PreviewMenuNode>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreviewStats {
    pub total_menus: usize,
    pub visible_count: usize,
    pub hidden_count: usize,
    /// 自身权限校验未通过的节点数（不论祖先是否可见）
    pub permission_denied_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuPreviewResult {
    pub visible_menus: Vec<PreviewMenuNode>,
    pub hidden_menus: Vec<PreviewMenuNode>,
    pub stats: PreviewStats,
    /// 参与计算的权限集合（show_permission_info 时返回）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_permissions: Option<Vec<String>>,
    pub warnings: Vec<String>,
}

/// 与持久化层同步的结果
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuSyncResult {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}
