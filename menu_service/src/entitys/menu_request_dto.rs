use crate::entitys::menu_permission_entity::{MenuPermissionConfig, MenuStatus, MenuType, PermissionLogic};
use common::repository_util::{OrderType, PageInfo};
use common::util::validate::{validate_menu_key, validate_permission_set};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

fn default_true() -> bool {
    true
}

/// 新建菜单请求（不含 id、level、时间戳等生成字段）
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMenuRequest {
    #[validate(custom(function = "validate_menu_key"))]
    pub menu_key: String,
    #[validate(length(min = 1, max = 64))]
    pub menu_name: String,
    #[serde(default)]
    pub menu_path: Option<String>,
    #[serde(default)]
    pub menu_icon: Option<String>,
    #[serde(default)]
    pub parent_key: Option<String>,
    #[serde(default)]
    pub menu_type: MenuType,
    #[serde(default)]
    #[validate(custom(function = "validate_permission_set"))]
    pub required_permissions: BTreeSet<String>,
    #[serde(default)]
    pub permission_logic: PermissionLogic,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub status: MenuStatus,
    /// 为空时排在同级末尾
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl CreateMenuRequest {
    pub fn new(menu_key: impl Into<String>, menu_name: impl Into<String>) -> Self {
        Self {
            menu_key: menu_key.into(),
            menu_name: menu_name.into(),
            menu_path: None,
            menu_icon: None,
            parent_key: None,
            menu_type: MenuType::Menu,
            required_permissions: BTreeSet::new(),
            permission_logic: PermissionLogic::And,
            is_visible: true,
            status: MenuStatus::Visible,
            sort_order: None,
            created_by: None,
        }
    }

    pub fn parent(mut self, parent_key: impl Into<String>) -> Self {
        self.parent_key = Some(parent_key.into());
        self
    }

    pub fn permissions<I, S>(mut self, logic: PermissionLogic, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permission_logic = logic;
        self.required_permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}

/// 更新菜单请求
///
/// 不包含 `menu_key` / `parent_key`：结构字段只能通过移动操作修改。
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateMenuRequest {
    #[validate(length(min = 1, max = 64))]
    pub menu_name: Option<String>,
    pub menu_path: Option<String>,
    pub menu_icon: Option<String>,
    pub menu_type: Option<MenuType>,
    #[validate(custom(function = "validate_permission_set"))]
    pub required_permissions: Option<BTreeSet<String>>,
    pub permission_logic: Option<PermissionLogic>,
    pub is_visible: Option<bool>,
    pub status: Option<MenuStatus>,
}

impl UpdateMenuRequest {
    pub fn is_empty(&self) -> bool {
        self.menu_name.is_none()
            && self.menu_path.is_none()
            && self.menu_icon.is_none()
            && self.menu_type.is_none()
            && self.required_permissions.is_none()
            && self.permission_logic.is_none()
            && self.is_visible.is_none()
            && self.status.is_none()
    }

    /// 把补丁应用到配置上，返回是否有字段变化
    pub fn apply_to(&self, config: &mut MenuPermissionConfig) -> bool {
        let before = config.clone();
        if let Some(name) = &self.menu_name {
            config.menu_name = name.clone();
        }
        if let Some(path) = &self.menu_path {
            config.menu_path = Some(path.clone());
        }
        if let Some(icon) = &self.menu_icon {
            config.menu_icon = Some(icon.clone());
        }
        if let Some(menu_type) = self.menu_type {
            config.menu_type = menu_type;
        }
        if let Some(permissions) = &self.required_permissions {
            config.required_permissions = permissions.clone();
        }
        if let Some(logic) = self.permission_logic {
            config.permission_logic = logic;
        }
        if let Some(is_visible) = self.is_visible {
            config.is_visible = is_visible;
        }
        if let Some(status) = self.status {
            config.status = status;
        }
        *config != before
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DropType {
    Before,
    After,
    Inner,
}

/// 拖拽移动请求
///
/// `new_sort_order` / `new_parent_key` 是前端的预期结果，实际以服务端计算为准。
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuDragOperation {
    pub source_menu_key: String,
    pub target_menu_key: String,
    pub drop_type: DropType,
    #[serde(default)]
    pub new_sort_order: Option<i32>,
    #[serde(default)]
    pub new_parent_key: Option<String>,
}

impl MenuDragOperation {
    pub fn new(source: impl Into<String>, target: impl Into<String>, drop_type: DropType) -> Self {
        Self {
            source_menu_key: source.into(),
            target_menu_key: target.into(),
            drop_type,
            new_sort_order: None,
            new_parent_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImportMode {
    /// 新 key 插入，已有 key 仅在 overwrite_existing 时覆盖
    #[default]
    Merge,
    /// 清空现有配置后整体替换
    Replace,
    /// 只插入新 key，冲突一律跳过
    Append,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuConfigImportRequest {
    pub configs: Vec<MenuPermissionConfig>,
    #[serde(default)]
    pub import_mode: ImportMode,
    #[serde(default)]
    pub overwrite_existing: bool,
}

/// 导出文件格式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct MenuConfigExport {
    pub version: String,
    pub exported_at: i64,
    pub configs: Vec<MenuPermissionConfig>,
    #[serde(default)]
    pub exported_by: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BatchOperation {
    Show,
    Hide,
    Enable,
    Disable,
    Delete,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BatchOperationParams {
    /// 仅对 delete 生效
    #[serde(default)]
    pub cascade: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchMenuOperationRequest {
    pub menu_keys: Vec<String>,
    pub operation: BatchOperation,
    #[serde(default)]
    pub params: Option<BatchOperationParams>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PreviewMode {
    #[default]
    Role,
    User,
    Combined,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MenuPreviewConfig {
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub preview_mode: PreviewMode,
    #[serde(default)]
    pub show_permission_info: bool,
    #[serde(default)]
    pub show_hidden_menus: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MenuSortField {
    /// 按树层级、同级排序号
    #[default]
    SortOrder,
    MenuKey,
    MenuName,
    Level,
    CreatedAt,
    UpdatedAt,
}

/// 配置列表查询条件
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MenuConfigQuery {
    /// 在 key、名称、路径中模糊匹配（忽略大小写）
    pub search: Option<String>,
    pub menu_type: Option<MenuType>,
    pub status: Option<MenuStatus>,
    pub parent_key: Option<String>,
    #[serde(default)]
    pub root_only: bool,
    /// 所需权限中包含该权限名
    pub permission: Option<String>,
    pub sort_by: Option<MenuSortField>,
    #[serde(default)]
    pub sort_order: OrderType,
    pub page: Option<PageInfo>,
}
