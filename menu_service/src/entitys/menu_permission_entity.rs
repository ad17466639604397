use common::util::validate::{validate_menu_key, validate_permission_set};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

/// 菜单类型
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MenuType {
    #[default]
    Menu,
    Button,
    Tab,
    Section,
}

/// 菜单状态
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MenuStatus {
    #[default]
    Visible,
    Hidden,
    Disabled,
}

/// 权限组合方式：AND 需全部满足，OR 满足任一即可
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PermissionLogic {
    #[default]
    And,
    Or,
}

fn default_true() -> bool {
    true
}

/// 菜单权限配置，配置仓库中的唯一事实来源
///
/// 校验规则与新建请求一致，导入时逐项校验。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, Validate)]
pub struct MenuPermissionConfig {
    /// 配置 ID，创建时生成，不可修改
    #[serde(default)]
    pub id: String,
    /// 全局唯一的菜单 key，创建后不可修改
    #[validate(custom(function = "validate_menu_key"))]
    pub menu_key: String,
    #[validate(length(min = 1, max = 64))]
    pub menu_name: String,
    #[serde(default)]
    pub menu_path: Option<String>,
    #[serde(default)]
    pub menu_icon: Option<String>,
    /// 父菜单 key，为空表示根节点
    #[serde(default)]
    pub parent_key: Option<String>,
    #[serde(default)]
    pub menu_type: MenuType,
    /// 所需权限集合（无序）
    #[serde(default)]
    #[validate(custom(function = "validate_permission_set"))]
    pub required_permissions: BTreeSet<String>,
    #[serde(default)]
    pub permission_logic: PermissionLogic,
    /// 管理员显隐开关，与权限判定无关
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub status: MenuStatus,
    /// 同级排序号，升序渲染
    #[serde(default)]
    pub sort_order: i32,
    /// 树深度，由父链推导
    #[serde(default)]
    pub level: i32,
    /// 创建时间（毫秒时间戳）
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Default for MenuPermissionConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            menu_key: String::new(),
            menu_name: String::new(),
            menu_path: None,
            menu_icon: None,
            parent_key: None,
            menu_type: MenuType::default(),
            required_permissions: BTreeSet::new(),
            permission_logic: PermissionLogic::default(),
            is_visible: true,
            status: MenuStatus::default(),
            sort_order: 0,
            level: 0,
            created_at: 0,
            updated_at: 0,
            created_by: None,
        }
    }
}

impl MenuPermissionConfig {
    pub fn is_root(&self) -> bool {
        self.parent_key.is_none()
    }

    /// 仅看自身的状态与管理员开关，不含权限和祖先
    pub fn self_visible(&self) -> bool {
        self.status == MenuStatus::Visible && self.is_visible
    }

    /// 同级节点的渲染顺序：sort_order，再按创建时间，最后按 key 保证确定性
    pub fn sibling_cmp(&self, other: &Self) -> Ordering {
        self.sort_order
            .cmp(&other.sort_order)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.menu_key.cmp(&other.menu_key))
    }
}

/// 由扁平配置推导出的树节点，不持久化
///
/// `expanded` / `selected` 只在展示时从 [`crate::manager::menu_ui_state::MenuUiState`] 叠加。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuTreeNode {
    pub config: MenuPermissionConfig,
    pub children: Vec<MenuTreeNode>,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub selected: bool,
}

impl MenuTreeNode {
    pub fn new(config: MenuPermissionConfig) -> Self {
        Self { config, children: Vec::new(), expanded: false, selected: false }
    }

    pub fn menu_key(&self) -> &str {
        &self.config.menu_key
    }

    /// 先序遍历
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a MenuTreeNode)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(MenuTreeNode::subtree_size).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(serde_json::to_string(&PermissionLogic::Or).unwrap(), "\"OR\"");
        assert_eq!(serde_json::to_string(&MenuType::Section).unwrap(), "\"section\"");
        assert_eq!(MenuStatus::from_str("disabled").unwrap(), MenuStatus::Disabled);
        assert_eq!(PermissionLogic::And.to_string(), "AND");
    }

    #[test]
    fn minimal_json_gets_defaults() {
        let config: MenuPermissionConfig =
            serde_json::from_str(r#"{"menu_key":"dashboard","menu_name":"Dashboard"}"#).unwrap();
        assert!(config.is_visible);
        assert!(config.is_root());
        assert_eq!(config.status, MenuStatus::Visible);
        assert_eq!(config.permission_logic, PermissionLogic::And);
        assert!(config.self_visible());
    }

    #[test]
    fn sibling_order_breaks_ties_by_created_then_key() {
        let mut a = MenuPermissionConfig { menu_key: "b".into(), sort_order: 1, created_at: 5, ..Default::default() };
        let b = MenuPermissionConfig { menu_key: "a".into(), sort_order: 1, created_at: 5, ..Default::default() };
        assert_eq!(a.sibling_cmp(&b), Ordering::Greater);
        a.created_at = 4;
        assert_eq!(a.sibling_cmp(&b), Ordering::Less);
    }
}
