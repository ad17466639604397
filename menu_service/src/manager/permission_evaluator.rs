use crate::entitys::menu_permission_entity::{MenuPermissionConfig, MenuStatus, MenuTreeNode, PermissionLogic};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

const WILDCARD: &str = "*";

/// 可用权限集合（角色、用户或二者并集）
///
/// 精确权限走哈希查找；通配符 `module.resource.*`、`module.*.*`、`*.*.*`
/// 预先拆成固定前缀段，匹配时比较所需权限的前缀段。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    exact: HashSet<String>,
    wildcard_prefixes: Vec<Vec<String>>,
    raw: BTreeSet<String>,
}

impl PermissionSet {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = PermissionSet::default();
        for permission in permissions {
            set.insert(permission.into());
        }
        set
    }

    pub fn insert(&mut self, permission: String) {
        if !self.raw.insert(permission.clone()) {
            return;
        }
        match wildcard_prefix(&permission) {
            Some(prefix) => self.wildcard_prefixes.push(prefix),
            None => {
                self.exact.insert(permission);
            }
        }
    }

    pub fn union(&self, other: &PermissionSet) -> PermissionSet {
        PermissionSet::new(self.raw.iter().chain(other.raw.iter()).cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// 按字典序返回原始权限名
    pub fn to_sorted_vec(&self) -> Vec<String> {
        self.raw.iter().cloned().collect()
    }

    /// 判断单个所需权限是否被满足：完全相等，或被某个通配符的固定前缀覆盖
    pub fn matches(&self, required: &str) -> bool {
        if self.exact.contains(required) {
            return true;
        }
        if self.wildcard_prefixes.is_empty() {
            return false;
        }
        let segments: Vec<&str> = required.split('.').collect();
        self.wildcard_prefixes.iter().any(|prefix| {
            prefix.len() <= segments.len() && prefix.iter().zip(segments.iter()).all(|(fixed, seg)| fixed == seg)
        })
    }
}

impl<S: Into<String>> Extend<S> for PermissionSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for permission in iter {
            self.insert(permission.into());
        }
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        PermissionSet::new(iter)
    }
}

/// 通配符必须是「固定段 + 全部为 * 的尾部」，否则按普通字符串处理
fn wildcard_prefix(permission: &str) -> Option<Vec<String>> {
    let segments: Vec<&str> = permission.split('.').collect();
    let first_wild = segments.iter().position(|s| *s == WILDCARD)?;
    if segments[first_wild..].iter().all(|s| *s == WILDCARD) {
        Some(segments[..first_wild].iter().map(|s| s.to_string()).collect())
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionCheck {
    pub has_permission: bool,
    pub missing_permissions: Vec<String>,
}

impl PermissionLogic {
    /// 按组合方式计算所需权限是否满足
    ///
    /// 未配置所需权限的节点视为公开，两种组合方式下都通过。
    pub fn evaluate(&self, required: &BTreeSet<String>, available: &PermissionSet) -> PermissionCheck {
        if required.is_empty() {
            return PermissionCheck { has_permission: true, missing_permissions: Vec::new() };
        }
        let missing: Vec<String> = required.iter().filter(|r| !available.matches(r)).cloned().collect();
        match self {
            PermissionLogic::And => {
                PermissionCheck { has_permission: missing.is_empty(), missing_permissions: missing }
            }
            PermissionLogic::Or => {
                if missing.len() < required.len() {
                    PermissionCheck { has_permission: true, missing_permissions: Vec::new() }
                } else {
                    PermissionCheck { has_permission: false, missing_permissions: missing }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HiddenReason {
    /// 祖先节点不可见
    AncestorHidden,
    /// status 不是 visible
    Status,
    /// 管理员关闭了 is_visible
    AdminHidden,
    PermissionDenied,
}

/// 单个节点的有效可见性
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuVisibility {
    pub has_permission: bool,
    pub is_visible: bool,
    pub missing_permissions: Vec<String>,
    pub hidden_reason: Option<HiddenReason>,
}

/// 计算节点可见性，`ancestors_visible` 为所有祖先是否都有效可见
pub fn evaluate_node(
    config: &MenuPermissionConfig,
    available: &PermissionSet,
    ancestors_visible: bool,
) -> MenuVisibility {
    let check = config.permission_logic.evaluate(&config.required_permissions, available);
    let hidden_reason = if !ancestors_visible {
        Some(HiddenReason::AncestorHidden)
    } else if config.status != MenuStatus::Visible {
        Some(HiddenReason::Status)
    } else if !config.is_visible {
        Some(HiddenReason::AdminHidden)
    } else if !check.has_permission {
        Some(HiddenReason::PermissionDenied)
    } else {
        None
    };
    MenuVisibility {
        has_permission: check.has_permission,
        is_visible: hidden_reason.is_none(),
        missing_permissions: check.missing_permissions,
        hidden_reason,
    }
}

/// 自顶向下计算整片森林的可见性，每个节点只计算一次
pub fn evaluate_tree(roots: &[MenuTreeNode], available: &PermissionSet) -> HashMap<String, MenuVisibility> {
    let mut result = HashMap::new();
    for root in roots {
        evaluate_subtree(root, available, true, &mut result);
    }
    result
}

fn evaluate_subtree(
    node: &MenuTreeNode,
    available: &PermissionSet,
    ancestors_visible: bool,
    out: &mut HashMap<String, MenuVisibility>,
) {
    let visibility = evaluate_node(&node.config, available, ancestors_visible);
    let visible = visibility.is_visible;
    out.insert(node.config.menu_key.clone(), visibility);
    for child in &node.children {
        evaluate_subtree(child, available, visible, out);
    }
}
