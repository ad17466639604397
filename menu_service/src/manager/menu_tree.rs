use crate::biz_const::ROOT_LEVEL;
use crate::entitys::menu_permission_entity::{MenuPermissionConfig, MenuTreeNode};
use log::warn;
use std::collections::{BTreeMap, HashMap, HashSet};

/// 建树结果：有序森林 + 可恢复异常（孤儿节点、环、层级漂移）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuTreeBuild {
    pub roots: Vec<MenuTreeNode>,
    pub warnings: Vec<String>,
}

impl MenuTreeBuild {
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(MenuTreeNode::subtree_size).sum()
    }

    pub fn find(&self, key: &str) -> Option<&MenuTreeNode> {
        fn search<'a>(nodes: &'a [MenuTreeNode], key: &str) -> Option<&'a MenuTreeNode> {
            for node in nodes {
                if node.config.menu_key == key {
                    return Some(node);
                }
                if let Some(found) = search(&node.children, key) {
                    return Some(found);
                }
            }
            None
        }
        search(&self.roots, key)
    }

    /// 先序展开的 key 列表
    pub fn flatten_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.node_count());
        for root in &self.roots {
            root.walk(&mut |node| keys.push(node.config.menu_key.clone()));
        }
        keys
    }
}

/// 把扁平配置构建成有序森林
///
/// - `parent_key` 为空或无法解析的节点作为根（后者记为孤儿并告警）；
/// - 父链成环时，在检测到环的节点处断开，该节点降级为孤儿根；
/// - 同级按 `sort_order`、`created_at`、`menu_key` 排序；
/// - 输出节点的 `level` 按实际深度重新推导。
///
/// 纯函数：相同输入总是得到相同输出。
pub fn build_menu_tree<'a, I>(configs: I) -> MenuTreeBuild
where
    I: IntoIterator<Item = &'a MenuPermissionConfig>,
{
    // BTreeMap 保证遍历顺序稳定，环的断点因此是确定的
    let index: BTreeMap<&str, &MenuPermissionConfig> = configs.into_iter().map(|c| (c.menu_key.as_str(), c)).collect();
    let mut warnings = Vec::new();
    let mut effective_parent: HashMap<&str, Option<&str>> = HashMap::with_capacity(index.len());

    for &start in index.keys() {
        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut current = start;
        loop {
            if effective_parent.contains_key(current) {
                break;
            }
            path.push(current);
            on_path.insert(current);
            let config = index[current];
            match config.parent_key.as_deref() {
                None => {
                    effective_parent.insert(current, None);
                    break;
                }
                Some(parent) if !index.contains_key(parent) => {
                    let msg =
                        format!("menu '{}' references missing parent '{}', treated as orphan root", current, parent);
                    warn!("{}", msg);
                    warnings.push(msg);
                    effective_parent.insert(current, None);
                    break;
                }
                Some(parent) if parent == current || on_path.contains(parent) => {
                    let msg =
                        format!("menu '{}' closes a parent cycle via '{}', treated as orphan root", current, parent);
                    warn!("{}", msg);
                    warnings.push(msg);
                    effective_parent.insert(current, None);
                    break;
                }
                Some(parent) => current = parent,
            }
        }
        // 路径上其余节点的父链已验证可达
        for key in path {
            if !effective_parent.contains_key(key) {
                effective_parent.insert(key, index[key].parent_key.as_deref());
            }
        }
    }

    let mut children: HashMap<&str, Vec<&MenuPermissionConfig>> = HashMap::new();
    let mut roots: Vec<&MenuPermissionConfig> = Vec::new();
    for (&key, config) in &index {
        match effective_parent.get(key).copied().flatten() {
            Some(parent) => children.entry(parent).or_default().push(config),
            None => roots.push(config),
        }
    }
    roots.sort_by(|a, b| a.sibling_cmp(b));
    for list in children.values_mut() {
        list.sort_by(|a, b| a.sibling_cmp(b));
    }

    let roots = roots.into_iter().map(|config| attach(config, ROOT_LEVEL, &children, &mut warnings)).collect();
    MenuTreeBuild { roots, warnings }
}

fn attach(
    config: &MenuPermissionConfig,
    level: i32,
    children: &HashMap<&str, Vec<&MenuPermissionConfig>>,
    warnings: &mut Vec<String>,
) -> MenuTreeNode {
    let mut node_config = config.clone();
    if node_config.level != level {
        warnings.push(format!(
            "menu '{}' stored level {} differs from derived level {}",
            config.menu_key, config.level, level
        ));
        node_config.level = level;
    }
    let mut node = MenuTreeNode::new(node_config);
    if let Some(list) = children.get(config.menu_key.as_str()) {
        node.children = list.iter().map(|child| attach(child, level + 1, children, warnings)).collect();
    }
    node
}
