use crate::biz_const::{FIRST_SORT_ORDER, ROOT_LEVEL};
use crate::entitys::menu_permission_entity::MenuPermissionConfig;
use std::collections::{HashMap, HashSet, VecDeque};

/// 扁平的、按 menu_key 索引的配置仓库
///
/// 节点之间只通过 `parent_key` 关联，树结构由 [`super::menu_tree::build_menu_tree`] 按需推导。
/// 每次写入都会递增 `revision`，用作派生结果的缓存键。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuConfigStore {
    configs: HashMap<String, MenuPermissionConfig>,
    revision: u64,
}

impl MenuConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接加载原始数据，不做结构校验（异常由建树阶段降级处理）
    pub fn from_configs(configs: impl IntoIterator<Item = MenuPermissionConfig>) -> Self {
        let mut store = Self::new();
        store.configs = configs.into_iter().map(|c| (c.menu_key.clone(), c)).collect();
        store
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.configs.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&MenuPermissionConfig> {
        self.configs.get(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &MenuPermissionConfig> {
        self.configs.values()
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut MenuPermissionConfig> {
        self.revision += 1;
        self.configs.get_mut(key)
    }

    pub(crate) fn insert(&mut self, config: MenuPermissionConfig) -> Option<MenuPermissionConfig> {
        self.revision += 1;
        self.configs.insert(config.menu_key.clone(), config)
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<MenuPermissionConfig> {
        self.revision += 1;
        self.configs.remove(key)
    }

    /// 用另一份仓库的内容整体替换，revision 继续递增
    pub(crate) fn adopt(&mut self, other: MenuConfigStore) {
        self.configs = other.configs;
        self.revision += 1;
    }

    /// 某个父节点下的直接子节点（`None` 表示根），按同级顺序排序
    pub fn children_of(&self, parent_key: Option<&str>) -> Vec<&MenuPermissionConfig> {
        let mut children: Vec<&MenuPermissionConfig> =
            self.configs.values().filter(|c| c.parent_key.as_deref() == parent_key).collect();
        children.sort_by(|a, b| a.sibling_cmp(b));
        children
    }

    pub fn has_children(&self, key: &str) -> bool {
        self.configs.values().any(|c| c.parent_key.as_deref() == Some(key))
    }

    /// 子树中所有 key（含自身），先序；遇到环时停止展开
    pub fn subtree_keys(&self, key: &str) -> Vec<String> {
        if !self.contains(key) {
            return Vec::new();
        }
        let mut children_index: HashMap<&str, Vec<&MenuPermissionConfig>> = HashMap::new();
        for config in self.configs.values() {
            if let Some(parent) = config.parent_key.as_deref() {
                children_index.entry(parent).or_default().push(config);
            }
        }
        for children in children_index.values_mut() {
            children.sort_by(|a, b| a.sibling_cmp(b));
        }

        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![key.to_string()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(children) = children_index.get(current.as_str()) {
                stack.extend(children.iter().rev().map(|c| c.menu_key.clone()));
            }
            out.push(current);
        }
        out
    }

    /// 祖先链，从直接父节点到根；父节点缺失或出现环时截断
    pub fn ancestors(&self, key: &str) -> Vec<&MenuPermissionConfig> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(key);
        let mut current = self.get(key).and_then(|c| c.parent_key.as_deref());
        while let Some(parent_key) = current {
            if !seen.insert(parent_key) {
                break;
            }
            let Some(parent) = self.get(parent_key) else { break };
            out.push(parent);
            current = parent.parent_key.as_deref();
        }
        out
    }

    /// `candidate` 是否位于 `ancestor` 的子树内（不含自身）
    pub fn is_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        self.ancestors(candidate).iter().any(|a| a.menu_key == ancestor)
    }

    /// 新节点应有的层级
    pub fn level_for_parent(&self, parent_key: Option<&str>) -> i32 {
        parent_key.and_then(|p| self.get(p)).map_or(ROOT_LEVEL, |p| p.level + 1)
    }

    /// 同级末尾的下一个排序号
    pub fn next_sort_order(&self, parent_key: Option<&str>) -> i32 {
        self.configs
            .values()
            .filter(|c| c.parent_key.as_deref() == parent_key)
            .map(|c| c.sort_order + 1)
            .max()
            .unwrap_or(FIRST_SORT_ORDER)
    }

    pub fn sort_order_taken(&self, parent_key: Option<&str>, sort_order: i32, exclude_key: Option<&str>) -> bool {
        self.configs.values().any(|c| {
            c.parent_key.as_deref() == parent_key
                && c.sort_order == sort_order
                && Some(c.menu_key.as_str()) != exclude_key
        })
    }

    /// 把整棵子树的层级平移，使根节点落到 `new_level`；返回层级变化的 key
    pub(crate) fn relevel_subtree(&mut self, key: &str, new_level: i32) -> Vec<String> {
        let Some(old_level) = self.get(key).map(|c| c.level) else {
            return Vec::new();
        };
        let delta = new_level - old_level;
        if delta == 0 {
            return Vec::new();
        }
        let keys = self.subtree_keys(key);
        for k in &keys {
            if let Some(config) = self.get_mut(k) {
                config.level += delta;
            }
        }
        keys
    }

    /// 按给定顺序为同级节点连续编号，返回排序号变化的 key
    pub(crate) fn renumber(&mut self, ordered_keys: &[String], updated_at: i64) -> Vec<String> {
        let mut changed = Vec::new();
        for (index, key) in ordered_keys.iter().enumerate() {
            let order = FIRST_SORT_ORDER + index as i32;
            if self.get(key).is_some_and(|c| c.sort_order != order) {
                if let Some(config) = self.get_mut(key) {
                    config.sort_order = order;
                    config.updated_at = updated_at;
                }
                changed.push(key.clone());
            }
        }
        changed
    }

    /// 按层级、同级顺序输出（父节点总在子节点之前），用于导出和默认列表
    pub fn ordered_configs(&self) -> Vec<&MenuPermissionConfig> {
        let mut out = Vec::with_capacity(self.configs.len());
        let mut queue: VecDeque<&MenuPermissionConfig> = VecDeque::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let roots = self
            .configs
            .values()
            .filter(|c| c.parent_key.as_deref().is_none_or(|p| !self.contains(p)));
        let mut roots: Vec<&MenuPermissionConfig> = roots.collect();
        roots.sort_by(|a, b| a.sibling_cmp(b));
        queue.extend(roots);
        while let Some(config) = queue.pop_front() {
            if !seen.insert(config.menu_key.as_str()) {
                continue;
            }
            out.push(config);
            queue.extend(self.children_of(Some(&config.menu_key)));
        }
        // 环上的节点无法从根到达，按 key 追加到末尾
        if out.len() < self.configs.len() {
            let mut rest: Vec<&MenuPermissionConfig> =
                self.configs.values().filter(|c| !seen.contains(c.menu_key.as_str())).collect();
            rest.sort_by(|a, b| a.menu_key.cmp(&b.menu_key));
            out.extend(rest);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str, parent: Option<&str>, sort_order: i32, level: i32) -> MenuPermissionConfig {
        MenuPermissionConfig {
            menu_key: key.into(),
            menu_name: key.into(),
            parent_key: parent.map(Into::into),
            sort_order,
            level,
            ..Default::default()
        }
    }

    fn sample() -> MenuConfigStore {
        MenuConfigStore::from_configs(vec![
            config("system", None, 1, 1),
            config("user", Some("system"), 2, 2),
            config("role", Some("system"), 1, 2),
            config("user.add", Some("user"), 1, 3),
        ])
    }

    #[test]
    fn children_follow_sort_order() {
        let store = sample();
        let keys: Vec<&str> = store.children_of(Some("system")).iter().map(|c| c.menu_key.as_str()).collect();
        assert_eq!(keys, vec!["role", "user"]);
        assert_eq!(store.children_of(None).len(), 1);
    }

    #[test]
    fn subtree_is_preorder() {
        assert_eq!(sample().subtree_keys("system"), vec!["system", "role", "user", "user.add"]);
        assert!(sample().subtree_keys("missing").is_empty());
    }

    #[test]
    fn ancestors_and_descendant_checks() {
        let store = sample();
        let chain: Vec<&str> = store.ancestors("user.add").iter().map(|c| c.menu_key.as_str()).collect();
        assert_eq!(chain, vec!["user", "system"]);
        assert!(store.is_descendant("user.add", "system"));
        assert!(!store.is_descendant("system", "user"));
    }

    #[test]
    fn ancestors_stop_on_cycle() {
        let store = MenuConfigStore::from_configs(vec![config("a", Some("b"), 1, 1), config("b", Some("a"), 1, 1)]);
        assert_eq!(store.ancestors("a").len(), 1);
        assert_eq!(store.subtree_keys("a"), vec!["a", "b"]);
    }

    #[test]
    fn relevel_shifts_whole_subtree_by_delta() {
        let mut store = sample();
        let changed = store.relevel_subtree("user", 5);
        assert_eq!(changed, vec!["user", "user.add"]);
        assert_eq!(store.get("user").unwrap().level, 5);
        assert_eq!(store.get("user.add").unwrap().level, 6);
        assert_eq!(store.get("role").unwrap().level, 2);
    }

    #[test]
    fn sort_order_helpers() {
        let store = sample();
        assert_eq!(store.next_sort_order(Some("system")), 3);
        assert_eq!(store.next_sort_order(Some("role")), FIRST_SORT_ORDER);
        assert!(store.sort_order_taken(Some("system"), 1, None));
        assert!(!store.sort_order_taken(Some("system"), 1, Some("role")));
    }

    #[test]
    fn writes_bump_revision() {
        let mut store = sample();
        let before = store.revision();
        store.insert(config("x", None, 2, 1));
        store.remove("x");
        assert_eq!(store.revision(), before + 2);
    }

    #[test]
    fn ordered_configs_put_parents_first() {
        let keys: Vec<String> = sample().ordered_configs().iter().map(|c| c.menu_key.clone()).collect();
        assert_eq!(keys, vec!["system", "role", "user", "user.add"]);
    }
}
