use crate::entitys::menu_permission_entity::MenuTreeNode;
use dashmap::DashMap;

/// 单个节点的展示状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeUiState {
    pub expanded: bool,
    pub selected: bool,
}

/// 进行中的拖拽
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragSession {
    pub source_key: Option<String>,
    pub drop_target: Option<String>,
}

impl DragSession {
    pub fn is_dragging(&self) -> bool {
        self.source_key.is_some()
    }
}

/// 展示层状态，与持久化的配置实体分离，按 menu_key 索引
#[derive(Debug, Default)]
pub struct MenuUiState {
    nodes: DashMap<String, NodeUiState>,
    pub(crate) drag: DragSession,
}

impl MenuUiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> NodeUiState {
        self.nodes.get(key).map(|s| *s).unwrap_or_default()
    }

    pub fn set_expanded(&self, key: &str, expanded: bool) {
        self.nodes.entry(key.to_string()).or_default().expanded = expanded;
    }

    /// 切换展开状态，返回切换后的值
    pub fn toggle_expanded(&self, key: &str) -> bool {
        let mut entry = self.nodes.entry(key.to_string()).or_default();
        entry.expanded = !entry.expanded;
        entry.expanded
    }

    /// 单选：选中一个节点时取消其它节点的选中
    pub fn select(&self, key: Option<&str>) {
        for mut entry in self.nodes.iter_mut() {
            entry.selected = false;
        }
        if let Some(key) = key {
            self.nodes.entry(key.to_string()).or_default().selected = true;
        }
    }

    pub fn selected_key(&self) -> Option<String> {
        self.nodes.iter().find(|e| e.selected).map(|e| e.key().clone())
    }

    pub fn expand_all<'a>(&self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            self.set_expanded(key, true);
        }
    }

    pub fn collapse_all(&self) {
        for mut entry in self.nodes.iter_mut() {
            entry.expanded = false;
        }
    }

    /// 只保留 `keep` 返回 true 的节点状态，节点被删除或整体替换后调用
    pub fn retain(&self, keep: impl Fn(&str) -> bool) {
        self.nodes.retain(|key, _| keep(key));
    }

    pub fn drag_session(&self) -> &DragSession {
        &self.drag
    }

    /// 把展示状态叠加到一棵派生树上
    pub fn overlay(&self, nodes: &mut [MenuTreeNode]) {
        for node in nodes {
            let state = self.get(&node.config.menu_key);
            node.expanded = state.expanded;
            node.selected = state.selected;
            self.overlay(&mut node.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitys::menu_permission_entity::MenuPermissionConfig;

    #[test]
    fn toggle_and_collapse() {
        let state = MenuUiState::new();
        assert!(state.toggle_expanded("a"));
        assert!(!state.toggle_expanded("a"));
        state.expand_all(["a", "b"]);
        assert!(state.get("b").expanded);
        state.collapse_all();
        assert!(!state.get("a").expanded && !state.get("b").expanded);
    }

    #[test]
    fn retain_drops_unknown_keys() {
        let state = MenuUiState::new();
        state.set_expanded("a", true);
        state.select(Some("b"));
        state.retain(|key| key == "a");
        assert!(state.get("a").expanded);
        assert_eq!(state.selected_key(), None);
    }

    #[test]
    fn selection_is_single() {
        let state = MenuUiState::new();
        state.select(Some("a"));
        state.select(Some("b"));
        assert_eq!(state.selected_key().as_deref(), Some("b"));
        assert!(!state.get("a").selected);
        state.select(None);
        assert_eq!(state.selected_key(), None);
    }

    #[test]
    fn overlay_sets_flags_without_touching_config() {
        let state = MenuUiState::new();
        state.set_expanded("root", true);
        let config = MenuPermissionConfig { menu_key: "root".into(), ..Default::default() };
        let mut nodes = vec![MenuTreeNode::new(config.clone())];
        state.overlay(&mut nodes);
        assert!(nodes[0].expanded);
        assert_eq!(nodes[0].config, config);
    }
}
