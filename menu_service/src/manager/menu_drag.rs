use crate::entitys::menu_request_dto::{DropType, MenuDragOperation};
use crate::entitys::menu_result_dto::MenuMoveResult;
use crate::manager::menu_manager::MenuPermissionManager;
use common::util::date_util::now_millis;
use log::{debug, info, warn};

impl MenuPermissionManager {
    /// 开始拖拽，源节点不存在时返回 false
    pub fn start_drag(&mut self, source_key: &str) -> bool {
        if !self.store.contains(source_key) {
            return false;
        }
        self.ui_state.drag.source_key = Some(source_key.to_string());
        self.ui_state.drag.drop_target = None;
        true
    }

    /// 记录悬停目标，返回该目标是否允许放置
    pub fn set_drop_target(&mut self, target_key: &str) -> bool {
        let Some(source) = self.ui_state.drag.source_key.clone() else {
            return false;
        };
        self.ui_state.drag.drop_target = Some(target_key.to_string());
        self.check_drop(&source, target_key).is_ok()
    }

    pub fn end_drag(&mut self) {
        self.ui_state.drag = Default::default();
    }

    pub fn can_drop(&self, source_key: &str, target_key: &str) -> bool {
        self.check_drop(source_key, target_key).is_ok()
    }

    fn check_drop(&self, source_key: &str, target_key: &str) -> Result<(), String> {
        if !self.store.contains(source_key) {
            return Err(format!("source menu '{}' not found", source_key));
        }
        if !self.store.contains(target_key) {
            return Err(format!("target menu '{}' not found", target_key));
        }
        if source_key == target_key {
            return Err("cannot drop a menu onto itself".to_string());
        }
        if self.store.is_descendant(target_key, source_key) {
            return Err(format!("cannot move '{}' into its own subtree", source_key));
        }
        Ok(())
    }

    /// 提交一次移动
    ///
    /// - `before` / `after`：挂到目标的父节点下，插在目标前/后，新旧同级都重新连续编号；
    /// - `inner`：成为目标的最后一个子节点。
    ///
    /// 源节点的整棵子树按同一差值调整层级。非法移动返回 `success=false`，仓库不变。
    pub fn move_menu(&mut self, operation: &MenuDragOperation) -> MenuMoveResult {
        let source_key = operation.source_menu_key.as_str();
        let target_key = operation.target_menu_key.as_str();
        if let Err(message) = self.check_drop(source_key, target_key) {
            warn!("menu move rejected: {}", message);
            return MenuMoveResult::rejected(message);
        }
        let Some(target) = self.store.get(target_key) else {
            return MenuMoveResult::rejected(format!("target menu '{}' not found", target_key));
        };
        let old_parent = self.store.get(source_key).and_then(|c| c.parent_key.clone());
        let new_parent = match operation.drop_type {
            DropType::Inner => Some(target_key.to_string()),
            // 父节点缺失的目标按根节点处理，与建树规则一致
            DropType::Before | DropType::After => {
                target.parent_key.clone().filter(|parent| self.store.contains(parent))
            }
        };
        let new_level = self.store.level_for_parent(new_parent.as_deref());

        // 新同级顺序（不含源节点）
        let mut siblings: Vec<String> = self
            .store
            .children_of(new_parent.as_deref())
            .into_iter()
            .map(|c| c.menu_key.clone())
            .filter(|k| k != source_key)
            .collect();
        let insert_at = match operation.drop_type {
            DropType::Inner => siblings.len(),
            DropType::Before => siblings.iter().position(|k| k == target_key).unwrap_or(siblings.len()),
            DropType::After => siblings.iter().position(|k| k == target_key).map_or(siblings.len(), |i| i + 1),
        };
        siblings.insert(insert_at, source_key.to_string());

        if operation.new_parent_key.is_some() && operation.new_parent_key != new_parent {
            debug!(
                "menu move: client expected parent {:?}, computed {:?}",
                operation.new_parent_key, new_parent
            );
        }

        let now = now_millis();
        let mut updated_keys = Vec::new();
        let parent_changed = old_parent != new_parent;
        if parent_changed {
            if let Some(source) = self.store.get_mut(source_key) {
                source.parent_key = new_parent.clone();
                source.updated_at = now;
            }
            updated_keys.push(source_key.to_string());
            updated_keys.extend(self.store.relevel_subtree(source_key, new_level));

            let old_siblings: Vec<String> =
                self.store.children_of(old_parent.as_deref()).into_iter().map(|c| c.menu_key.clone()).collect();
            updated_keys.extend(self.store.renumber(&old_siblings, now));
        }
        updated_keys.extend(self.store.renumber(&siblings, now));
        updated_keys.sort();
        updated_keys.dedup();

        let new_sort_order = self.store.get(source_key).map(|c| c.sort_order);
        self.invalidate();
        info!(
            "menu moved: {} {} {} -> parent={:?} sort_order={:?}",
            source_key, operation.drop_type, target_key, new_parent, new_sort_order
        );
        MenuMoveResult { success: true, message: None, new_parent_key: new_parent, new_sort_order, updated_keys }
    }
}
