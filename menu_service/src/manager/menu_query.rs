use crate::entitys::menu_permission_entity::MenuPermissionConfig;
use crate::entitys::menu_request_dto::{MenuConfigQuery, MenuSortField};
use crate::manager::menu_manager::MenuPermissionManager;
use crate::manager::permission_evaluator::{MenuVisibility, PermissionSet, evaluate_node};
use common::errors::{AppError, AppResult};
use common::repository_util::{OrderType, PageResult};
use log::debug;
use std::cmp::Ordering;

impl MenuPermissionManager {
    /// 按条件查询配置列表
    pub fn fetch_configs(&self, query: &MenuConfigQuery) -> PageResult<MenuPermissionConfig> {
        let search = query.search.as_ref().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
        let mut items: Vec<&MenuPermissionConfig> = self
            .store
            .ordered_configs()
            .into_iter()
            .filter(|c| {
                search.as_ref().is_none_or(|s| {
                    c.menu_key.to_lowercase().contains(s)
                        || c.menu_name.to_lowercase().contains(s)
                        || c.menu_path.as_ref().is_some_and(|p| p.to_lowercase().contains(s))
                })
            })
            .filter(|c| query.menu_type.is_none_or(|t| c.menu_type == t))
            .filter(|c| query.status.is_none_or(|s| c.status == s))
            .filter(|c| query.parent_key.as_ref().is_none_or(|p| c.parent_key.as_ref() == Some(p)))
            .filter(|c| !query.root_only || c.is_root())
            .filter(|c| query.permission.as_ref().is_none_or(|p| c.required_permissions.contains(p)))
            .collect();

        // 默认顺序即树的层序，只有显式指定其它字段时才重新排序
        if let Some(field) = query.sort_by.filter(|f| *f != MenuSortField::SortOrder) {
            items.sort_by(|a, b| compare_by(field, a, b));
        }
        if query.sort_order == OrderType::Desc {
            items.reverse();
        }
        PageResult::paginate(items.into_iter().cloned().collect(), query.page)
    }

    /// 按 key 获取配置，`use_cache` 时优先读缓存
    pub fn fetch_by_key(&self, key: &str, use_cache: bool) -> AppResult<MenuPermissionConfig> {
        if use_cache {
            if let Some(config) = self.config_cache.get(key) {
                debug!("menu cache hit: {}", key);
                return Ok(config);
            }
        }
        let config = self.store.get(key).cloned().ok_or_else(|| AppError::not_found(format!("menu '{}'", key)))?;
        self.config_cache.insert(key, config.clone());
        Ok(config)
    }

    pub fn find_by_key(&self, key: &str) -> Option<&MenuPermissionConfig> {
        self.store.get(key)
    }

    pub fn get_children(&self, key: &str) -> Vec<&MenuPermissionConfig> {
        self.store.children_of(Some(key))
    }

    pub fn get_parent(&self, key: &str) -> Option<&MenuPermissionConfig> {
        self.store.get(key).and_then(|c| c.parent_key.as_deref()).and_then(|p| self.store.get(p))
    }

    /// 从直接父节点到根
    pub fn get_ancestors(&self, key: &str) -> Vec<&MenuPermissionConfig> {
        self.store.ancestors(key)
    }

    /// 子树中的所有后代（不含自身），先序
    pub fn get_descendants(&self, key: &str) -> Vec<&MenuPermissionConfig> {
        self.store.subtree_keys(key).iter().skip(1).filter_map(|k| self.store.get(k)).collect()
    }

    /// key 是否已被占用，`exclude_key` 用于编辑时排除自身
    pub fn key_exists(&self, key: &str, exclude_key: Option<&str>) -> bool {
        exclude_key != Some(key) && self.store.contains(key)
    }

    /// 校验某个菜单在给定权限集合下是否可见（含祖先判定）
    pub fn validate_permission(&self, key: &str, available: &PermissionSet) -> AppResult<MenuVisibility> {
        let config = self.store.get(key).ok_or_else(|| AppError::not_found(format!("menu '{}'", key)))?;
        // 祖先从根往下逐级判定
        let mut ancestors_visible = true;
        for ancestor in self.store.ancestors(key).into_iter().rev() {
            ancestors_visible = evaluate_node(ancestor, available, ancestors_visible).is_visible;
        }
        Ok(evaluate_node(config, available, ancestors_visible))
    }
}

fn compare_by(field: MenuSortField, a: &MenuPermissionConfig, b: &MenuPermissionConfig) -> Ordering {
    let primary = match field {
        MenuSortField::SortOrder => a.sort_order.cmp(&b.sort_order),
        MenuSortField::MenuKey => a.menu_key.cmp(&b.menu_key),
        MenuSortField::MenuName => a.menu_name.cmp(&b.menu_name),
        MenuSortField::Level => a.level.cmp(&b.level),
        MenuSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        MenuSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    primary.then_with(|| a.menu_key.cmp(&b.menu_key))
}
