use crate::biz_service::permission_registry::PermissionRegistry;
use crate::entitys::menu_permission_entity::MenuTreeNode;
use crate::entitys::menu_request_dto::{MenuPreviewConfig, PreviewMode};
use crate::entitys::menu_result_dto::{MenuPreviewResult, PreviewMenuNode, PreviewStats};
use crate::manager::menu_manager::MenuPermissionManager;
use crate::manager::menu_tree::MenuTreeBuild;
use crate::manager::permission_evaluator::{MenuVisibility, PermissionSet, evaluate_tree};
use common::errors::{AppError, AppResult};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// 权限预览：模拟某个角色/用户看到的菜单，只读
pub struct MenuPreviewService {
    registry: Arc<dyn PermissionRegistry>,
}

impl MenuPreviewService {
    pub fn new(registry: Arc<dyn PermissionRegistry>) -> Self {
        Self { registry }
    }

    /// 按预览模式解析可用权限集合
    pub async fn resolve_permissions(&self, config: &MenuPreviewConfig) -> AppResult<PermissionSet> {
        let role_id = config.role_id.as_deref().filter(|s| !s.is_empty());
        let user_id = config.user_id.as_deref().filter(|s| !s.is_empty());
        let mut available = PermissionSet::default();
        match config.preview_mode {
            PreviewMode::Role => {
                let role_id = role_id.ok_or_else(|| AppError::validation("role_id is required for role preview"))?;
                available.extend(self.registry.fetch_role_permissions(role_id).await?);
            }
            PreviewMode::User => {
                let user_id = user_id.ok_or_else(|| AppError::validation("user_id is required for user preview"))?;
                available.extend(self.registry.fetch_user_permissions(user_id).await?);
            }
            PreviewMode::Combined => {
                if role_id.is_none() && user_id.is_none() {
                    return Err(AppError::validation("combined preview requires role_id or user_id"));
                }
                if let Some(role_id) = role_id {
                    available.extend(self.registry.fetch_role_permissions(role_id).await?);
                }
                if let Some(user_id) = user_id {
                    available.extend(self.registry.fetch_user_permissions(user_id).await?);
                }
            }
        }
        debug!("preview {:?}: {} permissions resolved", config.preview_mode, available.len());
        Ok(available)
    }

    /// 解析权限后在当前快照上计算预览
    ///
    /// 先完成异步的权限解析，再短暂持有读锁取树快照，锁不跨越 await。
    pub async fn preview(
        &self,
        manager: &RwLock<MenuPermissionManager>,
        config: &MenuPreviewConfig,
    ) -> AppResult<MenuPreviewResult> {
        let available = self.resolve_permissions(config).await?;
        let tree = snapshot_tree(manager)?;
        let result = preview_menus(&tree, &available, config);
        info!(
            "menu preview {:?}: visible={} hidden={} denied={}",
            config.preview_mode,
            result.stats.visible_count,
            result.stats.hidden_count,
            result.stats.permission_denied_count
        );
        Ok(result)
    }
}

fn snapshot_tree(manager: &RwLock<MenuPermissionManager>) -> AppResult<Arc<MenuTreeBuild>> {
    let guard = manager.read().map_err(|e| AppError::Internal(format!("menu manager lock poisoned: {}", e)))?;
    Ok(guard.menu_tree())
}

/// 在给定权限集合下计算可见森林与隐藏森林
///
/// 可见森林只保留有效可见的节点；隐藏森林收集「父节点可见（或自身为根）但自身不可见」的节点
/// 连同整棵子树，仅在 `show_hidden_menus` 时填充。每个节点带上其在树中的父节点 key，
/// 隐藏森林的根据此定位到可见森林中的挂载点。
pub fn preview_menus(tree: &MenuTreeBuild, available: &PermissionSet, config: &MenuPreviewConfig) -> MenuPreviewResult {
    let visibility = evaluate_tree(&tree.roots, available);
    let with_info = config.show_permission_info;

    let mut stats = PreviewStats { total_menus: visibility.len(), ..Default::default() };
    for v in visibility.values() {
        if v.is_visible {
            stats.visible_count += 1;
        } else {
            stats.hidden_count += 1;
        }
        if !v.has_permission {
            stats.permission_denied_count += 1;
        }
    }

    let ctx = PreviewContext { visibility: &visibility, with_info };
    let visible_menus = ctx.visible_forest(&tree.roots, None);
    let hidden_menus = if config.show_hidden_menus {
        let mut hidden = Vec::new();
        ctx.collect_hidden(&tree.roots, None, &mut hidden);
        hidden
    } else {
        Vec::new()
    };

    MenuPreviewResult {
        visible_menus,
        hidden_menus,
        stats,
        available_permissions: with_info.then(|| available.to_sorted_vec()),
        warnings: tree.warnings.clone(),
    }
}

struct PreviewContext<'a> {
    visibility: &'a HashMap<String, MenuVisibility>,
    with_info: bool,
}

impl PreviewContext<'_> {
    fn visible_forest(&self, nodes: &[MenuTreeNode], parent: Option<&str>) -> Vec<PreviewMenuNode> {
        nodes
            .iter()
            .filter_map(|node| {
                let v = self.visibility.get(&node.config.menu_key).filter(|v| v.is_visible)?;
                let mut out = self.preview_node(node, v, parent);
                out.children = self.visible_forest(&node.children, Some(node.config.menu_key.as_str()));
                Some(out)
            })
            .collect()
    }

    fn collect_hidden(&self, nodes: &[MenuTreeNode], parent: Option<&str>, out: &mut Vec<PreviewMenuNode>) {
        for node in nodes {
            match self.visibility.get(&node.config.menu_key) {
                Some(v) if v.is_visible => {
                    self.collect_hidden(&node.children, Some(node.config.menu_key.as_str()), out)
                }
                Some(_) => out.push(self.full_subtree(node, parent)),
                None => {}
            }
        }
    }

    fn full_subtree(&self, node: &MenuTreeNode, parent: Option<&str>) -> PreviewMenuNode {
        let v = self.visibility.get(&node.config.menu_key).cloned().unwrap_or_default();
        let mut out = self.preview_node(node, &v, parent);
        let key = Some(node.config.menu_key.as_str());
        out.children = node.children.iter().map(|child| self.full_subtree(child, key)).collect();
        out
    }

    fn preview_node(&self, node: &MenuTreeNode, v: &MenuVisibility, parent: Option<&str>) -> PreviewMenuNode {
        let config = &node.config;
        PreviewMenuNode {
            menu_key: config.menu_key.clone(),
            menu_name: config.menu_name.clone(),
            parent_key: parent.map(str::to_string),
            menu_type: config.menu_type,
            status: config.status,
            level: config.level,
            has_permission: v.has_permission,
            is_visible: v.is_visible,
            required_permissions: self.with_info.then(|| config.required_permissions.iter().cloned().collect()),
            missing_permissions: self.with_info.then(|| v.missing_permissions.clone()),
            hidden_reason: v.hidden_reason,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biz_service::permission_registry::StaticPermissionRegistry;
    use crate::entitys::menu_permission_entity::PermissionLogic;
    use crate::entitys::menu_request_dto::UpdateMenuRequest;
    use crate::manager::menu_manager::test_support::sample_manager;
    use crate::manager::permission_evaluator::HiddenReason;

    fn guarded_manager() -> MenuPermissionManager {
        let mut manager = sample_manager();
        for (key, permission) in [("system", "system.view"), ("system.user", "system.user.read")] {
            let patch = UpdateMenuRequest {
                required_permissions: Some([permission.to_string()].into()),
                permission_logic: Some(PermissionLogic::And),
                ..Default::default()
            };
            manager.update(key, patch).unwrap();
        }
        manager
    }

    fn service() -> MenuPreviewService {
        let registry = StaticPermissionRegistry::new();
        registry.set_role_permissions("viewer", ["system.view"]);
        registry.set_role_permissions("admin", ["system.*"]);
        registry.set_user_permissions("alice", ["system.user.read"]);
        MenuPreviewService::new(Arc::new(registry))
    }

    fn keys(nodes: &[PreviewMenuNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.menu_key.as_str()).collect()
    }

    #[tokio::test]
    async fn hidden_parent_hides_permitted_children() {
        let manager = RwLock::new(guarded_manager());
        let config =
            MenuPreviewConfig { role_id: Some("viewer".into()), show_hidden_menus: true, ..Default::default() };
        let result = service().preview(&manager, &config).await.unwrap();

        assert_eq!(keys(&result.visible_menus), vec!["system", "dashboard"]);
        assert_eq!(keys(&result.visible_menus[0].children), vec!["system.role"]);
        assert_eq!(keys(&result.hidden_menus), vec!["system.user"]);
        let hidden = &result.hidden_menus[0];
        assert_eq!(hidden.hidden_reason, Some(HiddenReason::PermissionDenied));
        assert!(hidden.children.iter().all(|c| c.has_permission && !c.is_visible));
        assert_eq!(hidden.children[0].hidden_reason, Some(HiddenReason::AncestorHidden));
        let expected = PreviewStats { total_menus: 6, visible_count: 3, hidden_count: 3, permission_denied_count: 1 };
        assert_eq!(result.stats, expected);
        assert!(result.available_permissions.is_none());
        assert!(hidden.required_permissions.is_none());
    }

    #[tokio::test]
    async fn combined_mode_unions_role_and_user() {
        let manager = RwLock::new(guarded_manager());
        let config = MenuPreviewConfig {
            role_id: Some("viewer".into()),
            user_id: Some("alice".into()),
            preview_mode: PreviewMode::Combined,
            show_permission_info: true,
            ..Default::default()
        };
        let result = service().preview(&manager, &config).await.unwrap();
        assert_eq!(result.stats.visible_count, 6);
        assert!(result.hidden_menus.is_empty());
        let expected = vec!["system.user.read".to_string(), "system.view".to_string()];
        assert_eq!(result.available_permissions, Some(expected));
        assert_eq!(result.visible_menus[0].required_permissions, Some(vec!["system.view".to_string()]));
    }

    #[tokio::test]
    async fn wildcard_role_sees_everything() {
        let manager = RwLock::new(guarded_manager());
        let config = MenuPreviewConfig { role_id: Some("admin".into()), ..Default::default() };
        let result = service().preview(&manager, &config).await.unwrap();
        assert_eq!(result.stats.hidden_count, 0);
    }

    #[tokio::test]
    async fn missing_ids_are_validation_errors() {
        let svc = service();
        let role = MenuPreviewConfig::default();
        assert!(matches!(svc.resolve_permissions(&role).await, Err(AppError::Validation(_))));
        let user =
            MenuPreviewConfig { preview_mode: PreviewMode::User, role_id: Some("viewer".into()), ..Default::default() };
        assert!(matches!(svc.resolve_permissions(&user).await, Err(AppError::Validation(_))));
        let combined = MenuPreviewConfig { preview_mode: PreviewMode::Combined, ..Default::default() };
        assert!(matches!(svc.resolve_permissions(&combined).await, Err(AppError::Validation(_))));
        let unknown = MenuPreviewConfig { role_id: Some("nobody".into()), ..Default::default() };
        assert!(matches!(svc.resolve_permissions(&unknown).await, Err(AppError::NotFound(_))));
    }

    #[test]
    fn preview_does_not_touch_the_store() {
        let manager = guarded_manager();
        let before = manager.store().clone();
        let config = MenuPreviewConfig { show_hidden_menus: true, show_permission_info: true, ..Default::default() };
        let result = preview_menus(&manager.menu_tree(), &PermissionSet::default(), &config);
        assert_eq!(keys(&result.visible_menus), vec!["dashboard"]);
        assert_eq!(keys(&result.hidden_menus), vec!["system"]);
        assert_eq!(result.hidden_menus[0].missing_permissions, Some(vec!["system.view".to_string()]));
        assert_eq!(manager.store(), &before);
    }

    #[test]
    fn hidden_roots_keep_their_tree_parent() {
        let manager = guarded_manager();
        let config = MenuPreviewConfig { show_hidden_menus: true, ..Default::default() };
        let available = PermissionSet::new(["system.view"]);
        let result = preview_menus(&manager.menu_tree(), &available, &config);
        let hidden = &result.hidden_menus[0];
        assert_eq!(hidden.menu_key, "system.user");
        assert_eq!(hidden.parent_key.as_deref(), Some("system"));
        assert!(hidden.children.iter().all(|c| c.parent_key.as_deref() == Some("system.user")));
        assert_eq!(result.visible_menus[0].parent_key, None);
        assert_eq!(result.visible_menus[0].children[0].parent_key.as_deref(), Some("system"));
    }

    #[tokio::test]
    async fn preview_runs_on_a_spawned_task_against_the_shared_manager() {
        let manager = Arc::new(RwLock::new(guarded_manager()));
        let shared = manager.clone();
        let svc = service();
        let config = MenuPreviewConfig { role_id: Some("viewer".into()), ..Default::default() };
        let result = tokio::spawn(async move { svc.preview(&shared, &config).await }).await.unwrap().unwrap();
        assert_eq!(result.stats.visible_count, 3);
        // 预览结束后读锁已释放
        manager.write().unwrap().delete("dashboard", false).unwrap();
    }
}
