use crate::entitys::menu_permission_entity::{MenuPermissionConfig, MenuStatus};
use crate::entitys::menu_request_dto::{BatchMenuOperationRequest, BatchOperation, CreateMenuRequest, UpdateMenuRequest};
use crate::entitys::menu_result_dto::{BatchOperationResult, DeleteMenuResult};
use crate::manager::menu_manager::MenuPermissionManager;
use common::errors::{AppError, AppResult};
use common::util::common_utils::build_id;
use common::util::date_util::now_millis;
use log::{info, warn};
use std::collections::HashSet;
use validator::Validate;

impl MenuPermissionManager {
    /// 新建菜单
    ///
    /// key 重复、父节点不存在、同级排序号冲突时返回 `Validation`，仓库不变。
    pub fn create(&mut self, request: CreateMenuRequest) -> AppResult<MenuPermissionConfig> {
        request.validate()?;
        if self.store.contains(&request.menu_key) {
            return Err(AppError::validation(format!("menu key '{}' already exists", request.menu_key)));
        }
        let parent = request.parent_key.as_deref();
        if let Some(parent_key) = parent {
            if !self.store.contains(parent_key) {
                return Err(AppError::validation(format!("parent menu '{}' not found", parent_key)));
            }
        }
        let sort_order = match request.sort_order {
            Some(order) if self.store.sort_order_taken(parent, order, None) => {
                return Err(AppError::validation(format!("sort order {} already used by a sibling", order)));
            }
            Some(order) => order,
            None => self.store.next_sort_order(parent),
        };

        let now = now_millis();
        let config = MenuPermissionConfig {
            id: build_id(),
            level: self.store.level_for_parent(parent),
            menu_key: request.menu_key,
            menu_name: request.menu_name,
            menu_path: request.menu_path,
            menu_icon: request.menu_icon,
            parent_key: request.parent_key,
            menu_type: request.menu_type,
            required_permissions: request.required_permissions,
            permission_logic: request.permission_logic,
            is_visible: request.is_visible,
            status: request.status,
            sort_order,
            created_at: now,
            updated_at: now,
            created_by: request.created_by,
        };
        self.store.insert(config.clone());
        self.invalidate();
        info!("menu created: key={} parent={:?} level={}", config.menu_key, config.parent_key, config.level);
        Ok(config)
    }

    /// 更新展示字段、权限、显隐和状态；结构字段走 [`MenuPermissionManager::move_menu`]
    pub fn update(&mut self, key: &str, request: UpdateMenuRequest) -> AppResult<MenuPermissionConfig> {
        let Some(existing) = self.store.get(key) else {
            return Err(AppError::not_found(format!("menu '{}'", key)));
        };
        if request.is_empty() {
            return Ok(existing.clone());
        }
        request.validate()?;
        let mut updated = existing.clone();
        if !request.apply_to(&mut updated) {
            return Ok(updated);
        }
        updated.updated_at = now_millis();
        self.store.insert(updated.clone());
        self.invalidate();
        info!("menu updated: key={}", key);
        Ok(updated)
    }

    /// 删除菜单
    ///
    /// 有子节点且未要求级联时返回 `Validation`；级联时整棵子树一起删除。
    pub fn delete(&mut self, key: &str, cascade: bool) -> AppResult<DeleteMenuResult> {
        if !self.store.contains(key) {
            return Err(AppError::not_found(format!("menu '{}'", key)));
        }
        if !cascade && self.store.has_children(key) {
            return Err(AppError::validation(format!("menu '{}' has children, cascade delete required", key)));
        }
        let deleted_keys = if cascade { self.store.subtree_keys(key) } else { vec![key.to_string()] };
        for k in &deleted_keys {
            self.store.remove(k);
        }
        self.prune_ui_state();
        self.invalidate();
        info!("menu deleted: key={} cascade={} removed={}", key, cascade, deleted_keys.len());
        Ok(DeleteMenuResult { deleted_keys })
    }

    /// 批量操作：逐个 key 独立执行，失败不回滚已成功的 key
    pub fn batch(&mut self, request: BatchMenuOperationRequest) -> BatchOperationResult {
        let cascade = request.params.as_ref().is_some_and(|p| p.cascade);
        let mut result = BatchOperationResult { success: true, ..Default::default() };
        let mut removed_in_batch: HashSet<String> = HashSet::new();

        for key in &request.menu_keys {
            let outcome = match request.operation {
                BatchOperation::Delete if removed_in_batch.contains(key) => Ok(()),
                BatchOperation::Delete => self.delete(key, cascade).map(|deleted| {
                    removed_in_batch.extend(deleted.deleted_keys);
                }),
                op => self.update(key, batch_patch(op)).map(|_| ()),
            };
            if let Err(e) = &outcome {
                warn!("batch {} failed for menu '{}': {}", request.operation, key, e);
            }
            result.push(key, outcome.map_err(|e| e.to_string()));
        }
        info!(
            "batch {} finished: success={} failed={}",
            request.operation, result.success_count, result.failed_count
        );
        result
    }
}

fn batch_patch(operation: BatchOperation) -> UpdateMenuRequest {
    match operation {
        BatchOperation::Show => UpdateMenuRequest { is_visible: Some(true), ..Default::default() },
        BatchOperation::Hide => UpdateMenuRequest { is_visible: Some(false), ..Default::default() },
        BatchOperation::Enable => UpdateMenuRequest { status: Some(MenuStatus::Visible), ..Default::default() },
        BatchOperation::Disable => UpdateMenuRequest { status: Some(MenuStatus::Disabled), ..Default::default() },
        BatchOperation::Delete => UpdateMenuRequest::default(),
    }
}

#[cfg(test)]
mod tests {
    use crate::biz_const::ROOT_LEVEL;
    use crate::entitys::menu_permission_entity::{MenuStatus, PermissionLogic};
    use crate::entitys::menu_request_dto::{
        BatchMenuOperationRequest, BatchOperation, BatchOperationParams, CreateMenuRequest, UpdateMenuRequest,
    };
    use crate::manager::menu_manager::test_support::{child_keys, sample_manager};
    use common::errors::AppError;

    #[test]
    fn create_assigns_generated_fields() {
        let manager = sample_manager();
        let add = manager.store().get("system.user.add").unwrap();
        assert_eq!(add.level, ROOT_LEVEL + 2);
        assert_eq!(add.id.len(), 32);
        assert!(add.created_at > 0);
        assert_eq!(child_keys(&manager, Some("system.user")), vec!["system.user.add", "system.user.delete"]);
        assert_eq!(manager.store().get("system.role").unwrap().sort_order, 2);
    }

    #[test]
    fn create_rejects_duplicate_key() {
        let mut manager = sample_manager();
        let before = manager.store().clone();
        let err = manager.create(CreateMenuRequest::new("system", "Again")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(manager.store(), &before);
    }

    #[test]
    fn create_rejects_unknown_parent() {
        let mut manager = sample_manager();
        let err = manager.create(CreateMenuRequest::new("orphan", "Orphan").parent("nope")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!manager.key_exists("orphan", None));
    }

    #[test]
    fn create_rejects_invalid_payload() {
        let mut manager = sample_manager();
        assert!(matches!(manager.create(CreateMenuRequest::new("bad key", "x")), Err(AppError::Validation(_))));
        assert!(matches!(manager.create(CreateMenuRequest::new("ok", "")), Err(AppError::Validation(_))));
        let bad_permission = CreateMenuRequest::new("ok", "Ok").permissions(PermissionLogic::Or, ["a..b"]);
        assert!(matches!(manager.create(bad_permission), Err(AppError::Validation(_))));
    }

    #[test]
    fn create_rejects_sibling_sort_order_clash() {
        let mut manager = sample_manager();
        let mut request = CreateMenuRequest::new("system.log", "Logs").parent("system");
        request.sort_order = Some(1);
        assert!(matches!(manager.create(request.clone()), Err(AppError::Validation(_))));
        // 不同父节点下可以复用排序号
        request.parent_key = Some("dashboard".into());
        assert_eq!(manager.create(request).unwrap().sort_order, 1);
    }

    #[test]
    fn update_patches_allowed_fields() {
        let mut manager = sample_manager();
        let patch = UpdateMenuRequest {
            menu_name: Some("People".into()),
            required_permissions: Some(["system.user.read".to_string()].into()),
            permission_logic: Some(PermissionLogic::Or),
            status: Some(MenuStatus::Hidden),
            ..Default::default()
        };
        let updated = manager.update("system.user", patch).unwrap();
        assert_eq!(updated.menu_name, "People");
        assert_eq!(updated.permission_logic, PermissionLogic::Or);
        assert_eq!(updated.status, MenuStatus::Hidden);
        assert_eq!(updated.parent_key.as_deref(), Some("system"));
        assert_eq!(manager.store().get("system.user").unwrap(), &updated);
    }

    #[test]
    fn update_unknown_key_is_not_found() {
        let mut manager = sample_manager();
        let err = manager.update("ghost", UpdateMenuRequest::default()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn delete_with_children_requires_cascade() {
        let mut manager = sample_manager();
        let before = manager.store().clone();
        let err = manager.delete("system.user", false).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(manager.store(), &before);
    }

    #[test]
    fn cascade_delete_removes_whole_subtree() {
        let mut manager = sample_manager();
        manager.ui_state().set_expanded("system.user", true);
        assert!(manager.start_drag("system.user.add"));
        let result = manager.delete("system.user", true).unwrap();
        assert_eq!(result.deleted_keys, vec!["system.user", "system.user.add", "system.user.delete"]);
        assert_eq!(manager.store().len(), 3);
        assert!(!manager.ui_state().get("system.user").expanded);
        assert!(!manager.ui_state().drag_session().is_dragging());
        assert!(matches!(manager.delete("system.user", true), Err(AppError::NotFound(_))));
    }

    #[test]
    fn delete_leaf_without_cascade() {
        let mut manager = sample_manager();
        let result = manager.delete("system.role", false).unwrap();
        assert_eq!(result.deleted_keys, vec!["system.role"]);
    }

    #[test]
    fn batch_reports_per_key_outcomes() {
        let mut manager = sample_manager();
        let result = manager.batch(BatchMenuOperationRequest {
            menu_keys: vec!["system.role".into(), "ghost".into(), "dashboard".into()],
            operation: BatchOperation::Hide,
            params: None,
        });
        assert!(!result.success);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failed_count, 1);
        assert!(!result.results[1].success);
        assert!(!manager.store().get("system.role").unwrap().is_visible);
        assert!(!manager.store().get("dashboard").unwrap().is_visible);

        let result = manager.batch(BatchMenuOperationRequest {
            menu_keys: vec!["dashboard".into()],
            operation: BatchOperation::Disable,
            params: None,
        });
        assert!(result.success);
        assert_eq!(manager.store().get("dashboard").unwrap().status, MenuStatus::Disabled);
    }

    #[test]
    fn batch_delete_honours_cascade_param() {
        let mut manager = sample_manager();
        let result = manager.batch(BatchMenuOperationRequest {
            menu_keys: vec!["system".into(), "system.role".into()],
            operation: BatchOperation::Delete,
            params: None,
        });
        assert_eq!(result.failed_count, 1);
        assert_eq!(result.success_count, 1);

        let result = manager.batch(BatchMenuOperationRequest {
            menu_keys: vec!["system".into(), "system.user.add".into()],
            operation: BatchOperation::Delete,
            params: Some(BatchOperationParams { cascade: true }),
        });
        assert!(result.success);
        assert_eq!(manager.store().len(), 1);
    }
}
