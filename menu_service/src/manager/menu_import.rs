use crate::entitys::menu_permission_entity::MenuPermissionConfig;
use crate::entitys::menu_request_dto::{ImportMode, MenuConfigExport, MenuConfigImportRequest};
use crate::entitys::menu_result_dto::MenuImportResult;
use crate::manager::menu_manager::MenuPermissionManager;
use crate::manager::menu_store::MenuConfigStore;
use common::errors::{AppError, AppResult};
use common::util::common_utils::build_id;
use common::util::date_util::now_millis;
use log::{info, warn};
use std::collections::HashSet;
use validator::Validate;

/// 一个待写入的导入项：新增或覆盖
struct PendingItem {
    config: MenuPermissionConfig,
    overwrite: bool,
}

impl MenuPermissionManager {
    /// 导出指定 key（为空时导出全部），父节点总在子节点之前
    pub fn export(
        &self,
        keys: Option<&[String]>,
        exported_by: Option<String>,
        description: Option<String>,
    ) -> MenuConfigExport {
        let configs: Vec<MenuPermissionConfig> = match keys {
            None => self.store.ordered_configs().into_iter().cloned().collect(),
            Some(keys) => {
                let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
                for key in &wanted {
                    if !self.store.contains(key) {
                        warn!("export skipped unknown menu '{}'", key);
                    }
                }
                self.store
                    .ordered_configs()
                    .into_iter()
                    .filter(|c| wanted.contains(c.menu_key.as_str()))
                    .cloned()
                    .collect()
            }
        };
        MenuConfigExport {
            version: self.menu_config.export_version.clone(),
            exported_at: now_millis(),
            configs,
            exported_by: exported_by.or_else(|| self.menu_config.exported_by.clone()),
            description,
        }
    }

    pub fn export_json(&self, keys: Option<&[String]>, exported_by: Option<String>) -> AppResult<String> {
        let export = self.export(keys, exported_by, None);
        Ok(serde_json::to_string_pretty(&export)?)
    }

    pub fn parse_export(json: &str) -> AppResult<MenuConfigExport> {
        let export: MenuConfigExport = serde_json::from_str(json)?;
        if export.version.trim().is_empty() {
            return Err(AppError::validation("export file has no version"));
        }
        Ok(export)
    }

    /// 导入配置
    ///
    /// 两遍解析：第一遍写入父节点已可解析的项，其余缓存；第二遍对缓存项反复重试直到不再有进展，
    /// 仍无法解析的记为单项失败。部分成功是正常结果。
    /// 整个导入在副本上进行，结束后一次性替换仓库。
    pub fn import(&mut self, request: MenuConfigImportRequest) -> MenuImportResult {
        let mut result = MenuImportResult::default();
        let mut working = match request.import_mode {
            ImportMode::Replace => MenuConfigStore::new(),
            ImportMode::Merge | ImportMode::Append => self.store.clone(),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut pending: Vec<PendingItem> = Vec::new();
        for config in request.configs {
            let key = config.menu_key.clone();
            if let Err(e) = config.validate() {
                result.fail(&key, AppError::from(e).to_string());
                continue;
            }
            if !seen.insert(key.clone()) {
                result.fail(&key, "duplicate menu key in import batch");
                continue;
            }
            if working.contains(&key) {
                let conflict = AppError::conflict(format!("menu '{}' already exists", key));
                match request.import_mode {
                    ImportMode::Merge if request.overwrite_existing => {
                        pending.push(PendingItem { config, overwrite: true });
                    }
                    _ => result.skip(conflict.to_string()),
                }
                continue;
            }
            pending.push(PendingItem { config, overwrite: false });
        }

        // 第一遍
        let mut buffered: Vec<PendingItem> = Vec::new();
        for item in pending {
            match resolve(&working, &item) {
                Resolution::Ready => apply(&mut working, item, &mut result),
                Resolution::Waiting => buffered.push(item),
                Resolution::Invalid(message) => result.fail(&item.config.menu_key, message),
            }
        }

        // 第二遍：只处理缓存项，按轮次推进，直到没有新的可解析项
        loop {
            let mut progressed = false;
            let mut still_waiting = Vec::new();
            for item in buffered {
                match resolve(&working, &item) {
                    Resolution::Ready => {
                        apply(&mut working, item, &mut result);
                        progressed = true;
                    }
                    Resolution::Waiting => still_waiting.push(item),
                    Resolution::Invalid(message) => result.fail(&item.config.menu_key, message),
                }
            }
            buffered = still_waiting;
            if !progressed || buffered.is_empty() {
                break;
            }
        }
        for item in buffered {
            let parent = item.config.parent_key.clone().unwrap_or_default();
            result.fail(&item.config.menu_key, format!("parent menu '{}' not found", parent));
        }

        self.store.adopt(working);
        self.prune_ui_state();
        self.invalidate();
        result.success = result.failed_count == 0;
        info!(
            "menu import ({}) finished: imported={} skipped={} failed={}",
            request.import_mode, result.imported_count, result.skipped_count, result.failed_count
        );
        result
    }

    pub fn import_export(
        &mut self,
        export: MenuConfigExport,
        import_mode: ImportMode,
        overwrite_existing: bool,
    ) -> MenuImportResult {
        self.import(MenuConfigImportRequest { configs: export.configs, import_mode, overwrite_existing })
    }
}

enum Resolution {
    Ready,
    Waiting,
    Invalid(String),
}

fn resolve(working: &MenuConfigStore, item: &PendingItem) -> Resolution {
    let key = item.config.menu_key.as_str();
    match item.config.parent_key.as_deref() {
        None => Resolution::Ready,
        Some(parent) if parent == key => Resolution::Invalid("menu cannot be its own parent".to_string()),
        Some(parent) if !working.contains(parent) => Resolution::Waiting,
        Some(parent) if item.overwrite && working.is_descendant(parent, key) => {
            Resolution::Invalid(format!("parent '{}' is inside the subtree of '{}'", parent, key))
        }
        Some(_) => Resolution::Ready,
    }
}

fn apply(working: &mut MenuConfigStore, item: PendingItem, result: &mut MenuImportResult) {
    let now = now_millis();
    let mut config = item.config;
    let parent = config.parent_key.clone();
    let key = config.menu_key.clone();
    let previous = working.get(&key).cloned();

    match &previous {
        Some(existing) => {
            config.id = existing.id.clone();
            config.created_at = existing.created_at;
            config.updated_at = now;
            // 层级稍后整体平移
            config.level = existing.level;
        }
        None => {
            if config.id.is_empty() {
                config.id = build_id();
            }
            if config.created_at <= 0 {
                config.created_at = now;
            }
            config.level = working.level_for_parent(parent.as_deref());
            if config.updated_at <= 0 {
                config.updated_at = now;
            }
        }
    }
    if working.sort_order_taken(parent.as_deref(), config.sort_order, Some(&key)) {
        let next = working.next_sort_order(parent.as_deref());
        result.warnings.push(format!(
            "menu '{}' sort order {} clashes with a sibling, moved to {}",
            key, config.sort_order, next
        ));
        config.sort_order = next;
    }
    let id = config.id.clone();
    working.insert(config);
    if previous.is_some() {
        let new_level = working.level_for_parent(parent.as_deref());
        working.relevel_subtree(&key, new_level);
    }
    result.imported_count += 1;
    result.imported_ids.push(id);
}
