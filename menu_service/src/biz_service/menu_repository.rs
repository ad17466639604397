use crate::entitys::menu_permission_entity::MenuPermissionConfig;
use crate::entitys::menu_result_dto::MenuSyncResult;
use crate::manager::menu_manager::MenuPermissionManager;
use crate::manager::menu_store::MenuConfigStore;
use crate::manager::menu_tree::build_menu_tree;
use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use dashmap::DashMap;
use log::{info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// 配置持久化接口（网络 API 或数据库），重试与缓存由实现方负责
#[async_trait]
pub trait MenuConfigRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<MenuPermissionConfig>>;
    async fn get(&self, menu_key: &str) -> AppResult<Option<MenuPermissionConfig>>;
    async fn create(&self, config: &MenuPermissionConfig) -> AppResult<()>;
    async fn update(&self, config: &MenuPermissionConfig) -> AppResult<()>;
    async fn delete(&self, menu_key: &str) -> AppResult<()>;
}

/// 内存实现；`set_offline(true)` 后所有调用返回 `Transport` 错误
#[derive(Debug, Default)]
pub struct MemoryMenuConfigRepository {
    data: DashMap<String, MenuPermissionConfig>,
    offline: AtomicBool,
}

impl MemoryMenuConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configs(configs: impl IntoIterator<Item = MenuPermissionConfig>) -> Self {
        let repo = Self::new();
        for config in configs {
            repo.data.insert(config.menu_key.clone(), config);
        }
        repo
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Transport("menu config backend unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MenuConfigRepository for MemoryMenuConfigRepository {
    async fn list(&self) -> AppResult<Vec<MenuPermissionConfig>> {
        self.check_online()?;
        Ok(self.data.iter().map(|e| e.value().clone()).collect())
    }

    async fn get(&self, menu_key: &str) -> AppResult<Option<MenuPermissionConfig>> {
        self.check_online()?;
        Ok(self.data.get(menu_key).map(|e| e.value().clone()))
    }

    async fn create(&self, config: &MenuPermissionConfig) -> AppResult<()> {
        self.check_online()?;
        if self.data.contains_key(&config.menu_key) {
            return Err(AppError::conflict(format!("menu '{}' already stored", config.menu_key)));
        }
        self.data.insert(config.menu_key.clone(), config.clone());
        Ok(())
    }

    async fn update(&self, config: &MenuPermissionConfig) -> AppResult<()> {
        self.check_online()?;
        match self.data.get_mut(&config.menu_key) {
            Some(mut entry) => {
                *entry = config.clone();
                Ok(())
            }
            None => Err(AppError::not_found(format!("menu '{}'", config.menu_key))),
        }
    }

    async fn delete(&self, menu_key: &str) -> AppResult<()> {
        self.check_online()?;
        self.data.remove(menu_key);
        Ok(())
    }
}

impl MenuPermissionManager {
    /// 从持久化层整体重新加载
    ///
    /// 传输错误原样返回，此时仓库不变。加载后按父链重新推导层级，返回建树告警。
    pub async fn reload_from(&mut self, repository: &dyn MenuConfigRepository) -> AppResult<Vec<String>> {
        let configs = repository.list().await?;
        let tree = build_menu_tree(&configs);
        for warning in &tree.warnings {
            warn!("menu reload: {}", warning);
        }
        // 采用建树后的层级；孤儿与断环节点在仓库中也降为根
        let mut loaded = Vec::with_capacity(configs.len());
        for root in &tree.roots {
            let start = loaded.len();
            root.walk(&mut |node| loaded.push(node.config.clone()));
            loaded[start].parent_key = None;
        }
        let store = MenuConfigStore::from_configs(loaded);
        self.store.adopt(store);
        self.prune_ui_state();
        self.invalidate();
        info!("menu configs reloaded: {} items, {} warnings", configs.len(), tree.warnings.len());
        Ok(tree.warnings)
    }

    /// 把当前仓库同步到持久化层：新增、变更、删除
    pub async fn sync_to(&self, repository: &dyn MenuConfigRepository) -> AppResult<MenuSyncResult> {
        let remote = repository.list().await?;
        let remote_keys: HashSet<&str> = remote.iter().map(|c| c.menu_key.as_str()).collect();
        let mut result = MenuSyncResult::default();
        for config in self.store.ordered_configs() {
            if !remote_keys.contains(config.menu_key.as_str()) {
                repository.create(config).await?;
                result.created += 1;
            }
        }
        for existing in &remote {
            match self.store.get(&existing.menu_key) {
                Some(local) if local != existing => {
                    repository.update(local).await?;
                    result.updated += 1;
                }
                Some(_) => {}
                None => {
                    repository.delete(&existing.menu_key).await?;
                    result.deleted += 1;
                }
            }
        }
        info!("menu configs synced: {:?}", result);
        Ok(result)
    }
}
