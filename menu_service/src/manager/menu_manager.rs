use crate::biz_service::cache_service::CacheService;
use crate::entitys::menu_permission_entity::{MenuPermissionConfig, MenuTreeNode};
use crate::manager::menu_store::MenuConfigStore;
use crate::manager::menu_tree::{MenuTreeBuild, build_menu_tree};
use crate::manager::menu_ui_state::{DragSession, MenuUiState};
use common::config::MenuConfig;
use log::debug;
use once_cell::sync::OnceCell;
use std::sync::{Arc, RwLock};

/// 菜单权限配置引擎
///
/// 写操作（创建、更新、删除、移动、导入、批量）都需要 `&mut self`，同一时刻只有一个写者；
/// 多个网络客户端共享时由调用方串行化（见 [`MenuPermissionManager::get`] 的读写锁）。
/// 树、可见性、预览都是基于当前仓库快照的纯计算。
#[derive(Debug)]
pub struct MenuPermissionManager {
    pub(crate) store: MenuConfigStore,
    pub(crate) config_cache: CacheService<MenuPermissionConfig>,
    tree_cache: CacheService<Arc<MenuTreeBuild>>,
    pub(crate) ui_state: MenuUiState,
    pub(crate) menu_config: MenuConfig,
}

impl MenuPermissionManager {
    pub fn new(menu_config: MenuConfig) -> Self {
        let ttl = menu_config.cache_ttl_secs;
        let capacity = menu_config.cache_capacity;
        Self {
            store: MenuConfigStore::new(),
            config_cache: CacheService::new(ttl, capacity),
            // 写操作时整体清空，同一时刻只有当前 revision 一份快照
            tree_cache: CacheService::new(ttl, 16),
            ui_state: MenuUiState::new(),
            menu_config,
        }
    }

    /// 以已有数据初始化（不做结构校验，异常在建树时降级处理）
    pub fn with_configs(menu_config: MenuConfig, configs: impl IntoIterator<Item = MenuPermissionConfig>) -> Self {
        let mut manager = Self::new(menu_config);
        manager.store = MenuConfigStore::from_configs(configs);
        manager
    }

    pub fn store(&self) -> &MenuConfigStore {
        &self.store
    }

    pub fn ui_state(&self) -> &MenuUiState {
        &self.ui_state
    }

    pub fn menu_config(&self) -> &MenuConfig {
        &self.menu_config
    }

    /// 当前仓库的派生森林，按 revision 缓存
    pub fn menu_tree(&self) -> Arc<MenuTreeBuild> {
        let cache_key = self.store.revision().to_string();
        if let Some(tree) = self.tree_cache.get(&cache_key) {
            return tree;
        }
        let tree = Arc::new(build_menu_tree(self.store.values()));
        debug!("menu tree rebuilt at revision {} ({} nodes)", cache_key, tree.node_count());
        self.tree_cache.insert(cache_key, tree.clone());
        tree
    }

    /// 叠加展开/选中状态后的森林
    pub fn menu_tree_with_state(&self) -> Vec<MenuTreeNode> {
        let mut roots = self.menu_tree().roots.clone();
        self.ui_state.overlay(&mut roots);
        roots
    }

    /// 任何写操作之后调用，使配置缓存和树快照失效
    pub(crate) fn invalidate(&self) {
        self.config_cache.clear();
        self.tree_cache.clear();
    }

    /// 清理已不在仓库中的节点展示状态；拖拽源消失时结束拖拽
    pub(crate) fn prune_ui_state(&mut self) {
        let store = &self.store;
        self.ui_state.retain(|key| store.contains(key));
        let drag = &mut self.ui_state.drag;
        if drag.source_key.as_deref().is_some_and(|key| !store.contains(key)) {
            *drag = DragSession::default();
        } else if drag.drop_target.as_deref().is_some_and(|key| !store.contains(key)) {
            drag.drop_target = None;
        }
    }

    pub fn init(menu_config: MenuConfig) {
        let _ = INSTANCE.set(Arc::new(RwLock::new(Self::new(menu_config))));
    }

    /// 获取全局实例，未初始化时使用默认配置创建
    pub fn get() -> Arc<RwLock<MenuPermissionManager>> {
        INSTANCE.get_or_init(|| Arc::new(RwLock::new(Self::new(MenuConfig::default())))).clone()
    }
}

static INSTANCE: OnceCell<Arc<RwLock<MenuPermissionManager>>> = OnceCell::new();

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::entitys::menu_request_dto::CreateMenuRequest;

    /// system
    /// ├── system.user
    /// │   ├── system.user.add
    /// │   └── system.user.delete
    /// └── system.role
    /// dashboard
    pub fn sample_manager() -> MenuPermissionManager {
        let mut manager = MenuPermissionManager::new(MenuConfig::default());
        for request in [
            CreateMenuRequest::new("system", "System"),
            CreateMenuRequest::new("system.user", "Users").parent("system"),
            CreateMenuRequest::new("system.user.add", "Add user").parent("system.user"),
            CreateMenuRequest::new("system.user.delete", "Delete user").parent("system.user"),
            CreateMenuRequest::new("system.role", "Roles").parent("system"),
            CreateMenuRequest::new("dashboard", "Dashboard"),
        ] {
            manager.create(request).unwrap();
        }
        manager
    }

    pub fn child_keys(manager: &MenuPermissionManager, parent: Option<&str>) -> Vec<String> {
        manager.store().children_of(parent).iter().map(|c| c.menu_key.clone()).collect()
    }
}
