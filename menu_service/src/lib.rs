pub mod biz_const;
pub mod biz_service;
pub mod entitys;
pub mod manager;

use common::config::AppConfig;

pub fn init_service(config: &AppConfig) {
    manager::menu_manager::MenuPermissionManager::init(config.get_menu());
}
