use common::config::AppConfig;
use common::util::log_util::init_log;
use log::{info, warn};
use menu_service::biz_service::menu_preview_service::MenuPreviewService;
use menu_service::biz_service::permission_registry::StaticPermissionRegistry;
use menu_service::entitys::menu_request_dto::{ImportMode, MenuPreviewConfig};
use menu_service::manager::menu_manager::MenuPermissionManager;
use std::sync::Arc;

const CONFIG_FILE: &str = "menu-config.toml";
const PREVIEW_ROLE: &str = "cli";

/// 用法：app_menu <导出文件.json> [权限 ...]
///
/// 读取一份菜单导出文件，以给定权限预览可见菜单，结果以 JSON 打印到标准输出。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_loaded = AppConfig::init(CONFIG_FILE);
    let config = AppConfig::get();
    init_log(&config);
    if let Err(e) = config_loaded {
        warn!("{} not loaded, using defaults: {}", CONFIG_FILE, e);
    }
    menu_service::init_service(&config);

    let mut args = std::env::args().skip(1);
    let Some(export_file) = args.next() else {
        anyhow::bail!("usage: app_menu <export.json> [permission ...]");
    };
    let permissions: Vec<String> = args.collect();

    let json = tokio::fs::read_to_string(&export_file).await?;
    let export = MenuPermissionManager::parse_export(&json)?;
    info!("loaded export {} ({} configs) from {}", export.version, export.configs.len(), export_file);

    let registry = StaticPermissionRegistry::new();
    registry.set_role_permissions(PREVIEW_ROLE, permissions);
    let service = MenuPreviewService::new(Arc::new(registry));
    let preview_config = MenuPreviewConfig {
        role_id: Some(PREVIEW_ROLE.to_string()),
        show_permission_info: true,
        show_hidden_menus: true,
        ..Default::default()
    };
    let manager = MenuPermissionManager::get();
    let imported = {
        let mut guard = manager.write().map_err(|e| anyhow::anyhow!("menu manager lock poisoned: {}", e))?;
        guard.import_export(export, ImportMode::Replace, true)
    };
    for warning in &imported.warnings {
        warn!("{}", warning);
    }
    if !imported.success {
        anyhow::bail!("import failed: {}", serde_json::to_string(&imported.errors)?);
    }

    let result = service.preview(&manager, &preview_config).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
