use crate::errors::AppResult;
use config::Config;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub sys: Option<SysConfig>,
    pub menu: Option<MenuConfig>,
}

impl AppConfig {
    /// 从配置文件加载，允许 `APP_` 前缀的环境变量覆盖
    pub fn new(file: &str) -> AppResult<Self> {
        let config = Config::builder()
            .add_source(config::File::with_name(file).required(true))
            .add_source(config::Environment::with_prefix("APP").separator("_"))
            .build()?;
        let cfg = config.try_deserialize::<AppConfig>()?;
        Ok(cfg)
    }
    pub fn init(file: &str) -> AppResult<()> {
        let instance = Self::new(file)?;
        // 重复初始化时保留第一次加载的配置
        let _ = INSTANCE.set(Arc::new(instance));
        Ok(())
    }

    pub fn get_sys(&self) -> SysConfig {
        self.sys.clone().unwrap_or_default()
    }
    pub fn get_menu(&self) -> MenuConfig {
        self.menu.clone().unwrap_or_default()
    }
    /// 获取单例，未初始化时返回默认配置
    pub fn get() -> Arc<Self> {
        INSTANCE.get_or_init(|| Arc::new(AppConfig::default())).clone()
    }
}
static INSTANCE: OnceCell<Arc<AppConfig>> = OnceCell::new();

#[derive(Debug, Deserialize, Clone)]
pub struct SysConfig {
    //全局日志级别
    pub log_level: String,
}
impl Default for SysConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MenuConfig {
    //菜单配置缓存过期时间（秒）
    pub cache_ttl_secs: u64,
    //菜单配置缓存最大条目数
    pub cache_capacity: u64,
    //导出文件格式版本
    pub export_version: String,
    //导出人（未指定时使用）
    pub exported_by: Option<String>,
}
impl Default for MenuConfig {
    fn default() -> Self {
        Self { cache_ttl_secs: 300, cache_capacity: 1000, export_version: "1.0.0".to_string(), exported_by: None }
    }
}
