use crate::config::AppConfig;
use log::LevelFilter;
use std::str::FromStr;

/// 按 `sys.log_level` 初始化全局日志，级别非法时退回 info
pub fn init_log(config: &AppConfig) {
    let log_level = config.get_sys().log_level;
    let level = LevelFilter::from_str(&log_level).unwrap_or(LevelFilter::Info);
    let mut builder = env_logger::Builder::new();
    // 已初始化时忽略（测试中会被多次调用）
    let _ = builder.filter(None, level).try_init();
}
