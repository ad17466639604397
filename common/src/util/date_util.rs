use chrono::DateTime;

/// 当前时间戳（秒）
pub fn now() -> i64 {
    chrono::Local::now().timestamp()
}

/// 当前时间戳（毫秒），用于同一秒内的先后排序
pub fn now_millis() -> i64 {
    chrono::Local::now().timestamp_millis()
}

pub fn time_to_str(time: i64) -> String {
    match DateTime::from_timestamp(time, 0) {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_epoch() {
        assert_eq!(time_to_str(0), "1970-01-01 00:00:00");
    }

    #[test]
    fn millis_not_behind_seconds() {
        assert!(now_millis() / 1000 >= now() - 1);
    }
}
