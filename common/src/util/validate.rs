use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use validator::ValidationError;

lazy_static! {
    static ref MENU_KEY_RE: Regex = Regex::new(r"^[A-Za-z0-9_:.\-]+$").unwrap();
    static ref PERMISSION_SEGMENT_RE: Regex = Regex::new(r"^(\*|[A-Za-z0-9_:\-]+)$").unwrap();
}

/// 菜单 key：1-64 位，仅允许字母、数字和 `_ : . -`
pub fn validate_menu_key(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.len() > 64 {
        return Err(ValidationError::new("menu.key.over.len"));
    }
    if !MENU_KEY_RE.is_match(value) {
        return Err(ValidationError::new("menu.key.invalid.char"));
    }
    Ok(())
}

/// 权限名：点分段，每段为标识符或通配符 `*`，例如 `system.user.read`、`system.*.*`
pub fn validate_permission_name(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("permission.name.empty"));
    }
    if value.split('.').all(|segment| PERMISSION_SEGMENT_RE.is_match(segment)) {
        Ok(())
    } else {
        Err(ValidationError::new("permission.name.invalid"))
    }
}

pub fn validate_permission_set(values: &BTreeSet<String>) -> Result<(), ValidationError> {
    values.iter().try_for_each(|value| validate_permission_name(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_key_rules() {
        assert!(validate_menu_key("system.user_list").is_ok());
        assert!(validate_menu_key("").is_err());
        assert!(validate_menu_key("has space").is_err());
        assert!(validate_menu_key(&"k".repeat(65)).is_err());
    }

    #[test]
    fn permission_name_rules() {
        assert!(validate_permission_name("system.user.read").is_ok());
        assert!(validate_permission_name("system.*.*").is_ok());
        assert!(validate_permission_name("*.*.*").is_ok());
        assert!(validate_permission_name("system..read").is_err());
        assert!(validate_permission_name("system.us*er").is_err());
    }
}
