use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::{RoleId, UserId};
use dashmap::DashMap;

/// 外部权限注册中心：提供角色、用户的权限名列表
#[async_trait]
pub trait PermissionRegistry: Send + Sync {
    async fn fetch_role_permissions(&self, role_id: &str) -> AppResult<Vec<String>>;
    async fn fetch_user_permissions(&self, user_id: &str) -> AppResult<Vec<String>>;
}

/// 内存实现，供本地工具和测试使用
#[derive(Debug, Default)]
pub struct StaticPermissionRegistry {
    roles: DashMap<RoleId, Vec<String>>,
    users: DashMap<UserId, Vec<String>>,
}

impl StaticPermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_role_permissions<I, S>(&self, role_id: &str, permissions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.insert(role_id.to_string(), permissions.into_iter().map(Into::into).collect());
    }

    pub fn set_user_permissions<I, S>(&self, user_id: &str, permissions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users.insert(user_id.to_string(), permissions.into_iter().map(Into::into).collect());
    }
}

#[async_trait]
impl PermissionRegistry for StaticPermissionRegistry {
    async fn fetch_role_permissions(&self, role_id: &str) -> AppResult<Vec<String>> {
        self.roles.get(role_id).map(|p| p.clone()).ok_or_else(|| AppError::not_found(format!("role '{}'", role_id)))
    }

    async fn fetch_user_permissions(&self, user_id: &str) -> AppResult<Vec<String>> {
        self.users.get(user_id).map(|p| p.clone()).ok_or_else(|| AppError::not_found(format!("user '{}'", user_id)))
    }
}
