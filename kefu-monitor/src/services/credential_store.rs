//! 会话凭证存储
//!
//! 登录流程写入令牌,监控器与 `ApiClient` 只读取。

use std::sync::{PoisonError, RwLock};

/// 凭证存储接口
pub trait CredentialStore: Send + Sync {
    /// 当前令牌,未登录时为 `None`
    fn auth_token(&self) -> Option<String>;

    /// 登录成功后保存令牌
    fn store_token(&self, token: &str);

    /// 退出登录
    fn clear(&self);
}

/// 进程内凭证存储
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以已有令牌创建 (恢复会话)
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn auth_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_token(&self, token: &str) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
