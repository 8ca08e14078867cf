use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commands::NewUserInput;
use crate::error::AppError;
use crate::models::{
    DEFAULT_LIMIT, DEFAULT_PAGE, ListOptions, Role, SortField, SortOrder, UserChanges, UserFilter,
};

/// 每页最多条数
pub const MAX_PAGE_LIMIT: u32 = 100;

const MIN_PASSWORD_LEN: usize = 6;
const MAX_NAME_LEN: usize = 50;

// 注册请求
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)
    }

    /// 自助注册一律是普通用户
    pub fn into_input(self) -> NewUserInput {
        NewUserInput {
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            role: Role::User,
        }
    }
}

// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// 更新个人资料请求，其他字段（包括密码）被忽略
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    #[serde(alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: Option<String>,
}

impl UpdateProfileRequest {
    pub fn into_changes(self) -> Result<UserChanges, AppError> {
        validate_changes(&self.email, &self.first_name, &self.last_name)?;
        Ok(UserChanges {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: None,
            is_active: None,
        })
    }
}

// 管理员更新用户请求
#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub email: Option<String>,
    #[serde(alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: Option<String>,
    pub role: Option<Role>,
    #[serde(alias = "isActive")]
    pub is_active: Option<bool>,
}

impl AdminUpdateUserRequest {
    pub fn into_changes(self) -> Result<UserChanges, AppError> {
        validate_changes(&self.email, &self.first_name, &self.last_name)?;
        Ok(UserChanges {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            is_active: self.is_active,
        })
    }
}

// 用户列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<SortField>,
    #[serde(alias = "sortOrder")]
    pub sort_order: Option<SortOrder>,
    pub role: Option<Role>,
    #[serde(alias = "isActive")]
    pub is_active: Option<bool>,
}

impl ListUsersQuery {
    pub fn into_options(self) -> ListOptions {
        ListOptions {
            page: self.page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
            filter: UserFilter {
                role: self.role,
                is_active: self.is_active,
            },
        }
    }
}

// 搜索查询参数
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

// 删除用户响应
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub id: Uuid,
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation("Please provide a valid email".into()))
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "{} must be between 1 and {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_changes(
    email: &Option<String>,
    first_name: &Option<String>,
    last_name: &Option<String>,
) -> Result<(), AppError> {
    if let Some(email) = email {
        validate_email(email)?;
    }
    if let Some(first_name) = first_name {
        validate_name("first_name", first_name)?;
    }
    if let Some(last_name) = last_name {
        validate_name("last_name", last_name)?;
    }
    Ok(())
}
