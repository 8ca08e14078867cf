use uuid::Uuid;

/// 单个用户缓存键前缀
const USER_PREFIX: &str = "user:";

/// 默认（规范）用户列表第一页的缓存键
pub const USERS_ALL_KEY: &str = "users:all";

/// 生成单个用户缓存键 `user:<id>`
pub fn user_key(user_id: Uuid) -> String {
    format!("{}{}", USER_PREFIX, user_id)
}
