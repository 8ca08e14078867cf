// 领域数据结构

pub mod listing;
pub mod user;

pub use listing::{DEFAULT_LIMIT, DEFAULT_PAGE, ListOptions, Pagination, SortField, SortOrder, UserFilter, UserPage};
pub use user::{NewUser, Role, UserChanges, UserEntity, UserRecord};
