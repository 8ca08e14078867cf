// 命令端（CQRS 写侧）
// 先写主存储，再同步通知读模型，最后返回

mod create_user;
mod delete_user;
mod update_user;

pub use create_user::{NewUserInput, create_user};
pub use delete_user::delete_user;
pub use update_user::update_user;
