mod handler;
pub mod model;

pub use handler::{
    delete_user, get_profile, get_user, list_users, login, register, search_users, update_profile,
    update_user,
};
