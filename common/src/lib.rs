pub mod config;
pub mod errors;
pub mod repository;
pub mod util;

pub use repository::*;

pub type MenuKey = String;
pub type RoleId = String;
pub type UserId = String;
