pub mod admin;
pub mod files;
pub mod posts;
pub mod users;
