pub mod file;
pub mod mapping;
