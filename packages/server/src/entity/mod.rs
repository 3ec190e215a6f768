pub mod file_mapping;
pub mod file_record;
