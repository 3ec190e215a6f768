mod common;
mod files;
mod gc;
mod mappings;
