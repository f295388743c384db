pub mod command;
pub mod file;
pub mod readgroup;
pub mod streams;
