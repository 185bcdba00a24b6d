pub mod deletion;
pub mod file;
pub mod folder;
pub mod subject;
