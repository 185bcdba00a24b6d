pub mod file_repository;
pub mod folder_repository;
