pub mod file_dto;
pub mod folder_dto;
