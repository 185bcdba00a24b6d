#[derive(Debug, Clone)]
pub struct NewFolderDTO {
    pub name: String,
    pub owner_id: i64,
}

impl NewFolderDTO {
    pub fn new(name: &str, owner_id: i64) -> Self {
        Self {
            name: name.trim().to_string(),
            owner_id,
        }
    }
}
