use serde::{Deserialize, Serialize};

/// Identity handed to us by the session layer. Opaque beyond its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
}

impl Subject {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

/// Anything that belongs to exactly one subject.
pub trait Owned {
    fn owner_id(&self) -> i64;
}
