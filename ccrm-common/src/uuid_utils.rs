//! Document id utilities

use uuid::Uuid;

/// Generate a new document id (UUIDv4, simple format without hyphens)
pub fn generate() -> String {
    Uuid::new_v4().simple().to_string()
}

/// True if `id` is usable as a document id segment
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 128 && !id.contains('/') && id.trim() == id
}
