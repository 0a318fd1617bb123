pub mod aggregations;
pub mod media_storage;

pub use media_storage::{MediaKind, MediaStorage, UploadedMedia};
