mod storage;

pub use storage::{IMAGE_DIR, ImageStorage, ImageStorageError, content_type_for, image_file_name};
