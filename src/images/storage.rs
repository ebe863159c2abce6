use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufReader};
use uuid::Uuid;

/// Directory under the data dir that holds item images; also the prefix of
/// every stored `image_url`.
pub const IMAGE_DIR: &str = "images";

const MAX_FILE_STEM_LEN: usize = 200;
const MAX_EXTENSION_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum ImageStorageError {
    #[error("image not found")]
    NotFound,
    #[error("invalid image path")]
    InvalidPath,
    #[error("item name is too long to derive an image file name")]
    NameTooLong,
    #[error("image is empty")]
    Empty,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImageStorageError {
    fn from_io(e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(e)
        }
    }
}

/// Stores item images on the local filesystem, one file per item, named
/// after the item.
pub struct ImageStorage {
    data_dir: PathBuf,
}

impl ImageStorage {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn base_path(&self) -> PathBuf {
        self.data_dir.join(IMAGE_DIR)
    }

    fn temp_path(&self) -> PathBuf {
        self.data_dir.join("tmp").join(Uuid::new_v4().to_string())
    }

    /// Maps a stored `image_url` back to its file, refusing anything that
    /// is not a plain file directly inside the image directory.
    fn resolve(&self, image_url: &str) -> Result<PathBuf, ImageStorageError> {
        let file_name = image_url
            .strip_prefix(IMAGE_DIR)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or(ImageStorageError::InvalidPath)?;

        if file_name.is_empty()
            || file_name.starts_with('.')
            || file_name.contains(['/', '\\', '\0'])
        {
            return Err(ImageStorageError::InvalidPath);
        }

        Ok(self.base_path().join(file_name))
    }

    /// Writes `data` as the image of the item called `item_name` and returns
    /// the new `image_url`. An existing file with the same name is replaced.
    pub async fn put(
        &self,
        item_name: &str,
        original_filename: Option<&str>,
        data: &[u8],
    ) -> Result<String, ImageStorageError> {
        if data.is_empty() {
            return Err(ImageStorageError::Empty);
        }

        let file_name = image_file_name(item_name, original_filename.and_then(extension_of))?;

        let temp_path = self.temp_path();
        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_file = File::create(&temp_path).await?;
        temp_file.write_all(data).await?;
        temp_file.sync_all().await?;

        fs::create_dir_all(self.base_path()).await?;
        let final_path = self.base_path().join(&file_name);
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ImageStorageError::Io(e));
        }

        Ok(format!("{IMAGE_DIR}/{file_name}"))
    }

    /// Renames the image at `image_url` to match `new_item_name`, keeping its
    /// extension. Returns the new `image_url`.
    pub async fn rename(
        &self,
        image_url: &str,
        new_item_name: &str,
    ) -> Result<String, ImageStorageError> {
        let current = self.resolve(image_url)?;
        let extension = current
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(extension_of);

        let file_name = image_file_name(new_item_name, extension)?;
        let target = self.base_path().join(&file_name);

        fs::metadata(&current)
            .await
            .map_err(ImageStorageError::from_io)?;
        fs::rename(&current, &target)
            .await
            .map_err(ImageStorageError::from_io)?;

        Ok(format!("{IMAGE_DIR}/{file_name}"))
    }

    pub async fn get(&self, image_url: &str) -> Result<(BufReader<File>, u64), ImageStorageError> {
        let path = self.resolve(image_url)?;
        let file = File::open(&path)
            .await
            .map_err(ImageStorageError::from_io)?;

        let metadata = file.metadata().await?;

        Ok((BufReader::new(file), metadata.len()))
    }

    pub async fn delete(&self, image_url: &str) -> Result<bool, ImageStorageError> {
        let path = self.resolve(image_url)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ImageStorageError::Io(e)),
        }
    }
}

/// Derives the image file name for an item. Percent-encoding keeps the
/// mapping from names to files one-to-one.
///
/// The stem never contains a `.`, so the only dot in a stored file name
/// separates the extension. Without this "Shirt" with a png upload and
/// "Shirt.png" without one would share a file.
pub fn image_file_name(
    item_name: &str,
    extension: Option<String>,
) -> Result<String, ImageStorageError> {
    let stem = urlencoding::encode(item_name).replace('.', "%2E");
    if stem.is_empty() {
        return Err(ImageStorageError::InvalidPath);
    }
    if stem.len() > MAX_FILE_STEM_LEN {
        return Err(ImageStorageError::NameTooLong);
    }

    Ok(match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    })
}

/// Extracts a short, lowercase, alphanumeric extension from a file name.
fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[must_use]
pub fn content_type_for(image_url: &str) -> &'static str {
    match image_url.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}
