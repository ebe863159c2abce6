//! Catalog management. Items own at most one image file, named after the
//! item and kept in sync with it on rename and delete.

use tokio::fs::File;
use tokio::io::BufReader;

use crate::error::{Error, Result};
use crate::images::{ImageStorage, ImageStorageError, content_type_for};
use crate::store::Store;
use crate::types::{Item, ItemData};

/// An uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// A stored image ready to be streamed back.
pub struct ImageContent {
    pub reader: BufReader<File>,
    pub size: u64,
    pub content_type: &'static str,
}

fn not_found() -> Error {
    Error::NotFound("Item not found".to_string())
}

fn image_error(e: ImageStorageError) -> Error {
    match e {
        ImageStorageError::NotFound => Error::NotFound("Image not found".to_string()),
        ImageStorageError::Empty => Error::BadRequest("Image is empty".to_string()),
        ImageStorageError::NameTooLong | ImageStorageError::InvalidPath => {
            Error::BadRequest("Item name cannot be used as an image file name".to_string())
        }
        ImageStorageError::Io(e) => Error::Io(e),
    }
}

pub fn get(store: &dyn Store, id: i64) -> Result<Option<Item>> {
    store.get_item(id)
}

pub fn list(store: &dyn Store) -> Result<Vec<Item>> {
    store.list_items()
}

/// Creates the item. The row is inserted before the image is written, so
/// the unique name decides which request owns the image path.
pub async fn create(
    store: &dyn Store,
    images: &ImageStorage,
    data: &ItemData,
    image: Option<ImageUpload>,
) -> Result<Item> {
    let mut item = store.create_item(data, None)?;

    if let Some(image) = image {
        item = match attach_image(store, images, &item, image).await {
            Ok(item) => item,
            Err(e) => {
                if let Err(err) = store.delete_item(item.id) {
                    tracing::warn!(item_id = item.id, "Failed to roll back item: {err}");
                }
                return Err(e);
            }
        };
    }

    tracing::info!(item_id = item.id, name = %item.name, "item created");
    Ok(item)
}

/// Overwrites the item's client-supplied fields. Renaming the item renames
/// its image file; if that fails the item loses its image reference.
pub async fn update(
    store: &dyn Store,
    images: &ImageStorage,
    id: i64,
    data: &ItemData,
) -> Result<Item> {
    let mut item = store.get_item(id)?.ok_or_else(not_found)?;

    let old_name = std::mem::replace(&mut item.name, data.name.clone());
    item.description = data.description.clone();
    item.price = data.price;
    item.category = data.category.clone();
    item.size = data.size.clone();
    item.color = data.color.clone();
    item.stock = data.stock;

    // The new name is claimed before any file moves; the old image path
    // stays valid until the rename below.
    let mut item = store.update_item(&item)?;

    let Some(old_url) = item.image_url.clone().filter(|_| item.name != old_name) else {
        return Ok(item);
    };

    item.image_url = match images.rename(&old_url, &item.name).await {
        Ok(new_url) => Some(new_url),
        Err(e) => {
            tracing::warn!(item_id = id, "Failed to rename image {old_url}: {e}");
            None
        }
    };

    match store.update_item(&item) {
        Ok(updated) => Ok(updated),
        Err(e) => {
            if let Some(new_url) = &item.image_url {
                if let Err(err) = images.rename(new_url, &old_name).await {
                    tracing::warn!(item_id = id, "Failed to restore image {new_url}: {err}");
                }
            }
            Err(e)
        }
    }
}

pub async fn delete(store: &dyn Store, images: &ImageStorage, id: i64) -> Result<()> {
    let item = store.get_item(id)?.ok_or_else(not_found)?;

    if let Some(url) = &item.image_url {
        discard_image(images, url).await;
    }

    if !store.delete_item(id)? {
        return Err(not_found());
    }

    tracing::info!(item_id = id, name = %item.name, "item deleted");
    Ok(())
}

/// Replaces the item's image with `image`. The old file is removed only
/// once the row points at the new one.
pub async fn update_image(
    store: &dyn Store,
    images: &ImageStorage,
    id: i64,
    image: ImageUpload,
) -> Result<Item> {
    let item = store.get_item(id)?.ok_or_else(not_found)?;

    let updated = attach_image(store, images, &item, image).await?;

    if let (Some(old_url), Some(new_url)) = (&item.image_url, &updated.image_url) {
        if old_url != new_url {
            discard_image(images, old_url).await;
        }
    }

    Ok(updated)
}

/// Writes the image file for `item` and records it on the row. A file at a
/// new path is removed again if the row cannot be updated.
async fn attach_image(
    store: &dyn Store,
    images: &ImageStorage,
    item: &Item,
    image: ImageUpload,
) -> Result<Item> {
    let url = images
        .put(&item.name, image.filename.as_deref(), &image.data)
        .await
        .map_err(image_error)?;

    let mut pending = item.clone();
    pending.image_url = Some(url.clone());

    match store.update_item(&pending) {
        Ok(updated) => Ok(updated),
        Err(e) => {
            if item.image_url.as_deref() != Some(url.as_str()) {
                discard_image(images, &url).await;
            }
            Err(e)
        }
    }
}

pub async fn read_image(store: &dyn Store, images: &ImageStorage, id: i64) -> Result<ImageContent> {
    let item = store.get_item(id)?.ok_or_else(not_found)?;
    let url = item
        .image_url
        .ok_or_else(|| Error::NotFound("Item has no image".to_string()))?;

    let (reader, size) = images.get(&url).await.map_err(image_error)?;

    Ok(ImageContent {
        reader,
        size,
        content_type: content_type_for(&url),
    })
}

async fn discard_image(images: &ImageStorage, url: &str) {
    match images.delete(url).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!("Image {url} was already gone"),
        Err(e) => tracing::warn!("Failed to delete image {url}: {e}"),
    }
}
