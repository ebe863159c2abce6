use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::server::AppState;
use crate::server::dto::MessageResponse;
use crate::server::response::{ApiError, StoreOptionExt};
use crate::server::validation::validate_item_data;
use crate::service::{ImageUpload, item};
use crate::types::ItemData;

pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Parses the item's `data` field. Some form clients post JSON that was
/// encoded twice, so a string value is decoded again.
fn parse_item_data(raw: &str) -> Result<ItemData, ApiError> {
    let invalid = |e: serde_json::Error| ApiError::bad_request(format!("Invalid item data: {e}"));

    let value: serde_json::Value = serde_json::from_str(raw).map_err(invalid)?;
    let value = match value {
        serde_json::Value::String(inner) => serde_json::from_str(&inner).map_err(invalid)?,
        other => other,
    };

    serde_json::from_value(value).map_err(invalid)
}

async fn parse_item_upload(
    multipart: &mut Multipart,
) -> Result<(Option<ItemData>, Option<ImageUpload>), ApiError> {
    let mut data: Option<ItemData> = None;
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {e}")))?
    {
        match field.name() {
            Some("data") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read data: {e}")))?;
                data = Some(parse_item_data(&raw)?);
            }
            Some("image") => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read image: {e}")))?;
                if bytes.len() > MAX_IMAGE_SIZE {
                    return Err(ApiError::bad_request(format!(
                        "Image size ({} bytes) exceeds maximum allowed size ({MAX_IMAGE_SIZE} bytes)",
                        bytes.len()
                    )));
                }
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    image = Some(ImageUpload {
                        filename,
                        data: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok((data, image))
}

pub async fn list_items(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let items = item::list(state.store.as_ref())?;

    Ok::<_, ApiError>(Json(items))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let (data, image) = parse_item_upload(&mut multipart).await?;
    let data = data.ok_or_else(|| ApiError::bad_request("Item data is required"))?;

    validate_item_data(&data)?;

    let item = item::create(state.store.as_ref(), &state.images, &data, image).await?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let item = item::get(state.store.as_ref(), id)?.or_not_found("Item not found")?;

    Ok::<_, ApiError>(Json(item))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<ItemData>, JsonRejection>,
) -> impl IntoResponse {
    let Json(data) = payload.map_err(|e| ApiError::bad_request(format!("Invalid item data: {e}")))?;

    validate_item_data(&data)?;

    let item = item::update(state.store.as_ref(), &state.images, id, &data).await?;

    Ok::<_, ApiError>(Json(item))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    item::delete(state.store.as_ref(), &state.images, id).await?;

    Ok::<_, ApiError>(Json(MessageResponse::new("Item deleted")))
}

pub async fn update_item_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let (_, image) = parse_item_upload(&mut multipart).await?;
    let image = image.ok_or_else(|| ApiError::bad_request("Image field is required"))?;

    let item = item::update_image(state.store.as_ref(), &state.images, id, image).await?;

    Ok::<_, ApiError>(Json(item))
}

pub async fn get_item_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    let content = match item::read_image(state.store.as_ref(), &state.images, id).await {
        Ok(content) => content,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let stream = ReaderStream::new(content.reader);
    let body = Body::from_stream(stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content.content_type)
        .header(header::CONTENT_LENGTH, content.size)
        .header("X-Content-Type-Options", "nosniff")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
