//! 图片 API

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json as ExtractJson, Multipart, State},
    http::header,
    response::{IntoResponse, Json, Response},
};

use super::{json_rejection, run_blocking, spool_upload, ApiError};
use crate::core::{read_uploaded_file, ConversionRequest};
use crate::web::types::{AppState, Base64Request, ImagesResponse};

/// 提取上传 HTML 文件中的内联图片，返回公开路径列表
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ImagesResponse>, ApiError> {
    let spool = spool_upload(multipart, &state.uploads_dir).await?;

    let processor = state.processor.clone();
    let images = run_blocking(move || {
        let data = read_uploaded_file(spool)?;
        processor.extract_images(ConversionRequest::UploadedFile(data))
    })
    .await?;

    tracing::info!("图片提取完成: {} 张", images.len());
    Ok(Json(ImagesResponse { images }))
}

/// 将单张 base64 图片转换为 PNG
pub async fn base64_to_png(
    State(state): State<Arc<AppState>>,
    payload: Result<ExtractJson<Base64Request>, JsonRejection>,
) -> Result<Response, ApiError> {
    let ExtractJson(request) = payload.map_err(json_rejection)?;
    let data = request.base64.unwrap_or_default();

    let processor = state.processor.clone();
    let png = run_blocking(move || processor.convert_base64_to_image(&data)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, state.processor.codec().media_type()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"image.png\"",
            ),
        ],
        png,
    )
        .into_response())
}
