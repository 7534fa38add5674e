//! HTML → DOCX 转换 API

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json as ExtractJson, Multipart, State},
    response::Response,
};

use super::{docx_response, json_rejection, run_blocking, spool_upload, ApiError};
use crate::core::{read_uploaded_file, ConversionRequest};
use crate::web::types::{AppState, ConvertRequest};

/// 将 JSON 中的 HTML 文本转换为 DOCX
pub async fn convert_html(
    State(state): State<Arc<AppState>>,
    payload: Result<ExtractJson<ConvertRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let ExtractJson(request) = payload.map_err(json_rejection)?;
    let html = request.html.unwrap_or_default();

    tracing::info!("转换请求: {} 字节 HTML", html.len());

    let processor = state.processor.clone();
    let docx = run_blocking(move || processor.convert(ConversionRequest::Html(html))).await?;

    Ok(docx_response(docx))
}

/// 将上传的 HTML 文件转换为 DOCX
pub async fn upload_html(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let spool = spool_upload(multipart, &state.uploads_dir).await?;

    let processor = state.processor.clone();
    let docx = run_blocking(move || {
        let data = read_uploaded_file(spool)?;
        processor.convert(ConversionRequest::UploadedFile(data))
    })
    .await?;

    Ok(docx_response(docx))
}
