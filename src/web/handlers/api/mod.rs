//! API 处理器

pub mod convert;
pub mod health;
pub mod images;

pub use convert::*;
pub use health::*;
pub use images::*;

use std::io::Write;
use std::path::Path;

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tempfile::NamedTempFile;
use tokio::task;

use crate::core::{ConvertError, ConvertResult, DOCX_MEDIA_TYPE};

/// 统一的错误响应
pub type ApiError = (StatusCode, Json<serde_json::Value>);

/// 上传表单中文件字段的名称
pub const UPLOAD_FIELD: &str = "file";

/// 将处理错误映射为 HTTP 响应
///
/// 输入类错误直接返回原因；其余错误的细节只写入日志。
pub(crate) fn error_response(error: &ConvertError) -> ApiError {
    match error {
        ConvertError::Validation(message) => bad_request(message),
        _ => {
            tracing::error!("请求处理失败 ({:?}): {}", error.category(), error);
            internal_error()
        }
    }
}

pub(crate) fn bad_request(message: &str) -> ApiError {
    tracing::warn!("请求无效: {}", message);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "status": "error",
            "error": message
        })),
    )
}

pub(crate) fn internal_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "status": "error",
            "error": "Internal Server Error"
        })),
    )
}

pub(crate) fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::warn!("JSON 请求体无效: {}", rejection.body_text());
    (
        rejection.status(),
        Json(json!({
            "status": "error",
            "error": "Invalid JSON body"
        })),
    )
}

fn multipart_rejection(error: MultipartError) -> ApiError {
    tracing::warn!("multipart 请求体无效: {}", error.body_text());
    (
        error.status(),
        Json(json!({
            "status": "error",
            "error": "Invalid multipart body"
        })),
    )
}

/// 在阻塞线程池中执行处理流程
pub(crate) async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ConvertResult<T> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(job).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(error_response(&e)),
        Err(e) => {
            tracing::error!("处理任务失败: {}", e);
            Err(internal_error())
        }
    }
}

/// 将上传的文件字段写入上传目录中的临时文件
///
/// 返回的临时文件在被读取后或被丢弃时删除。
pub(crate) async fn spool_upload(
    mut multipart: Multipart,
    uploads_dir: &Path,
) -> Result<NamedTempFile, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_rejection)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let mut spool = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(uploads_dir)
            .map_err(|e| {
                tracing::error!("无法在 {} 创建上传文件: {}", uploads_dir.display(), e);
                internal_error()
            })?;

        while let Some(chunk) = field.chunk().await.map_err(multipart_rejection)? {
            spool.write_all(&chunk).map_err(|e| {
                tracing::error!("写入上传文件失败: {}", e);
                internal_error()
            })?;
        }

        tracing::info!(
            "收到上传文件: {} ({} 字节)",
            field.file_name().unwrap_or("<unnamed>"),
            spool.as_file().metadata().map(|m| m.len()).unwrap_or(0)
        );
        return Ok(spool);
    }

    Err(bad_request("No file uploaded"))
}

/// DOCX 下载响应
pub(crate) fn docx_response(docx: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, DOCX_MEDIA_TYPE),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"output.docx\"",
            ),
        ],
        docx,
    )
        .into_response()
}
