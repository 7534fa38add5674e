//! Web 模块的数据类型定义

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::DocumentProcessor;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub processor: DocumentProcessor,
    /// 上传文件的临时目录
    pub uploads_dir: PathBuf,
}

impl AppState {
    pub fn new(processor: DocumentProcessor, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            processor,
            uploads_dir: uploads_dir.into(),
        }
    }
}

/// HTML 转换请求
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub html: Option<String>,
}

/// base64 图片转换请求
#[derive(Debug, Deserialize)]
pub struct Base64Request {
    pub base64: Option<String>,
}

/// 图片提取响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ImagesResponse {
    pub images: Vec<String>,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
