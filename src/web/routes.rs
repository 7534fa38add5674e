//! Web 路由定义

use axum::{
    routing::{get, post},
    Router,
};

use crate::web::{handlers::*, types::AppState};
use std::sync::Arc;

/// 创建 API 路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // 转换
        .route("/convert", post(convert_html))
        .route("/upload", post(upload_html))
        // 图片
        .route("/upload-images", post(upload_images))
        .route("/base64-to-png", post(base64_to_png))
        .route("/health", get(health))
}
