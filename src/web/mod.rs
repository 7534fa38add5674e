//! Web 服务器模块
//!
//! 提供 HTML → DOCX 转换、内联图片提取和单张图片转换的 HTTP 接口，
//! 并以只读方式公开两个图片目录。

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::*;
pub use handlers::*;
pub use routes::*;
pub use types::*;

use std::io;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::builders::{DocxBuilder, DocxBuilderConfig};
use crate::core::DocumentProcessor;

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(config: WebConfig) -> Self {
        Self { config }
    }

    /// 根据配置创建目录并组装应用状态
    pub fn build_state(&self) -> io::Result<Arc<AppState>> {
        let dirs = self.config.prepare_storage()?;

        let encoder = DocxBuilder::new(DocxBuilderConfig {
            orientation: self.config.orientation,
            embed_root: Some(dirs.intermediate.root().to_path_buf()),
            ..DocxBuilderConfig::default()
        });
        let processor = DocumentProcessor::new(dirs).with_encoder(Arc::new(encoder));

        Ok(Arc::new(AppState::new(
            processor,
            self.config.uploads_dir.clone(),
        )))
    }

    /// 启动 Web 服务器
    pub async fn start(&self) -> io::Result<()> {
        let app_state = self.build_state()?;
        let app = create_router(app_state, &self.config);

        let listener = tokio::net::TcpListener::bind(self.config.listen_address()).await?;

        tracing::info!(
            "Web server starting at http://{}",
            self.config.listen_address()
        );

        axum::serve(listener, app).await
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>, config: &WebConfig) -> Router {
    let dirs = app_state.processor.dirs().clone();

    create_routes()
        .with_state(app_state)
        // 图片目录只读公开
        .nest_service(
            dirs.extracted.public_prefix(),
            ServeDir::new(dirs.extracted.root()),
        )
        .nest_service(
            dirs.intermediate.public_prefix(),
            ServeDir::new(dirs.intermediate.root()),
        )
        .layer(DefaultBodyLimit::max(config.body_limit_bytes()))
        .layer(CorsLayer::permissive())
}
