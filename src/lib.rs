//! # htmldocx
//!
//! 将 HTML 文档转换为 DOCX 文件的工具库，同时把文档中内联（base64）的图片
//! 提取为独立的 PNG 文件，并改写文档让其引用新的文件。
//!
//! ## 模块组织
//!
//! - `core` - 错误类型、转换请求和文档处理主流程
//! - `parsers` - HTML 解析、DOM 操作以及图片提取与改写
//! - `media` - 图片重编码和资源存储
//! - `builders` - DOCX 输出构建器
//! - `utils` - data URL 等工具函数
//! - `env` - 类型安全的环境变量配置
//! - `web` - Web 服务器功能（可选）

pub mod builders;
pub mod core;
pub mod env;
pub mod media;
pub mod parsers;
pub mod utils;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used items for convenience
pub use builders::{DocxBuilder, DocxBuilderConfig, DocxEncoder};
pub use crate::core::*;
pub use media::{AssetDir, AssetStore, ImageCodec, PngCodec, StoredAsset};
pub use parsers::html::{ExtractedAsset, ExtractionReport, ImageExtractor, ProgressReport};
