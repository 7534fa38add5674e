//! # 构建器模块
//!
//! - `docx_builder` - 基于 altChunk + MHT 的 DOCX 构建器

pub mod docx_builder;

// Re-export commonly used items for convenience
pub use docx_builder::{DocxBuilder, DocxBuilderConfig, DocxEncoder, Orientation, PageMargins};
