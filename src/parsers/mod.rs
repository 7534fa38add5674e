//! # 解析器模块
//!
//! - `html` - HTML文档解析、DOM操作、元数据处理、内联图片提取

pub mod html;

// Re-export commonly used items for convenience
pub use html::{get_charset, get_title, html_to_dom, serialize_document, set_charset};
