//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作
//! - `metadata`: 字符编码和标题等元数据
//! - `serializer`: 序列化功能
//! - `images`: 内联图片提取和 src 改写

pub mod dom;
pub mod images;
pub mod metadata;
pub mod serializer;

pub use dom::{
    find_nodes, get_node_attr, get_node_name, html_string_to_dom, html_to_dom, set_node_attr,
};
pub use images::{
    ExtractedAsset, ExtractionReport, ImageExtractor, ProgressReport, SkippedImage,
};
pub use metadata::{get_charset, get_title, set_charset};
pub use serializer::serialize_document;
