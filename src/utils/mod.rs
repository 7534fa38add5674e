//! # 工具模块
//!
//! - `data_url` - data URL 的识别、拆分与 base64 解码

pub mod data_url;

// Re-export commonly used items for convenience
pub use data_url::{
    decode_base64_payload, is_embedded_image, parse_data_url, split_data_url, DataUrl,
    EMBEDDED_IMAGE_PREFIX,
};
