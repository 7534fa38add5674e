//! # 媒体模块
//!
//! - `codec` - 将任意支持的图片格式重编码为统一的输出格式
//! - `store` - 以唯一文件名把图片写入资源目录

pub mod codec;
pub mod store;

// Re-export commonly used items for convenience
pub use codec::{ImageCodec, PngCodec};
pub use store::{AssetDir, AssetStore, StoredAsset};
