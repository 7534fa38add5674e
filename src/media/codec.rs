use image::ImageFormat;
use std::io::Cursor;

use crate::core::{ConvertError, ConvertResult};

/// 图片编解码器
///
/// 输入为任意可识别的图片字节，输出为统一格式的图片字节。
/// 实现必须是无状态的，可以在多个线程间共享。
pub trait ImageCodec: Send + Sync {
    /// 解码并重编码
    ///
    /// # Errors
    ///
    /// 输入无法识别为图片时返回 `UnsupportedImageData`
    fn reencode(&self, bytes: &[u8]) -> ConvertResult<Vec<u8>>;

    /// 输出文件的扩展名
    fn extension(&self) -> &'static str {
        "png"
    }

    /// 输出内容的媒体类型
    fn media_type(&self) -> &'static str {
        "image/png"
    }
}

/// PNG 编解码器，接受 PNG、JPEG、GIF、WebP、BMP 输入
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

impl ImageCodec for PngCodec {
    fn reencode(&self, bytes: &[u8]) -> ConvertResult<Vec<u8>> {
        if bytes.is_empty() {
            return Err(ConvertError::UnsupportedImageData(
                "empty image data".to_string(),
            ));
        }

        let image = image::load_from_memory(bytes)
            .map_err(|e| ConvertError::UnsupportedImageData(e.to_string()))?;

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ConvertError::UnsupportedImageData(e.to_string()))?;

        tracing::debug!(
            "图片重编码完成: {}x{}, {} -> {} 字节",
            image.width(),
            image.height(),
            bytes.len(),
            png.len()
        );

        Ok(png)
    }
}
