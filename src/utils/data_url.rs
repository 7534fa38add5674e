use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{DecodeError, Engine};

use crate::core::parse_content_type;

/// 内联图片的 src 前缀
pub const EMBEDDED_IMAGE_PREFIX: &str = "data:image/";

const LENIENT_CONFIG: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

/// 标准字母表，填充可有可无
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_CONFIG);
/// URL 安全字母表，填充可有可无
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_CONFIG);

/// 拆分后的 data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl<'a> {
    pub media_type: String,
    pub is_base64: bool,
    pub payload: &'a str,
}

/// src 是否为内联图片
pub fn is_embedded_image(src: &str) -> bool {
    src.starts_with(EMBEDDED_IMAGE_PREFIX)
}

/// 按第一个逗号拆分为头部和数据两段，没有逗号时返回 `None`
pub fn split_data_url(src: &str) -> Option<(&str, &str)> {
    src.split_once(',')
}

/// 解析 `data:` URL
pub fn parse_data_url(src: &str) -> Option<DataUrl<'_>> {
    let rest = src.trim_start().strip_prefix("data:")?;
    let (header, payload) = split_data_url(rest)?;
    let (media_type, _charset, is_base64) = parse_content_type(header);

    Some(DataUrl {
        media_type,
        is_base64,
        payload,
    })
}

/// 解码 base64 数据段
///
/// 属性值中常带有换行或空格，解码前会去掉所有 ASCII 空白；
/// 填充缺失或多余都能接受，标准字母表失败后再尝试 URL 安全字母表。
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    match LENIENT_STANDARD.decode(&compact) {
        Ok(bytes) => Ok(bytes),
        Err(error) if compact.contains(['-', '_']) => {
            LENIENT_URL_SAFE.decode(&compact).map_err(|_| error)
        }
        Err(error) => Err(error),
    }
}
