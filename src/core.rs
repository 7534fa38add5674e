use chrono::{SecondsFormat, Utc};
use encoding_rs::Encoding;
use markup5ever_rcdom::RcDom;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::builders::{DocxBuilder, DocxBuilderConfig, DocxEncoder};
use crate::media::{AssetDir, AssetStore, ImageCodec, PngCodec};
use crate::parsers::html::{
    get_charset, html_string_to_dom, html_to_dom, serialize_document, set_charset,
    ExtractionReport, ImageExtractor,
};
use crate::utils::data_url::decode_base64_payload;

/// Public URL prefix of the directory holding images referenced by DOCX builds
pub const INTERMEDIATE_PUBLIC_PREFIX: &str = "/images";
/// Public URL prefix of the directory holding images extracted for display
pub const EXTRACTED_PUBLIC_PREFIX: &str = "/out_images";
/// Media type of generated documents
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Represents errors that can occur while converting documents and images
///
/// Each variant maps to one failure class: caller input defects,
/// environmental storage problems, per-image data problems and encoder
/// failures. Per-image failures are contained by the extraction engine and
/// only surface on the single-image path.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// 输入缺失或为空
    #[error("输入无效: {0}")]
    Validation(String),

    /// 目标目录不存在或不可写
    #[error("目录不可写: {path:?} ({reason})")]
    StorageUnwritable { path: PathBuf, reason: String },

    /// 数据无法被解码或重编码为图片
    #[error("无法识别的图片数据: {0}")]
    UnsupportedImageData(String),

    /// DOCX 或图片编码器自身失败
    #[error("编码失败: {0}")]
    EncodingFailure(String),

    /// 其他 I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Input,
    Storage,
    ImageData,
    Encoding,
    Internal,
}

impl ConvertError {
    /// 环境类错误可以在修复后重试，输入类错误重试没有意义
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConvertError::StorageUnwritable { .. } | ConvertError::Io(_)
        )
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConvertError::Validation(_) => ErrorCategory::Input,
            ConvertError::StorageUnwritable { .. } => ErrorCategory::Storage,
            ConvertError::UnsupportedImageData(_) => ErrorCategory::ImageData,
            ConvertError::EncodingFailure(_) => ErrorCategory::Encoding,
            ConvertError::Io(_) => ErrorCategory::Internal,
        }
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// A single conversion request
///
/// Carries exactly one HTML payload: text typed by the user or the raw
/// contents of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionRequest {
    /// HTML 文本
    Html(String),
    /// 上传文件的原始字节（字符集由文档自身声明决定）
    UploadedFile(Vec<u8>),
}

impl ConversionRequest {
    /// 校验请求是否携带非空的 HTML
    pub fn validate(&self) -> ConvertResult<()> {
        match self {
            ConversionRequest::Html(html) if html.trim().is_empty() => Err(
                ConvertError::Validation("HTML content is required".to_string()),
            ),
            ConversionRequest::UploadedFile(data)
                if data.iter().all(|byte| byte.is_ascii_whitespace()) =>
            {
                Err(ConvertError::Validation(
                    "Uploaded file is empty".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// 两个资源目录：DOCX 构建用的中间图片目录和供客户端展示的提取图片目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDirs {
    pub intermediate: AssetDir,
    pub extracted: AssetDir,
}

impl StorageDirs {
    pub fn new(intermediate: AssetDir, extracted: AssetDir) -> Self {
        Self {
            intermediate,
            extracted,
        }
    }

    /// 创建（如不存在）两个目录，并使用默认的公开路径前缀
    pub fn create(
        images_dir: impl AsRef<Path>,
        out_images_dir: impl AsRef<Path>,
    ) -> io::Result<Self> {
        Ok(Self {
            intermediate: AssetDir::create(images_dir.as_ref(), INTERMEDIATE_PUBLIC_PREFIX)?,
            extracted: AssetDir::create(out_images_dir.as_ref(), EXTRACTED_PUBLIC_PREFIX)?,
        })
    }
}

/// Converts a single `data:` URI (or anything with a comma-delimited base64
/// segment) straight into canonical image bytes
///
/// # Errors
///
/// * `Validation` when the payload is empty or has no data segment after a comma
/// * `UnsupportedImageData` when the segment is not base64 or not an image
pub fn convert_base64_to_image(payload: &str, codec: &dyn ImageCodec) -> ConvertResult<Vec<u8>> {
    if payload.is_empty() {
        return Err(ConvertError::Validation(
            "Base64 content is required".to_string(),
        ));
    }

    // 只取第一个逗号之后、下一个逗号之前的数据段
    let data = match payload.split(',').nth(1) {
        Some(data) if !data.trim().is_empty() => data,
        _ => {
            return Err(ConvertError::Validation(
                "Invalid Base64 content".to_string(),
            ))
        }
    };
    tracing::debug!("收到 base64 图片数据: {} 字节", data.len());

    let bytes = decode_base64_payload(data)
        .map_err(|e| ConvertError::UnsupportedImageData(format!("invalid base64: {e}")))?;

    codec.reencode(&bytes)
}

/// Reads the whole contents of a spooled upload and deletes the file
///
/// The file is removed as soon as its contents are in memory; if reading
/// fails, dropping the handle removes it as well.
pub fn read_uploaded_file(mut upload: NamedTempFile) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    upload.seek(SeekFrom::Start(0))?;
    upload.read_to_end(&mut data)?;
    upload.close()?;
    Ok(data)
}

/// Formats output path with title substitution and sanitization
pub fn format_output_path(path: &str, document_title: Option<&str>) -> String {
    let datetime: &str = &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let title = document_title.unwrap_or("");

    path.replace("%timestamp%", &datetime.replace(':', "_"))
        .replace(
            "%title%",
            title
                .replace(['/', '\\'], "_")
                .replace('<', "[")
                .replace('>', "]")
                .replace(':', " - ")
                .replace('\"', "")
                .replace('|', "-")
                .replace('?', "")
                .trim_start_matches('.'),
        )
        .replace("%extension%", "docx")
}

/// Determines the media type based on file extension
pub fn detect_media_type_by_file_name(filename: &str) -> &'static str {
    let filename_lowercased = filename.to_lowercase();

    if filename_lowercased.ends_with(".png") {
        "image/png"
    } else if filename_lowercased.ends_with(".jpg") || filename_lowercased.ends_with(".jpeg") {
        "image/jpeg"
    } else if filename_lowercased.ends_with(".gif") {
        "image/gif"
    } else if filename_lowercased.ends_with(".webp") {
        "image/webp"
    } else if filename_lowercased.ends_with(".bmp") {
        "image/bmp"
    } else if filename_lowercased.ends_with(".svg") {
        "image/svg+xml"
    } else {
        "application/octet-stream"
    }
}

/// Parses Content-Type header value (also the header of a data URL)
pub fn parse_content_type(content_type: &str) -> (String, String, bool) {
    let mut media_type = String::new();
    let mut charset = String::new();
    let mut is_base64 = false;

    let parts: Vec<&str> = content_type.split(';').collect();

    if !parts.is_empty() {
        media_type = parts[0].trim().to_lowercase();
    }

    for part in parts.iter().skip(1) {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("charset=") {
            charset = value.trim_matches('"').to_string();
        } else if part.eq_ignore_ascii_case("base64") {
            is_base64 = true;
        }
    }

    (media_type, charset, is_base64)
}

/// 文档处理器，负责协调整个转换流程
///
/// 处理器本身不含任何请求级状态，可以在并发请求之间克隆共享；
/// 每次调用都会解析出自己独占的 DOM，并在调用结束时释放。
#[derive(Clone)]
pub struct DocumentProcessor {
    dirs: StorageDirs,
    store: AssetStore,
    codec: Arc<dyn ImageCodec>,
    encoder: Arc<dyn DocxEncoder>,
}

impl DocumentProcessor {
    /// 使用 PNG 编解码器和默认 DOCX 构建器创建处理器
    ///
    /// DOCX 构建器只会打包位于中间图片目录内的本地图片。
    pub fn new(dirs: StorageDirs) -> Self {
        let encoder = DocxBuilder::new(DocxBuilderConfig {
            embed_root: Some(dirs.intermediate.root().to_path_buf()),
            ..DocxBuilderConfig::default()
        });

        Self {
            dirs,
            store: AssetStore::default(),
            codec: Arc::new(PngCodec),
            encoder: Arc::new(encoder),
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.store = AssetStore::new(codec.extension());
        self.codec = codec;
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn DocxEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn dirs(&self) -> &StorageDirs {
        &self.dirs
    }

    pub fn codec(&self) -> &dyn ImageCodec {
        self.codec.as_ref()
    }

    /// 将 HTML 转换为 DOCX 字节
    pub fn convert(&self, request: ConversionRequest) -> ConvertResult<Vec<u8>> {
        // 1-2. 校验并解析
        let dom = DocumentLoader::new().load(request)?;

        // 3. 每个请求只检查一次目录权限
        self.dirs.intermediate.ensure_writable()?;

        // 4. 提取图片并改写 src，路径列表在此流程中不需要
        let report = self.extract(&dom, &self.dirs.intermediate)?;
        tracing::info!(
            "文档图片处理完成: 成功 {} 张, 跳过 {} 张",
            report.assets.len(),
            report.skipped.len()
        );

        // 5. 序列化修改后的 DOM
        let html = serialize_document(&dom)?;
        drop(dom);

        // 6. 交给 DOCX 编码器
        let docx = self.encoder.encode(&html)?;
        tracing::info!("DOCX 生成完成: {} 字节", docx.len());

        Ok(docx)
    }

    /// 只提取图片，返回按文档顺序排列的公开路径
    pub fn extract_images(&self, request: ConversionRequest) -> ConvertResult<Vec<String>> {
        let dom = DocumentLoader::new().load(request)?;

        self.dirs.extracted.ensure_writable()?;

        let report = self.extract(&dom, &self.dirs.extracted)?;
        Ok(report.into_public_paths())
    }

    /// 单张 base64 图片转换
    pub fn convert_base64_to_image(&self, payload: &str) -> ConvertResult<Vec<u8>> {
        convert_base64_to_image(payload, self.codec.as_ref())
    }

    fn extract(&self, dom: &RcDom, target: &AssetDir) -> ConvertResult<ExtractionReport> {
        ImageExtractor::new(self.codec.as_ref(), &self.store)
            .extract_and_rewrite(&dom.document, target)
    }
}

/// 文档加载器：校验请求并按正确的字符集解析 DOM
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, request: ConversionRequest) -> ConvertResult<RcDom> {
        request.validate()?;

        match request {
            ConversionRequest::Html(html) => Ok(html_string_to_dom(&html)),
            ConversionRequest::UploadedFile(data) => {
                let (dom, encoding) = self.process_encoding(&data);
                if !encoding.eq_ignore_ascii_case("utf-8") {
                    tracing::debug!("上传文件使用 {} 编码，已转换为 UTF-8", encoding);
                    set_charset(&dom, "utf-8");
                }
                Ok(dom)
            }
        }
    }

    /// 先按 UTF-8 解析，若文档声明了其他有效字符集则重新解析
    pub fn process_encoding(&self, input_data: &[u8]) -> (RcDom, String) {
        let mut document_encoding = "utf-8".to_string();
        let mut dom = html_to_dom(input_data, document_encoding.clone());

        if let Some(html_charset) = get_charset(&dom.document) {
            if let Some(document_charset) =
                Encoding::for_label_no_replacement(html_charset.as_bytes())
            {
                if document_charset != encoding_rs::UTF_8 {
                    document_encoding = document_charset.name().to_string();
                    dom = html_to_dom(input_data, document_encoding.clone());
                }
            }
        }

        (dom, document_encoding)
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}
