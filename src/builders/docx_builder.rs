//! DOCX 构建器
//!
//! 生成的文档正文只有一个 `altChunk`，指向包内的 MHT（MIME HTML）部件，
//! 由 Word 在打开时导入 HTML。引用本地图片的 `<img>` 会把图片一并打包进
//! MHT，生成的 DOCX 不依赖服务器上的文件。

use base64::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::{detect_media_type_by_file_name, ConvertError, ConvertResult};
use crate::parsers::html::{
    find_nodes, get_node_attr, html_string_to_dom, serialize_document, set_node_attr,
};

const MHT_BOUNDARY: &str = "----=mhtDocumentPart";
const MHT_DOCUMENT_LOCATION: &str = "file:///C:/fake/document.html";
const MHT_LINE_WIDTH: usize = 76;

/// DOCX 编码器
pub trait DocxEncoder: Send + Sync {
    /// 将 HTML 文本编码为完整的 DOCX 文件字节
    fn encode(&self, html: &str) -> ConvertResult<Vec<u8>>;
}

/// 页面方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(format!("无效的页面方向: {other}")),
        }
    }
}

/// 页边距，单位为 twip（1/1440 英寸）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMargins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
    pub header: u32,
    pub footer: u32,
    pub gutter: u32,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            top: 1440,
            right: 1440,
            bottom: 1440,
            left: 1440,
            header: 720,
            footer: 720,
            gutter: 0,
        }
    }
}

/// DOCX 构建配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxBuilderConfig {
    pub orientation: Orientation,
    pub margins: PageMargins,
    /// 允许打包进文档的本地图片根目录，`None` 表示不打包任何本地文件
    pub embed_root: Option<PathBuf>,
}

/// 打包进 MHT 的一个资源部件
#[derive(Debug, Clone, PartialEq, Eq)]
struct MhtPart {
    location: String,
    content_type: &'static str,
    data: Vec<u8>,
}

/// 基于 altChunk 的 DOCX 构建器
#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    config: DocxBuilderConfig,
}

impl DocxBuilder {
    pub fn new(config: DocxBuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DocxBuilderConfig {
        &self.config
    }

    fn document_xml(&self) -> String {
        let (width, height, orient) = match self.config.orientation {
            Orientation::Portrait => (12240, 15840, ""),
            Orientation::Landscape => (15840, 12240, r#" w:orient="landscape""#),
        };
        let m = &self.config.margins;

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:altChunk r:id="htmlChunk"/>
    <w:sectPr>
      <w:pgSz w:w="{width}" w:h="{height}"{orient}/>
      <w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="{}" w:footer="{}" w:gutter="{}"/>
    </w:sectPr>
  </w:body>
</w:document>"#,
            m.top, m.right, m.bottom, m.left, m.header, m.footer, m.gutter
        )
    }

    /// 找出可打包的本地图片，并把它们的 src 改写为 MHT 内的位置
    ///
    /// 没有可打包的图片时原样返回 HTML。
    fn collect_local_images(&self, html: &str) -> ConvertResult<(String, Vec<MhtPart>)> {
        let Some(root) = self
            .config
            .embed_root
            .as_deref()
            .and_then(|root| fs::canonicalize(root).ok())
        else {
            return Ok((html.to_string(), Vec::new()));
        };

        let dom = html_string_to_dom(html);
        let mut parts: Vec<MhtPart> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for img in find_nodes(&dom.document, vec!["img"]) {
            let Some(src) = get_node_attr(&img, "src") else {
                continue;
            };
            let Some((path, location)) = embeddable_file(&root, &src) else {
                continue;
            };

            if !seen.contains(&location) {
                match fs::read(&path) {
                    Ok(data) => {
                        parts.push(MhtPart {
                            content_type: detect_media_type_by_file_name(&path.to_string_lossy()),
                            location: location.clone(),
                            data,
                        });
                        seen.insert(location.clone());
                    }
                    Err(e) => {
                        tracing::warn!("无法读取图片 {}: {}", path.display(), e);
                        continue;
                    }
                }
            }
            set_node_attr(&img, "src", Some(location));
        }

        if parts.is_empty() {
            return Ok((html.to_string(), parts));
        }
        Ok((serialize_document(&dom)?, parts))
    }

    fn mht_document(&self, html: &str) -> ConvertResult<String> {
        let (html, parts) = self.collect_local_images(html)?;
        tracing::debug!("MHT 打包 {} 个本地图片", parts.len());

        let mut mht = format!(
            "MIME-Version: 1.0\r\nContent-Type: multipart/related;\r\n    type=\"text/html\";\r\n    boundary=\"{MHT_BOUNDARY}\"\r\n\r\n"
        );

        push_mht_part(
            &mut mht,
            "text/html; charset=\"utf-8\"",
            MHT_DOCUMENT_LOCATION,
            html.as_bytes(),
        );
        for part in &parts {
            push_mht_part(&mut mht, part.content_type, &part.location, &part.data);
        }

        mht.push_str(&format!("--{MHT_BOUNDARY}--\r\n"));
        Ok(mht)
    }

    fn write_package(&self, document_xml: &str, mht: &str) -> ZipResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opt = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", opt)?;
        zip.write_all(content_types_xml().as_bytes())?;

        zip.start_file("_rels/.rels", opt)?;
        zip.write_all(rels_xml().as_bytes())?;

        zip.start_file("word/document.xml", opt)?;
        zip.write_all(document_xml.as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", opt)?;
        zip.write_all(word_rels_xml().as_bytes())?;

        zip.start_file("word/afchunk.mht", opt)?;
        zip.write_all(mht.as_bytes())?;

        Ok(zip.finish()?.into_inner())
    }
}

impl DocxEncoder for DocxBuilder {
    fn encode(&self, html: &str) -> ConvertResult<Vec<u8>> {
        let mht = self.mht_document(html)?;
        self.write_package(&self.document_xml(), &mht)
            .map_err(|e| ConvertError::EncodingFailure(format!("无法写入 DOCX: {e}")))
    }
}

/// 绝对路径且规范化后位于 `root` 内的普通文件，返回规范路径和对应的 file URL
fn embeddable_file(root: &Path, src: &str) -> Option<(PathBuf, String)> {
    let path = Path::new(src);
    if !path.is_absolute() {
        return None;
    }

    let canonical = fs::canonicalize(path).ok()?;
    if !canonical.starts_with(root) || !canonical.is_file() {
        return None;
    }

    let location = Url::from_file_path(&canonical).ok()?.to_string();
    Some((canonical, location))
}

fn push_mht_part(out: &mut String, content_type: &str, location: &str, data: &[u8]) {
    out.push_str(&format!(
        "--{MHT_BOUNDARY}\r\nContent-Location: {location}\r\nContent-Transfer-Encoding: base64\r\nContent-Type: {content_type}\r\n\r\n"
    ));

    // base64 输出只含 ASCII，可以按字节切分
    let encoded = BASE64_STANDARD.encode(data);
    let mut start = 0;
    while start < encoded.len() {
        let end = (start + MHT_LINE_WIDTH).min(encoded.len());
        out.push_str(&encoded[start..end]);
        out.push_str("\r\n");
        start = end;
    }
    out.push_str("\r\n");
}

fn content_types_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="mht" ContentType="message/rfc822"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#
}

fn rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#
}

fn word_rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="htmlChunk" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/aFChunk" Target="/word/afchunk.mht"/>
</Relationships>"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn read_entry(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    fn decode_html_part(mht: &str) -> String {
        let delimiter = format!("--{MHT_BOUNDARY}\r\n");
        let part = mht.split(&delimiter).nth(1).unwrap();
        let body = part.split("\r\n\r\n").nth(1).unwrap();
        let compact: String = body.split("\r\n").collect();
        String::from_utf8(BASE64_STANDARD.decode(compact).unwrap()).unwrap()
    }

    #[test]
    fn test_package_layout() {
        let docx = DocxBuilder::default().encode("<p>Hello</p>").unwrap();

        assert!(docx.starts_with(b"PK"));
        let archive = ZipArchive::new(Cursor::new(docx.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/afchunk.mht",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }

        let document = read_entry(&docx, "word/document.xml");
        assert!(document.contains(r#"<w:altChunk r:id="htmlChunk"/>"#));
        assert!(document.contains(r#"<w:pgSz w:w="12240" w:h="15840"/>"#));

        let rels = read_entry(&docx, "word/_rels/document.xml.rels");
        assert!(rels.contains(r#"Id="htmlChunk""#));
        assert!(rels.contains("aFChunk"));
    }

    #[test]
    fn test_html_round_trips_through_mht() {
        let html = "<html><body><p>第一段</p><p>Second &amp; last</p></body></html>";
        let docx = DocxBuilder::default().encode(html).unwrap();
        let mht = read_entry(&docx, "word/afchunk.mht");

        assert!(mht.contains("multipart/related"));
        assert_eq!(decode_html_part(&mht), html);
    }

    #[test]
    fn test_landscape_and_margins() {
        let builder = DocxBuilder::new(DocxBuilderConfig {
            orientation: Orientation::Landscape,
            margins: PageMargins {
                top: 720,
                ..PageMargins::default()
            },
            embed_root: None,
        });
        let docx = builder.encode("<p>wide</p>").unwrap();
        let document = read_entry(&docx, "word/document.xml");

        assert!(document.contains(r#"w:w="15840" w:h="12240" w:orient="landscape""#));
        assert!(document.contains(r#"w:top="720""#));
        assert!(document.contains(r#"w:header="720""#));
    }

    #[test]
    fn test_embeds_images_inside_root_only() {
        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let inside_path = root.path().join("inside.png");
        let outside_path = outside.path().join("outside.png");
        fs::write(&inside_path, b"inside-bytes").unwrap();
        fs::write(&outside_path, b"outside-bytes").unwrap();

        let builder = DocxBuilder::new(DocxBuilderConfig {
            embed_root: Some(root.path().to_path_buf()),
            ..DocxBuilderConfig::default()
        });
        let html = format!(
            r#"<p><img src="{}"><img src="{}"><img src="{}"></p>"#,
            inside_path.display(),
            outside_path.display(),
            inside_path.display(),
        );
        let (rewritten, parts) = builder.collect_local_images(&html).unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].data, b"inside-bytes");
        assert_eq!(parts[0].content_type, "image/png");
        assert!(parts[0].location.starts_with("file:///"));
        assert_eq!(rewritten.matches(parts[0].location.as_str()).count(), 2);
        assert!(rewritten.contains(&*outside_path.to_string_lossy()));
    }

    #[test]
    fn test_embeds_src_next_to_lookalike_attributes() {
        let root = TempDir::new().unwrap();
        let image_path = root.path().join("a.png");
        fs::write(&image_path, b"png-bytes").unwrap();

        let builder = DocxBuilder::new(DocxBuilderConfig {
            embed_root: Some(root.path().to_path_buf()),
            ..DocxBuilderConfig::default()
        });
        for html in [
            format!(r#"<img data-src="lazy.png" src="{}">"#, image_path.display()),
            format!(r#"<img alt="a > b" src="{}">"#, image_path.display()),
        ] {
            let (rewritten, parts) = builder.collect_local_images(&html).unwrap();

            assert_eq!(parts.len(), 1, "not embedded: {html}");
            assert_eq!(parts[0].data, b"png-bytes");
            assert!(rewritten.contains(&format!(r#"src="{}""#, parts[0].location)));
            assert!(!rewritten.contains(&*image_path.to_string_lossy()));
        }
    }

    #[test]
    fn test_ignores_relative_and_missing_paths() {
        let root = TempDir::new().unwrap();
        let builder = DocxBuilder::new(DocxBuilderConfig {
            embed_root: Some(root.path().to_path_buf()),
            ..DocxBuilderConfig::default()
        });
        let missing = root.path().join("missing.png");
        let html = format!(
            r#"<img src="relative.png"><img src="{}"><img src="https://example.com/x.png">"#,
            missing.display()
        );

        let (rewritten, parts) = builder.collect_local_images(&html).unwrap();

        assert!(parts.is_empty());
        assert_eq!(rewritten, html);
    }

    #[test]
    fn test_without_embed_root_nothing_is_read() {
        let root = TempDir::new().unwrap();
        let image_path = root.path().join("a.png");
        fs::write(&image_path, b"bytes").unwrap();
        let html = format!(r#"<img src="{}">"#, image_path.display());

        let (rewritten, parts) = DocxBuilder::default().collect_local_images(&html).unwrap();

        assert!(parts.is_empty());
        assert_eq!(rewritten, html);
    }

    #[test]
    fn test_orientation_from_str() {
        assert_eq!("Landscape".parse::<Orientation>(), Ok(Orientation::Landscape));
        assert_eq!("portrait".parse::<Orientation>(), Ok(Orientation::Portrait));
        assert!("sideways".parse::<Orientation>().is_err());
    }
}
