// 集成测试公共模块
//
// 提供测试环境、图片夹具和 DOCX 检查工具

#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use base64::prelude::*;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;
use zip::ZipArchive;

use htmldocx::core::{DocumentProcessor, StorageDirs};

/// 每个测试独占的存储环境
pub struct TestEnvironment {
    pub temp: TempDir,
    pub dirs: StorageDirs,
    pub processor: DocumentProcessor,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let dirs = StorageDirs::create(temp.path().join("images"), temp.path().join("out_images"))
            .expect("create storage dirs");
        let processor = DocumentProcessor::new(dirs.clone());

        Self {
            temp,
            dirs,
            processor,
        }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        let dir = self.temp.path().join("uploads");
        fs::create_dir_all(&dir).expect("create uploads dir");
        dir
    }

    pub fn intermediate_files(&self) -> Vec<PathBuf> {
        list_files(self.dirs.intermediate.root())
    }

    pub fn extracted_files(&self) -> Vec<PathBuf> {
        list_files(self.dirs.extracted.root())
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .collect();
    files.sort();
    files
}

/// 测试图片生成器
pub struct ImageFixtures;

impl ImageFixtures {
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([10, 120, 200, 255]),
        ));
        Self::encode(&image, ImageFormat::Png)
    }

    pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])));
        Self::encode(&image, ImageFormat::Jpeg)
    }

    pub fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([0, 0, 0, 255]),
        ));
        Self::encode(&image, ImageFormat::Gif)
    }

    pub fn data_url(media_type: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", media_type, BASE64_STANDARD.encode(bytes))
    }

    pub fn png_data_url(width: u32, height: u32) -> String {
        Self::data_url("image/png", &Self::png_bytes(width, height))
    }

    pub fn jpeg_data_url(width: u32, height: u32) -> String {
        Self::data_url("image/jpeg", &Self::jpeg_bytes(width, height))
    }

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), format)
            .expect("encode fixture");
        bytes
    }
}

/// DOCX 检查工具
pub struct DocxInspector {
    bytes: Vec<u8>,
}

impl DocxInspector {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn entry(&self, name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice())).expect("valid zip");
        let mut entry = archive.by_name(name).expect("entry exists");
        let mut content = String::new();
        entry.read_to_string(&mut content).expect("utf-8 entry");
        content
    }

    pub fn entry_names(&self) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(self.bytes.as_slice())).expect("valid zip");
        archive.file_names().map(str::to_string).collect()
    }

    /// MHT 中所有部件，按 (Content-Location, 解码后的内容)
    pub fn mht_parts(&self) -> Vec<(String, Vec<u8>)> {
        let mht = self.entry("word/afchunk.mht");
        let boundary = mht
            .split("boundary=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .expect("boundary")
            .to_string();
        let delimiter = format!("--{}\r\n", boundary);

        mht.split(&delimiter)
            .skip(1)
            .map(|part| {
                let (headers, body) = part.split_once("\r\n\r\n").expect("part body");
                let location = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("Content-Location: "))
                    .expect("location")
                    .to_string();
                let encoded: String = body
                    .lines()
                    .take_while(|line| !line.starts_with("--"))
                    .collect();
                (location, BASE64_STANDARD.decode(encoded.trim()).expect("base64 body"))
            })
            .collect()
    }

    /// 文档的 HTML 内容
    pub fn html(&self) -> String {
        let (_, body) = self.mht_parts().into_iter().next().expect("html part");
        String::from_utf8(body).expect("utf-8 html")
    }
}
