//! 内联图片提取
//!
//! 找出文档中所有 src 为 `data:image/...` 的 `<img>`，逐个解码、重编码、
//! 写入资源目录，再把 src 改写为新文件的绝对路径。单张图片失败只会被记录
//! 并跳过，不会中断整个文档的处理。

use markup5ever_rcdom::Handle;
use std::path::PathBuf;
use uuid::Uuid;

use crate::core::{ConvertError, ConvertResult};
use crate::media::{AssetDir, AssetStore, ImageCodec};
use crate::utils::data_url::{decode_base64_payload, is_embedded_image, parse_data_url};

use super::dom::{find_nodes, get_node_attr, set_node_attr};

/// 处理进度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub processed: usize,
    pub total: usize,
    pub percent: f64,
}

impl ProgressReport {
    /// `total` 为 0 时视为已完成
    pub fn new(processed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            (processed as f64 * 100.0 / total as f64).floor()
        };

        Self {
            processed,
            total,
            percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// 成功提取的一张图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAsset {
    pub id: Uuid,
    /// 在文档所有 `<img>` 中的位置
    pub index: usize,
    pub absolute_path: PathBuf,
    pub public_path: String,
    pub size: usize,
}

/// 被跳过的一张图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImage {
    pub index: usize,
    pub reason: String,
}

/// 一次提取的结果
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// 按文档顺序排列
    pub assets: Vec<ExtractedAsset>,
    pub skipped: Vec<SkippedImage>,
    /// 文档中 `<img>` 的总数（包括非内联图片）
    pub img_nodes: usize,
    /// 最后一次进度，没有内联图片时为 `None`
    pub progress: Option<ProgressReport>,
}

impl ExtractionReport {
    pub fn public_paths(&self) -> Vec<String> {
        self.assets
            .iter()
            .map(|asset| asset.public_path.clone())
            .collect()
    }

    pub fn into_public_paths(self) -> Vec<String> {
        self.assets
            .into_iter()
            .map(|asset| asset.public_path)
            .collect()
    }
}

/// 图片提取器
pub struct ImageExtractor<'a> {
    codec: &'a dyn ImageCodec,
    store: &'a AssetStore,
    on_progress: Option<Box<dyn FnMut(&ProgressReport) + 'a>>,
}

impl<'a> ImageExtractor<'a> {
    pub fn new(codec: &'a dyn ImageCodec, store: &'a AssetStore) -> Self {
        Self {
            codec,
            store,
            on_progress: None,
        }
    }

    /// 每处理完一张内联图片（无论成功与否）调用一次
    pub fn on_progress(mut self, callback: impl FnMut(&ProgressReport) + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// 提取 `document` 中所有内联图片并改写其 src
    ///
    /// 节点列表在处理前一次性取快照，处理过程中对 DOM 的修改不会影响遍历。
    /// 只有目录类错误会中止处理；此前已写入的文件会保留在磁盘上。
    pub fn extract_and_rewrite(
        mut self,
        document: &Handle,
        target: &AssetDir,
    ) -> ConvertResult<ExtractionReport> {
        let img_nodes = find_nodes(document, vec!["img"]);

        let embedded: Vec<(usize, Handle, String)> = img_nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                get_node_attr(node, "src")
                    .filter(|src| is_embedded_image(src))
                    .map(|src| (index, node.clone(), src))
            })
            .collect();

        let mut report = ExtractionReport {
            img_nodes: img_nodes.len(),
            ..ExtractionReport::default()
        };
        let total = embedded.len();
        tracing::debug!("发现 {} 个 <img>，其中 {} 个内联图片", img_nodes.len(), total);

        for (processed, (index, node, src)) in embedded.into_iter().enumerate() {
            match self.extract_one(&src, target) {
                Ok((stored, size)) => {
                    set_node_attr(
                        &node,
                        "src",
                        Some(stored.absolute_path.to_string_lossy().into_owned()),
                    );
                    report.assets.push(ExtractedAsset {
                        id: stored.id,
                        index,
                        absolute_path: stored.absolute_path,
                        public_path: stored.public_path,
                        size,
                    });
                }
                Err(ConvertError::UnsupportedImageData(reason)) => {
                    tracing::warn!("跳过第 {} 个图片: {}", index, reason);
                    report.skipped.push(SkippedImage { index, reason });
                }
                Err(e) => return Err(e),
            }

            let progress = ProgressReport::new(processed + 1, total);
            self.report_progress(&progress);
            report.progress = Some(progress);
        }

        Ok(report)
    }

    fn extract_one(
        &self,
        src: &str,
        target: &AssetDir,
    ) -> ConvertResult<(crate::media::StoredAsset, usize)> {
        let data_url = parse_data_url(src).ok_or_else(|| {
            ConvertError::UnsupportedImageData("missing data segment".to_string())
        })?;

        if !data_url.is_base64 {
            return Err(ConvertError::UnsupportedImageData(format!(
                "{} is not base64 encoded",
                data_url.media_type
            )));
        }

        let bytes = decode_base64_payload(data_url.payload)
            .map_err(|e| ConvertError::UnsupportedImageData(format!("invalid base64: {e}")))?;
        let encoded = self.codec.reencode(&bytes)?;
        let stored = self.store.store(&encoded, target)?;

        Ok((stored, encoded.len()))
    }

    fn report_progress(&mut self, progress: &ProgressReport) {
        tracing::info!(
            "图片处理进度: {}/{} ({}%)",
            progress.processed,
            progress.total,
            progress.percent
        );

        if let Some(callback) = self.on_progress.as_mut() {
            callback(progress);
        }
    }
}
