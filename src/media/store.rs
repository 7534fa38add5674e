use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::core::{ConvertError, ConvertResult};

/// 生成唯一文件名的最大尝试次数
const MAX_NAME_ATTEMPTS: usize = 8;

/// 资源目录：文件系统位置及其对外公开的 URL 前缀
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDir {
    root: PathBuf,
    public_prefix: String,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// 创建目录（如不存在）
    pub fn create(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> io::Result<Self> {
        let dir = Self::new(root, public_prefix);
        fs::create_dir_all(&dir.root)?;
        Ok(dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// 文件对外公开的路径，例如 `/out_images/<uuid>.png`
    pub fn public_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_prefix, file_name)
    }

    /// 检查目录存在且可写
    ///
    /// 在目录中创建并立即删除一个探测文件，比检查权限位更可靠。
    pub fn ensure_writable(&self) -> ConvertResult<()> {
        match tempfile::Builder::new()
            .prefix(".write-probe")
            .tempfile_in(&self.root)
        {
            Ok(probe) => {
                drop(probe);
                Ok(())
            }
            Err(e) => {
                tracing::error!("目录不可写: {} ({})", self.root.display(), e);
                Err(ConvertError::StorageUnwritable {
                    path: self.root.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// 已写入的资源文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub id: Uuid,
    pub file_name: String,
    pub absolute_path: PathBuf,
    pub public_path: String,
}

/// 资源存储，使用随机 UUID 命名文件，从不覆盖已有文件
#[derive(Debug, Clone)]
pub struct AssetStore {
    extension: &'static str,
}

impl AssetStore {
    pub fn new(extension: &'static str) -> Self {
        Self { extension }
    }

    /// 将字节写入目录下的新文件
    pub fn store(&self, bytes: &[u8], dir: &AssetDir) -> ConvertResult<StoredAsset> {
        let root = fs::canonicalize(dir.root()).map_err(|e| ConvertError::StorageUnwritable {
            path: dir.root().to_path_buf(),
            reason: e.to_string(),
        })?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let id = Uuid::new_v4();
            let file_name = format!("{}.{}", id, self.extension);
            let absolute_path = root.join(&file_name);

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&absolute_path)
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::warn!("资源文件名冲突，重新生成: {}", file_name);
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    return Err(ConvertError::StorageUnwritable {
                        path: dir.root().to_path_buf(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = file.write_all(bytes) {
                drop(file);
                let _ = fs::remove_file(&absolute_path);
                return Err(e.into());
            }

            tracing::debug!("资源已保存: {} ({} 字节)", absolute_path.display(), bytes.len());

            return Ok(StoredAsset {
                id,
                public_path: dir.public_path(&file_name),
                file_name,
                absolute_path,
            });
        }

        Err(ConvertError::Io(io::Error::new(
            ErrorKind::AlreadyExists,
            "unable to allocate a unique asset name",
        )))
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new("png")
    }
}
