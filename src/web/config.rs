//! Web 服务器配置
//!
//! 使用类型安全的环境变量系统进行配置管理

use std::io;
use std::path::PathBuf;

use crate::builders::Orientation;
use crate::core::StorageDirs;
use crate::env::{EnvError, EnvResult, EnvVar};

/// Web 服务器配置
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
    /// 请求体大小上限（MB）
    pub body_limit_mb: usize,
    /// DOCX 构建使用的中间图片目录
    pub images_dir: PathBuf,
    /// 提取图片目录
    pub out_images_dir: PathBuf,
    /// 上传文件临时目录
    pub uploads_dir: PathBuf,
    /// 页面方向
    pub orientation: Orientation,
}

impl WebConfig {
    /// 从环境变量创建配置
    pub fn from_env() -> EnvResult<Self> {
        use crate::env::{document, storage, web};

        Ok(Self {
            bind_addr: web::BindAddress::get()?,
            port: web::Port::get()?,
            body_limit_mb: web::BodyLimitMb::get()?,
            images_dir: storage::ImagesDir::get()?.into(),
            out_images_dir: storage::OutImagesDir::get()?.into(),
            uploads_dir: storage::UploadsDir::get()?.into(),
            orientation: document::DocxOrientation::get()?,
        })
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        if self.bind_addr.is_empty() {
            return Err(EnvError {
                variable: crate::env::web::BindAddress::NAME.to_string(),
                message: "Bind address cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(EnvError {
                variable: crate::env::web::Port::NAME.to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.images_dir == self.out_images_dir {
            return Err(EnvError {
                variable: crate::env::storage::OutImagesDir::NAME.to_string(),
                message: "Must differ from the images directory".to_string(),
            });
        }

        Ok(())
    }

    /// 获取完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }

    /// 创建（如不存在）所有存储目录
    pub fn prepare_storage(&self) -> io::Result<StorageDirs> {
        std::fs::create_dir_all(&self.uploads_dir)?;
        StorageDirs::create(&self.images_dir, &self.out_images_dir)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            tracing::warn!("Failed to load web config from environment: {}. Using defaults.", e);
            Self {
                bind_addr: "127.0.0.1".to_string(),
                port: 3001,
                body_limit_mb: 150,
                images_dir: PathBuf::from("images"),
                out_images_dir: PathBuf::from("out_images"),
                uploads_dir: PathBuf::from("uploads"),
                orientation: Orientation::Portrait,
            }
        })
    }
}
