//! 统一的环境变量管理
//!
//! 所有配置项都以 `HTMLDOCX_` 为前缀，通过 [`EnvVar`] 提供类型安全的解析和默认值。

use std::env;
use std::fmt;

use crate::builders::Orientation;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => Self::DEFAULT.ok_or_else(|| EnvError {
                variable: Self::NAME.to_string(),
                message: "Required environment variable not set".to_string(),
            }),
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 字符串变量的默认值无法放进 `const`，单独给出
fn string_or(name: &str, default: &str, parse: fn(&str) -> EnvResult<String>) -> EnvResult<String> {
    match env::var(name) {
        Ok(value) => parse(&value),
        Err(_) => Ok(default.to_string()),
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 应用运行模式
    pub struct Mode;
    impl EnvVar<String> for Mode {
        const NAME: &'static str = "HTMLDOCX_MODE";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Application mode: development, staging, production";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, "production", Self::parse)
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "development" | "dev" => Ok("development".to_string()),
                "staging" | "stage" => Ok("staging".to_string()),
                "production" | "prod" => Ok("production".to_string()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid mode '{}'. Use: development, staging, production",
                        value
                    ),
                }),
            }
        }
    }

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "HTMLDOCX_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, "info", Self::parse)
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 存储目录相关环境变量
pub mod storage {
    use super::*;

    /// DOCX 构建使用的中间图片目录
    pub struct ImagesDir;
    impl EnvVar<String> for ImagesDir {
        const NAME: &'static str = "HTMLDOCX_IMAGES_DIR";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Directory for images referenced by generated documents";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, "images", Self::parse)
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_dir(value, Self::NAME)
        }
    }

    /// 供客户端展示的提取图片目录
    pub struct OutImagesDir;
    impl EnvVar<String> for OutImagesDir {
        const NAME: &'static str = "HTMLDOCX_OUT_IMAGES_DIR";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Directory for images extracted for display";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, "out_images", Self::parse)
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_dir(value, Self::NAME)
        }
    }

    /// 上传文件的临时目录
    pub struct UploadsDir;
    impl EnvVar<String> for UploadsDir {
        const NAME: &'static str = "HTMLDOCX_UPLOADS_DIR";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Directory where uploaded files are spooled";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, "uploads", Self::parse)
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_dir(value, Self::NAME)
        }
    }
}

/// 文档输出相关环境变量
pub mod document {
    use super::*;

    /// 页面方向
    pub struct DocxOrientation;
    impl EnvVar<Orientation> for DocxOrientation {
        const NAME: &'static str = "HTMLDOCX_DOCX_ORIENTATION";
        const DEFAULT: Option<Orientation> = Some(Orientation::Portrait);
        const DESCRIPTION: &'static str = "Page orientation of generated documents: portrait, landscape";

        fn parse(value: &str) -> EnvResult<Orientation> {
            value.parse::<Orientation>().map_err(|message| EnvError {
                variable: Self::NAME.to_string(),
                message,
            })
        }
    }
}

/// Web服务器相关环境变量
pub mod web {
    use super::*;

    /// 绑定地址
    pub struct BindAddress;
    impl EnvVar<String> for BindAddress {
        const NAME: &'static str = "HTMLDOCX_WEB_BIND_ADDRESS";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Web server bind address";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, "127.0.0.1", Self::parse)
        }

        fn parse(value: &str) -> EnvResult<String> {
            let addr = value.trim();
            if addr.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Address cannot be empty".to_string(),
                });
            }
            Ok(addr.to_string())
        }
    }

    /// 端口
    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "HTMLDOCX_WEB_PORT";
        const DEFAULT: Option<u16> = Some(3001);
        const DESCRIPTION: &'static str = "Web server port";

        fn parse(value: &str) -> EnvResult<u16> {
            match value.trim().parse::<u16>() {
                Ok(port) if port > 0 => Ok(port),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Must be a valid port number (1-65535)".to_string(),
                }),
            }
        }
    }

    /// 请求体大小上限
    pub struct BodyLimitMb;
    impl EnvVar<usize> for BodyLimitMb {
        const NAME: &'static str = "HTMLDOCX_WEB_BODY_LIMIT_MB";
        const DEFAULT: Option<usize> = Some(150);
        const DESCRIPTION: &'static str = "Maximum JSON/multipart request body size in MB";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 4096)
        }
    }
}

/// 辅助函数
fn parse_dir(value: &str, var_name: &str) -> EnvResult<String> {
    let dir = value.trim();
    if dir.is_empty() {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Directory cannot be empty".to_string(),
        });
    }
    Ok(dir.to_string())
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量配置汇总
#[derive(Debug, Clone)]
pub struct EnvConfig {
    // 核心配置
    pub mode: String,
    pub log_level: String,

    // 存储配置
    pub images_dir: String,
    pub out_images_dir: String,
    pub uploads_dir: String,

    // 文档配置
    pub docx_orientation: Orientation,

    // Web配置
    pub web_bind_address: String,
    pub web_port: u16,
    pub web_body_limit_mb: usize,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            mode: core::Mode::get()?,
            log_level: core::LogLevel::get()?,

            images_dir: storage::ImagesDir::get()?,
            out_images_dir: storage::OutImagesDir::get()?,
            uploads_dir: storage::UploadsDir::get()?,

            docx_orientation: document::DocxOrientation::get()?,

            web_bind_address: web::BindAddress::get()?,
            web_port: web::Port::get()?,
            web_body_limit_mb: web::BodyLimitMb::get()?,
        })
    }

    /// 打印配置摘要
    pub fn print_summary(&self) {
        println!("Environment Configuration Summary:");
        println!("  Mode: {}", self.mode);
        println!("  Log Level: {}", self.log_level);
        println!("  Images Dir: {}", self.images_dir);
        println!("  Out Images Dir: {}", self.out_images_dir);
        println!("  Uploads Dir: {}", self.uploads_dir);
        println!("  Orientation: {:?}", self.docx_orientation);
        println!("  Web Server: {}:{}", self.web_bind_address, self.web_port);
        println!("  Body Limit: {} MB", self.web_body_limit_mb);
    }
}

/// 安装 fmt 日志订阅器，级别无法识别时使用 info
#[cfg(any(feature = "cli", feature = "web"))]
pub fn init_tracing(level: &str) {
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    // 已经安装过订阅器时（例如测试中）忽略
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    push_doc(&mut docs, core::Mode::NAME, core::Mode::DESCRIPTION, "production");
    push_doc(&mut docs, core::LogLevel::NAME, core::LogLevel::DESCRIPTION, "info");

    docs.push_str("\n## Storage Configuration\n\n");
    push_doc(&mut docs, storage::ImagesDir::NAME, storage::ImagesDir::DESCRIPTION, "images");
    push_doc(
        &mut docs,
        storage::OutImagesDir::NAME,
        storage::OutImagesDir::DESCRIPTION,
        "out_images",
    );
    push_doc(&mut docs, storage::UploadsDir::NAME, storage::UploadsDir::DESCRIPTION, "uploads");

    docs.push_str("\n## Document Configuration\n\n");
    push_doc(
        &mut docs,
        document::DocxOrientation::NAME,
        document::DocxOrientation::DESCRIPTION,
        "portrait",
    );

    docs.push_str("\n## Web Server Configuration\n\n");
    push_doc(&mut docs, web::BindAddress::NAME, web::BindAddress::DESCRIPTION, "127.0.0.1");
    push_doc(&mut docs, web::Port::NAME, web::Port::DESCRIPTION, "3001");
    push_doc(&mut docs, web::BodyLimitMb::NAME, web::BodyLimitMb::DESCRIPTION, "150");

    docs
}

fn push_doc(docs: &mut String, name: &str, description: &str, default: &str) {
    docs.push_str(&format!("- `{}`: {} (default: {})\n", name, description, default));
}
