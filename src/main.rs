//! 命令行入口

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use htmldocx::builders::{DocxBuilder, DocxBuilderConfig, Orientation};
use htmldocx::core::{
    convert_base64_to_image, format_output_path, ConversionRequest, DocumentLoader,
    DocumentProcessor, StorageDirs, EXTRACTED_PUBLIC_PREFIX, INTERMEDIATE_PUBLIC_PREFIX,
};
use htmldocx::env::{core::LogLevel, generate_env_docs, init_tracing, storage, EnvVar};
use htmldocx::media::{AssetDir, PngCodec};
use htmldocx::parsers::get_title;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an HTML file into a DOCX document
    Convert {
        /// Input HTML file
        input: PathBuf,

        /// Output path, supports %title% and %timestamp%
        #[arg(short, long, default_value = "%title%.docx")]
        output: String,

        /// Directory for images extracted from the document
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// Use landscape pages
        #[arg(long)]
        landscape: bool,
    },

    /// Extract embedded images from an HTML file and print their public paths
    Extract {
        /// Input HTML file
        input: PathBuf,

        /// Directory for extracted images
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// URL prefix of the printed paths
        #[arg(long, default_value = EXTRACTED_PUBLIC_PREFIX)]
        public_prefix: String,
    },

    /// Convert one base64 image (data URI, or @FILE holding one) into PNG
    Png {
        /// Data URI, or @path to a file containing it
        payload: String,

        /// Output PNG path
        #[arg(short, long, default_value = "image.png")]
        output: PathBuf,
    },

    /// Print the supported environment variables
    EnvDocs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&LogLevel::get().unwrap_or_else(|_| "info".to_string()));

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Convert {
            input,
            output,
            images_dir,
            landscape,
        } => {
            let data = fs::read(&input)?;
            let images_dir = images_dir.unwrap_or_else(default_images_dir);
            let dirs = StorageDirs::create(&images_dir, default_out_images_dir())?;

            let orientation = if landscape {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            };
            let encoder = DocxBuilder::new(DocxBuilderConfig {
                orientation,
                embed_root: Some(dirs.intermediate.root().to_path_buf()),
                ..DocxBuilderConfig::default()
            });
            let processor = DocumentProcessor::new(dirs).with_encoder(Arc::new(encoder));

            let title = document_title(&data, &input);
            let docx = processor.convert(ConversionRequest::UploadedFile(data))?;

            let output = format_output_path(&output, Some(&title));
            write_output(Path::new(&output), &docx)?;
            println!("{}", output);
        }
        Command::Extract {
            input,
            out_dir,
            public_prefix,
        } => {
            let data = fs::read(&input)?;
            let out_dir = out_dir.unwrap_or_else(default_out_images_dir);

            let dirs = StorageDirs::new(
                AssetDir::create(default_images_dir(), INTERMEDIATE_PUBLIC_PREFIX)?,
                AssetDir::create(out_dir, public_prefix)?,
            );
            let processor = DocumentProcessor::new(dirs);

            for path in processor.extract_images(ConversionRequest::UploadedFile(data))? {
                println!("{}", path);
            }
        }
        Command::Png { payload, output } => {
            let payload = read_payload(&payload)?;
            let png = convert_base64_to_image(payload.trim(), &PngCodec)?;
            write_output(&output, &png)?;
            println!("{}", output.display());
        }
        Command::EnvDocs => {
            print!("{}", generate_env_docs());
        }
    }

    Ok(())
}

fn default_images_dir() -> PathBuf {
    storage::ImagesDir::get_or_default("images".to_string()).into()
}

fn default_out_images_dir() -> PathBuf {
    storage::OutImagesDir::get_or_default("out_images".to_string()).into()
}

/// `@path` 表示从文件读取
fn read_payload(payload: &str) -> std::io::Result<String> {
    match payload.strip_prefix('@') {
        Some(path) => fs::read_to_string(path),
        None => Ok(payload.to_string()),
    }
}

/// 文档标题，没有标题时使用输入文件名
fn document_title(data: &[u8], input: &Path) -> String {
    let (dom, _) = DocumentLoader::new().process_encoding(data);
    get_title(&dom.document)
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .or_else(|| {
            input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "output".to_string())
}

fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}
