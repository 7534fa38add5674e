//! Web 服务器主程序入口

use htmldocx::env::{core::LogLevel, init_tracing, EnvConfig, EnvVar};
use htmldocx::web::{WebConfig, WebServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(&LogLevel::get()?);

    let env_config = EnvConfig::from_env()?;
    if env_config.mode == "development" {
        env_config.print_summary();
    }

    // 环境变量提供默认值，命令行参数覆盖
    let mut web_config = WebConfig::from_env()?;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    web_config.bind_addr = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --bind requires an address");
                    std::process::exit(1);
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    web_config.port = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("Error: Invalid port number");
                        std::process::exit(1);
                    });
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Error: Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    web_config.validate()?;

    let server = WebServer::new(web_config);
    server.start().await?;

    Ok(())
}

fn print_help() {
    println!("htmldocx web server");
    println!();
    println!("USAGE:");
    println!("    htmldocx-web [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -b, --bind <ADDRESS>     Bind address [default: 127.0.0.1]");
    println!("    -p, --port <PORT>        Port number [default: 3001]");
    println!("    -h, --help               Print help information");
    println!();
    println!("Directories and limits are read from HTMLDOCX_* environment variables,");
    println!("run `htmldocx env-docs` for the full list.");
    println!();
    println!("EXAMPLES:");
    println!("    htmldocx-web");
    println!("    htmldocx-web --bind 0.0.0.0 --port 3000");
}
