//! jsonmon 主程序入口

use clap::error::ErrorKind;
use jsonmon::cli::Args;
use jsonmon::error::{JsonmonError, EXIT_USAGE};
use jsonmon::logging::{LogConfig, LoggingSystem};
use jsonmon::service::ServiceLauncher;
use jsonmon::version::VersionInfo;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse_args() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE as u8),
            };
        }
    };

    if args.version {
        return match VersionInfo::current().to_json() {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    let log_config = LogConfig {
        json_format: args.log_json,
        ..LogConfig::with_level(args.log_level.clone().into())
    };
    if let Err(e) = LoggingSystem::setup_logging(log_config) {
        eprintln!("{e}");
    }

    let Some(config_path) = args.config else {
        return exit_with(JsonmonError::Usage("缺少配置文件参数".to_string()));
    };

    info!("jsonmon v{} 启动", jsonmon::VERSION);

    match ServiceLauncher::run(&config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => exit_with(e),
    }
}

/// 记录错误并转换为退出码
fn exit_with(e: JsonmonError) -> ExitCode {
    error!("{}", e);
    ExitCode::from(e.exit_code() as u8)
}
