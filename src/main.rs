//! # 水印去除工具：命令行入口
//!
//! 本文件仅负责日志初始化、参数解析与服务调用。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use watermark_inpaint::error::AppError;
use watermark_inpaint::inpaint::{ImageSource, InpaintServiceState, resize_filter_from_str};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove the masked region from an image.
    Process {
        /// The image to repair.
        image: PathBuf,

        /// The mask; bright pixels mark the region to remove.
        mask: PathBuf,

        /// The path to save the repaired PNG.
        #[arg(short, long, default_value = "inpainted.png")]
        output: PathBuf,

        /// Neighborhood radius used when synthesizing each pixel.
        #[arg(long)]
        radius: Option<u32>,

        /// Mask brightness at or above which a pixel is repaired.
        #[arg(long)]
        threshold: Option<u8>,

        /// Filter used when the mask size differs from the image size.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print the service health probe as JSON.
    Health,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let service = InpaintServiceState::new()?;

    match args.command {
        Command::Health => {
            println!("{}", serde_json::to_string(&service.health())?);
        }
        Command::Process {
            image,
            mask,
            output,
            radius,
            threshold,
            filter,
        } => {
            let mut config = service.config()?;
            if let Some(radius) = radius {
                config.radius = radius;
            }
            if let Some(threshold) = threshold {
                config.mask_threshold = threshold;
            }
            if let Some(filter) = filter.as_deref() {
                config.mask_resize_filter = resize_filter_from_str(filter)?;
            }
            service.set_config(config)?;

            log::info!(
                "🚀 开始修复 - 图片: {} 掩码: {}",
                image.display(),
                mask.display()
            );

            let outcome = service
                .process_source(ImageSource::FilePath(image), ImageSource::FilePath(mask))
                .await?;
            std::fs::write(&output, &outcome.png)?;

            log::info!("💾 已写入 {}", output.display());

            let summary = serde_json::json!({
                "output": output.display().to_string(),
                "width": outcome.width,
                "height": outcome.height,
                "report": outcome.report,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
