//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `InpaintHandler` 只负责流程编排与配置管理，不关心调用方是 CLI 还是异步服务。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载图片与掩码原始字节
//! 3. 解码为像素缓冲区
//! 4. 掩码归一化（对齐尺寸 + 二值化）
//! 5. 快速行进填充
//! 6. 编码为 PNG
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<InpaintConfig>>` 支持运行时更新。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/decode/normalize/fill/encode/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::engine::{FillReport, inpaint_in_place};
use super::mask::normalize_mask;
use super::source::{ImageSource, PixelBuffer};
use super::{InpaintConfig, InpaintError};

/// 一次修复请求的输出。
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// 修复结果（PNG 编码）。
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub report: FillReport,
}

/// 修复处理器。
///
/// 封装了配置状态，并编排各子模块实现完整流程。
pub struct InpaintHandler {
    pub(super) config: Arc<RwLock<InpaintConfig>>,
}

impl InpaintHandler {
    /// 根据初始配置创建处理器，配置非法时直接拒绝。
    ///
    /// # 示例
    /// ```rust
    /// use watermark_inpaint::inpaint::{InpaintConfig, InpaintHandler};
    ///
    /// let handler = InpaintHandler::new(InpaintConfig::default())?;
    /// assert_eq!(handler.config_snapshot()?.radius, 3);
    /// # Ok::<(), watermark_inpaint::inpaint::InpaintError>(())
    /// ```
    pub fn new(config: InpaintConfig) -> Result<Self, InpaintError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<InpaintConfig, InpaintError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| InpaintError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 整体替换配置，校验失败时保留旧配置。
    pub fn set_config(&self, config: InpaintConfig) -> Result<(), InpaintError> {
        config.validate()?;

        let mut guard = self
            .config
            .write()
            .map_err(|_| InpaintError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        *guard = config;

        log::info!(
            "⚙️ 已更新修复配置：radius={} threshold={} filter={} timeout={}ms",
            guard.radius,
            guard.mask_threshold,
            super::resize_filter_name(guard.mask_resize_filter),
            guard.process_timeout_ms
        );

        Ok(())
    }

    /// 只调整修复半径。
    pub fn set_radius(&self, radius: u32) -> Result<(), InpaintError> {
        let mut config = self.config_snapshot()?;
        config.radius = radius;
        self.set_config(config)
    }

    /// 处理主入口：加载图片与掩码并返回修复后的 PNG。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use watermark_inpaint::inpaint::{ImageSource, InpaintConfig, InpaintHandler};
    ///
    /// let handler = InpaintHandler::new(InpaintConfig::default())?;
    /// let outcome = handler.process(
    ///     ImageSource::FilePath("photo.png".into()),
    ///     ImageSource::FilePath("mask.png".into()),
    /// )?;
    /// std::fs::write("inpainted.png", &outcome.png).ok();
    /// # Ok::<(), watermark_inpaint::inpaint::InpaintError>(())
    /// ```
    pub fn process(
        &self,
        image: ImageSource,
        mask: ImageSource,
    ) -> Result<ProcessOutcome, InpaintError> {
        let config = self.config_snapshot()?;
        self.process_with_config(image, mask, &config)
    }

    /// 使用外部给定的配置快照处理一次请求。
    pub fn process_with_config(
        &self,
        image: ImageSource,
        mask: ImageSource,
        config: &InpaintConfig,
    ) -> Result<ProcessOutcome, InpaintError> {
        let total_start = Instant::now();

        let load_start = Instant::now();
        let raw_image = self.load_source(image, config)?;
        let raw_mask = self.load_source(mask, config)?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let image = self.decode_to_buffer(raw_image, config)?;
        let mask = self.decode_to_buffer(raw_mask, config)?;
        let decode_elapsed = decode_start.elapsed();

        let (output, report, normalize_ms, fill_ms) = Self::run_buffers(image, &mask, config)?;

        let encode_start = Instant::now();
        let png = Self::encode_png(&output)?;
        let encode_elapsed = encode_start.elapsed();

        let total_elapsed = total_start.elapsed();
        log::info!(
            "✅ 修复完成 - load={}ms decode={}ms normalize={}ms fill={}ms encode={}ms total={}ms",
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            normalize_ms,
            fill_ms,
            encode_elapsed.as_millis(),
            total_elapsed.as_millis()
        );

        Ok(ProcessOutcome {
            width: output.width(),
            height: output.height(),
            png,
            report,
        })
    }

    /// 直接处理已解码的缓冲区，跳过加载与编解码。
    pub fn process_buffers(
        &self,
        image: &PixelBuffer,
        mask: &PixelBuffer,
    ) -> Result<(PixelBuffer, FillReport), InpaintError> {
        let config = self.config_snapshot()?;
        let (output, report, _, _) = Self::run_buffers(image.clone(), mask, &config)?;
        Ok((output, report))
    }

    fn run_buffers(
        mut image: PixelBuffer,
        mask: &PixelBuffer,
        config: &InpaintConfig,
    ) -> Result<(PixelBuffer, FillReport, u128, u128), InpaintError> {
        let normalize_start = Instant::now();
        let mask = normalize_mask(mask, image.width(), image.height(), config)?;
        let normalize_ms = normalize_start.elapsed().as_millis();

        let fill_start = Instant::now();
        let report = inpaint_in_place(&mut image, &mask, config.radius)?;
        let fill_ms = fill_start.elapsed().as_millis();

        log::info!(
            "🎨 填充完成 - 掩码像素: {} 填充: {} 退化: {} 外圈种子: {}",
            mask.masked_count(),
            report.filled,
            report.fallbacks,
            report.border_seeded
        );

        Ok((image, report, normalize_ms, fill_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inpaint::source::Channels;

    #[test]
    fn new_rejects_invalid_config() {
        let config = InpaintConfig {
            radius: 0,
            ..InpaintConfig::default()
        };

        assert!(matches!(
            InpaintHandler::new(config),
            Err(InpaintError::Config(_))
        ));
    }

    #[test]
    fn set_config_keeps_previous_on_failure() {
        let handler = InpaintHandler::new(InpaintConfig::default()).expect("handler init failed");

        handler.set_radius(5).expect("radius 5 is valid");
        let result = handler.set_radius(99);

        assert!(matches!(result, Err(InpaintError::Config(_))));
        assert_eq!(handler.config_snapshot().expect("snapshot").radius, 5);
    }

    #[test]
    fn process_buffers_resamples_small_mask() {
        let handler = InpaintHandler::new(InpaintConfig::default()).expect("handler init failed");
        let image = PixelBuffer::from_fn(40, 40, Channels::Rgb, |x, y| {
            if (16..24).contains(&x) && (16..24).contains(&y) {
                [0, 0, 0]
            } else {
                [180, 90, 30]
            }
        })
        .expect("image");
        let mask = PixelBuffer::from_fn(10, 10, Channels::Gray, |x, y| {
            if (3..7).contains(&x) && (3..7).contains(&y) {
                [255, 0, 0]
            } else {
                [0, 0, 0]
            }
        })
        .expect("mask");

        let (output, report) = handler
            .process_buffers(&image, &mask)
            .expect("process should succeed");

        assert!(report.filled > 0);
        assert_eq!(output.dimensions(), (40, 40));
        // 放大后的掩码完整覆盖黑色方块（含四角）
        for y in 16..24 {
            for x in 16..24 {
                assert_eq!(output.pixel(x, y), &[180, 90, 30], "pixel ({x}, {y})");
            }
        }
    }
}
