//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `InpaintServiceState` 作为可克隆的共享状态，替代全局单例函数。
//! 生命周期由 `main.rs` 统一管理，测试可创建独立实例。
//!
//! ## 实现思路
//!
//! 修复是纯 CPU 计算，单次调用内部串行：
//! - `process_source`：放到 `spawn_blocking` 执行，整体受 `process_timeout_ms` 约束
//! - `health`：固定存活探针
//! - `set_mask_filter` / `config`：运行时读写配置

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::handler::ProcessOutcome;
use super::{ImageSource, InpaintConfig, InpaintError, InpaintHandler, resize_filter_from_str};

/// 存活探针的固定消息。
pub const HEALTH_MESSAGE: &str = "Watermark Removal API is running";

/// 存活探针返回体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub message: &'static str,
}

/// 修复服务状态。
#[derive(Clone)]
pub struct InpaintServiceState {
    handler: Arc<InpaintHandler>,
}

impl InpaintServiceState {
    /// 使用默认配置创建服务状态。
    ///
    /// # 示例
    /// ```rust
    /// use watermark_inpaint::inpaint::InpaintServiceState;
    ///
    /// let service = InpaintServiceState::new()?;
    /// assert_eq!(service.health().message, "Watermark Removal API is running");
    /// # Ok::<(), watermark_inpaint::inpaint::InpaintError>(())
    /// ```
    pub fn new() -> Result<Self, InpaintError> {
        Self::with_config(InpaintConfig::default())
    }

    /// 使用自定义配置创建服务状态。
    pub fn with_config(config: InpaintConfig) -> Result<Self, InpaintError> {
        let handler = InpaintHandler::new(config)?;
        Ok(Self {
            handler: Arc::new(handler),
        })
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            message: HEALTH_MESSAGE,
        }
    }

    /// 执行完整处理流程：加载→解码→归一化→填充→编码。
    ///
    /// 计算在阻塞线程池中进行；超时后立即返回 `Timeout`，后台任务自然结束。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use watermark_inpaint::inpaint::{ImageSource, InpaintServiceState};
    ///
    /// # async fn demo() -> Result<(), watermark_inpaint::inpaint::InpaintError> {
    /// let service = InpaintServiceState::new()?;
    /// let outcome = service
    ///     .process_source(
    ///         ImageSource::FilePath("photo.png".into()),
    ///         ImageSource::FilePath("mask.png".into()),
    ///     )
    ///     .await?;
    /// println!("{} bytes", outcome.png.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn process_source(
        &self,
        image: ImageSource,
        mask: ImageSource,
    ) -> Result<ProcessOutcome, InpaintError> {
        let config = self.handler.config_snapshot()?;
        let timeout = Duration::from_millis(config.process_timeout_ms);
        let handler = Arc::clone(&self.handler);

        let task =
            tokio::task::spawn_blocking(move || handler.process_with_config(image, mask, &config));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(InpaintError::Task(format!(
                "修复任务异常退出：{}",
                join_err
            ))),
            Err(_) => {
                log::warn!("⏱️ 修复超时（{}ms）", timeout.as_millis());
                Err(InpaintError::Timeout(format!(
                    "修复超过 {}ms 未完成",
                    timeout.as_millis()
                )))
            }
        }
    }

    /// 按名称设置掩码重采样滤镜（如 `nearest` / `bilinear`）。
    pub fn set_mask_filter(&self, name: &str) -> Result<(), InpaintError> {
        let filter = resize_filter_from_str(name)?;
        let mut config = self.handler.config_snapshot()?;
        config.mask_resize_filter = filter;
        self.handler.set_config(config)
    }

    pub fn set_config(&self, config: InpaintConfig) -> Result<(), InpaintError> {
        self.handler.set_config(config)
    }

    pub fn config(&self) -> Result<InpaintConfig, InpaintError> {
        self.handler.config_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::imageops::FilterType;

    #[test]
    fn health_returns_fixed_message() {
        let service = InpaintServiceState::new().expect("service init failed");

        let json = serde_json::to_string(&service.health()).expect("serialize health");

        assert_eq!(json, r#"{"message":"Watermark Removal API is running"}"#);
    }

    #[test]
    fn set_mask_filter_parses_names() {
        let service = InpaintServiceState::new().expect("service init failed");

        service.set_mask_filter("nearest").expect("nearest is valid");
        assert_eq!(
            service.config().expect("config").mask_resize_filter,
            FilterType::Nearest
        );

        assert!(matches!(
            service.set_mask_filter("cubic-ish"),
            Err(InpaintError::Config(_))
        ));
    }

    #[tokio::test]
    async fn process_source_surfaces_load_errors() {
        let service = InpaintServiceState::new().expect("service init failed");

        let result = service
            .process_source(
                ImageSource::Bytes(b"not an image".to_vec()),
                ImageSource::Bytes(Vec::new()),
            )
            .await;

        assert!(matches!(result, Err(InpaintError::InvalidFormat(_))));
    }
}
