//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调参数”集中到 `InpaintConfig`：二值化阈值、修复半径、掩码重采样滤镜，
//! 以及入口层的体积 / 像素 / 超时上限。算法内部不出现魔法数字。
//!
//! ## 实现思路
//!
//! - `Default` 提供与原始服务一致的参数（阈值 127、半径 3、双线性重采样）。
//! - `validate` 在处理器创建与运行时更新时统一校验。
//! - `resize_filter_from_str` / `resize_filter_name` 负责滤镜名与枚举互转（供 CLI 使用）。

use image::imageops::FilterType;

use super::InpaintError;

/// 默认二值化阈值（0~255，`>=` 视为需要修复）。
pub const DEFAULT_MASK_THRESHOLD: u8 = 127;
/// 默认修复邻域半径。
pub const DEFAULT_INPAINT_RADIUS: u32 = 3;
/// 允许的最大修复邻域半径。
pub const MAX_INPAINT_RADIUS: u32 = 16;

/// 修复流程配置。
#[derive(Debug, Clone, PartialEq)]
pub struct InpaintConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 掩码二值化阈值。
    pub mask_threshold: u8,
    /// 合成单个像素时采样的方形窗口半径。
    pub radius: u32,
    /// 掩码与图片尺寸不一致时使用的重采样滤镜。
    pub mask_resize_filter: FilterType,
    /// 单次异步处理允许的总耗时（毫秒）。
    pub process_timeout_ms: u64,
}

impl Default for InpaintConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            mask_threshold: DEFAULT_MASK_THRESHOLD,
            radius: DEFAULT_INPAINT_RADIUS,
            mask_resize_filter: FilterType::Triangle,
            process_timeout_ms: 60_000,
        }
    }
}

impl InpaintConfig {
    /// 校验参数范围。
    pub fn validate(&self) -> Result<(), InpaintError> {
        if !(1..=MAX_INPAINT_RADIUS).contains(&self.radius) {
            return Err(InpaintError::Config(format!(
                "radius 必须在 1~{} 之间（当前：{}）",
                MAX_INPAINT_RADIUS, self.radius
            )));
        }
        if self.max_file_size == 0 {
            return Err(InpaintError::Config("max_file_size 不能为 0".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(InpaintError::Config("max_decoded_pixels 不能为 0".to_string()));
        }
        if !(100..=600_000).contains(&self.process_timeout_ms) {
            return Err(InpaintError::Config(
                "process_timeout_ms 必须在 100~600000 毫秒之间".to_string(),
            ));
        }
        Ok(())
    }
}

/// 从外部字符串解析重采样滤镜。
///
/// # 示例
/// ```rust
/// use watermark_inpaint::inpaint::{resize_filter_from_str, resize_filter_name};
///
/// let filter = resize_filter_from_str("bilinear").unwrap();
/// assert_eq!(resize_filter_name(filter), "bilinear");
/// ```
pub fn resize_filter_from_str(name: &str) -> Result<FilterType, InpaintError> {
    match name.trim().to_lowercase().as_str() {
        "nearest" => Ok(FilterType::Nearest),
        "bilinear" | "triangle" => Ok(FilterType::Triangle),
        "catmullrom" | "catmull-rom" => Ok(FilterType::CatmullRom),
        "gaussian" => Ok(FilterType::Gaussian),
        "lanczos3" => Ok(FilterType::Lanczos3),
        other => Err(InpaintError::Config(format!(
            "未知重采样滤镜：{}（可选：nearest / bilinear / catmullrom / gaussian / lanczos3）",
            other
        ))),
    }
}

/// 将滤镜输出为稳定字符串，供日志与 CLI 展示。
pub fn resize_filter_name(filter: FilterType) -> &'static str {
    match filter {
        FilterType::Nearest => "nearest",
        FilterType::Triangle => "bilinear",
        FilterType::CatmullRom => "catmullrom",
        FilterType::Gaussian => "gaussian",
        FilterType::Lanczos3 => "lanczos3",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_service_constants() {
        let config = InpaintConfig::default();

        assert_eq!(config.mask_threshold, 127);
        assert_eq!(config.radius, 3);
        assert_eq!(config.mask_resize_filter, FilterType::Triangle);
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn validate_rejects_out_of_range_radius() {
        let mut config = InpaintConfig::default();
        config.radius = 0;
        assert!(matches!(config.validate(), Err(InpaintError::Config(_))));

        config.radius = MAX_INPAINT_RADIUS + 1;
        assert!(matches!(config.validate(), Err(InpaintError::Config(_))));

        config.radius = MAX_INPAINT_RADIUS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_invalid_timeout() {
        let mut config = InpaintConfig::default();
        config.process_timeout_ms = 10;

        assert!(matches!(config.validate(), Err(InpaintError::Config(_))));
    }

    #[test]
    fn resize_filter_parser_accepts_aliases() {
        assert_eq!(resize_filter_from_str(" Nearest ").unwrap(), FilterType::Nearest);
        assert_eq!(resize_filter_from_str("triangle").unwrap(), FilterType::Triangle);
        assert_eq!(resize_filter_from_str("catmull-rom").unwrap(), FilterType::CatmullRom);
        assert!(matches!(
            resize_filter_from_str("bicubic"),
            Err(InpaintError::Config(_))
        ));
    }
}
