//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（内存字节 / Base64 / 本地文件）的原始字节加载，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 字节：体积限制 + 文件签名。
//! - Base64：格式解析 + 解码前体积估算 + 解码后体积限制。
//! - 文件：存在性 + metadata 体积限制 + 读取。

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::source::{ImageSource, RawImageData};
use super::{InpaintConfig, InpaintError, InpaintHandler};

impl InpaintHandler {
    /// 按来源加载原始字节。
    pub(super) fn load_source(
        &self,
        source: ImageSource,
        config: &InpaintConfig,
    ) -> Result<RawImageData, InpaintError> {
        match source {
            ImageSource::Bytes(bytes) => self.load_from_bytes(bytes, config),
            ImageSource::Base64(data) => self.load_from_base64(&data, config),
            ImageSource::FilePath(path) => self.load_from_file(&path, config),
        }
    }

    /// 校验内存中的原始字节。
    pub(super) fn load_from_bytes(
        &self,
        bytes: Vec<u8>,
        config: &InpaintConfig,
    ) -> Result<RawImageData, InpaintError> {
        if bytes.len() as u64 > config.max_file_size {
            return Err(InpaintError::ResourceLimit(format!(
                "上传内容过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "bytes",
        })
    }

    /// 从 Base64 字符串加载图片原始字节。
    pub(super) fn load_from_base64(
        &self,
        data: &str,
        config: &InpaintConfig,
    ) -> Result<RawImageData, InpaintError> {
        log::info!("📝 开始处理 base64 图片");

        let bytes = Self::parse_base64_with_limit(data, config.max_file_size)?;

        if bytes.len() as u64 > config.max_file_size {
            return Err(InpaintError::ResourceLimit(format!(
                "Base64 解码后体积过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    /// 从本地路径加载图片原始字节。
    pub(super) fn load_from_file(
        &self,
        path: &Path,
        config: &InpaintConfig,
    ) -> Result<RawImageData, InpaintError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(InpaintError::FileSystem(format!(
                "文件不存在：{}",
                path.display()
            )));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| InpaintError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if metadata.len() > config.max_file_size {
            return Err(InpaintError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| InpaintError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, InpaintError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| InpaintError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| InpaintError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    /// 解析 Base64 输入（支持 Data URL / 纯 Base64），解码前按长度估算体积。
    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, InpaintError> {
        let normalized = data.trim();

        let payload = if normalized.starts_with("data:image/") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| InpaintError::InvalidFormat("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(payload)?;
        if estimated_len > max_file_size {
            return Err(InpaintError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| InpaintError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 通过文件签名（magic bytes）校验输入是否为图片。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), InpaintError> {
        if bytes.is_empty() {
            return Err(InpaintError::InvalidFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| InpaintError::InvalidFormat("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(InpaintError::InvalidFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_fn(4, 4, |x, _| Luma([x as u8 * 60]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn load_from_base64_rejects_non_image_payload() {
        let handler = InpaintHandler::new(InpaintConfig::default()).expect("handler init failed");
        let config = InpaintConfig::default();

        let result = handler.load_from_base64("SGVsbG8=", &config);

        assert!(matches!(result, Err(InpaintError::InvalidFormat(_))));
    }

    #[test]
    fn load_from_base64_accepts_data_url() {
        let handler = InpaintHandler::new(InpaintConfig::default()).expect("handler init failed");
        let png = png_bytes();
        let data_url = format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(&png));

        let raw = handler
            .load_from_base64(&data_url, &InpaintConfig::default())
            .expect("data url should load");

        assert_eq!(raw.bytes, png);
        assert_eq!(raw.source_hint, "base64");
    }

    #[test]
    fn parse_base64_with_limit_rejects_large_payload_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = InpaintHandler::parse_base64_with_limit(&huge, 32);

        assert!(matches!(result, Err(InpaintError::ResourceLimit(_))));
    }

    #[test]
    fn load_from_bytes_enforces_size_limit() {
        let handler = InpaintHandler::new(InpaintConfig::default()).expect("handler init failed");
        let config = InpaintConfig {
            max_file_size: 16,
            ..InpaintConfig::default()
        };

        let result = handler.load_from_bytes(png_bytes(), &config);

        assert!(matches!(result, Err(InpaintError::ResourceLimit(_))));
    }

    #[test]
    fn load_from_file_reports_missing_path() {
        let handler = InpaintHandler::new(InpaintConfig::default()).expect("handler init failed");

        let result = handler.load_from_file(
            Path::new("/definitely/not/here/mask.png"),
            &InpaintConfig::default(),
        );

        assert!(matches!(result, Err(InpaintError::FileSystem(_))));
    }

    #[test]
    fn load_from_file_reads_png() {
        let handler = InpaintHandler::new(InpaintConfig::default()).expect("handler init failed");
        let path = std::env::temp_dir().join(format!(
            "watermark-inpaint-loader-{}.png",
            std::process::id()
        ));
        std::fs::write(&path, png_bytes()).expect("write temp file");

        let raw = handler.load_from_file(&path, &InpaintConfig::default());
        let _ = std::fs::remove_file(&path);

        assert_eq!(raw.expect("file should load").source_hint, "file");
    }
}
