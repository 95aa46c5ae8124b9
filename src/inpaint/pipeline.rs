//! # 解码与编码流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 像素缓冲”与“像素缓冲 → PNG 字节”集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 拒绝零面积图片，按像素上限快速拒绝
//! 3. 完整解码并转换为 `PixelBuffer`（彩色 → RGB，灰度 → 单通道）
//! 4. 输出统一编码为无损 PNG

use image::{GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

use super::source::{PixelBuffer, RawImageData};
use super::{InpaintConfig, InpaintError, InpaintHandler};

impl InpaintHandler {
    /// 将原始字节解码为像素缓冲区。
    pub(crate) fn decode_to_buffer(
        &self,
        raw: RawImageData,
        config: &InpaintConfig,
    ) -> Result<PixelBuffer, InpaintError> {
        let _format: ImageFormat = image::guess_format(&raw.bytes)
            .map_err(|e| InpaintError::InvalidFormat(format!("不支持的图片格式：{}", e)))?;

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        self.validate_pixel_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| InpaintError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        self.validate_pixel_limits(config, width, height)?;

        let buffer = PixelBuffer::from_dynamic(&decoded)?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{} 通道: {:?}",
            raw.source_hint,
            width,
            height,
            buffer.channels()
        );

        Ok(buffer)
    }

    /// 将像素缓冲区编码为 PNG 字节。
    pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, InpaintError> {
        let image = buffer.to_dynamic()?;
        let mut cursor = Cursor::new(Vec::new());
        image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| InpaintError::Encode(format!("PNG 编码失败：{}", e)))?;
        Ok(cursor.into_inner())
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), InpaintError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| InpaintError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| InpaintError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量：零面积直接拒绝，超过配置上限同样拒绝。
    fn validate_pixel_limits(
        &self,
        config: &InpaintConfig,
        width: u32,
        height: u32,
    ) -> Result<(), InpaintError> {
        if width == 0 || height == 0 {
            return Err(InpaintError::InvalidInput(format!(
                "图片尺寸不能为 0：{}x{}",
                width, height
            )));
        }

        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| InpaintError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(InpaintError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inpaint::source::Channels;
    use image::{DynamicImage, ImageBuffer, Rgba};

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x % 255) as u8;
            let g = (y % 255) as u8;
            let b = ((x + y) % 255) as u8;
            Rgba([r, g, b, 255])
        });

        let dyn_img = DynamicImage::ImageRgba8(img);
        let mut cursor = Cursor::new(Vec::new());
        dyn_img
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn decode_rgba_png_into_rgb_buffer() {
        let handler = InpaintHandler::new(InpaintConfig::default()).expect("handler init failed");
        let config = handler.config_snapshot().expect("config snapshot failed");

        let buffer = handler
            .decode_to_buffer(
                RawImageData {
                    bytes: create_png_bytes(64, 48),
                    source_hint: "test",
                },
                &config,
            )
            .expect("decode pipeline should succeed");

        assert_eq!(buffer.dimensions(), (64, 48));
        assert_eq!(buffer.channels(), Channels::Rgb);
        assert_eq!(buffer.pixel(10, 20), &[10, 20, 30]);
    }

    #[test]
    fn stress_rejects_too_many_pixels() {
        let config = InpaintConfig {
            max_decoded_pixels: 1_000,
            ..InpaintConfig::default()
        };
        let handler = InpaintHandler::new(config).expect("handler init failed");
        let config = handler.config_snapshot().expect("config snapshot failed");

        let result = handler.decode_to_buffer(
            RawImageData {
                bytes: create_png_bytes(100, 100),
                source_hint: "test",
            },
            &config,
        );

        assert!(matches!(result, Err(InpaintError::ResourceLimit(_))));
    }

    #[test]
    fn encode_png_round_trips_gray_buffer() {
        let buffer =
            PixelBuffer::from_fn(5, 3, Channels::Gray, |x, y| [(x * 10 + y) as u8, 0, 0]).unwrap();

        let png = InpaintHandler::encode_png(&buffer).expect("encode should succeed");
        let decoded = image::load_from_memory(&png).expect("png should decode");

        assert_eq!(decoded.to_luma8().into_raw(), buffer.as_raw());
    }
}
