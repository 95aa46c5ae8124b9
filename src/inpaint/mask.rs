//! # 掩码归一化模块
//!
//! ## 设计思路
//!
//! 上传的掩码可能是任意尺寸、单通道或 RGB。修复算法只接受与图片等尺寸、
//! 严格二值的掩码，边界必须清晰，不允许抗锯齿的“半掩码”。
//!
//! ## 实现思路
//!
//! 1. RGB 掩码先转为亮度单通道
//! 2. 尺寸与图片不一致时重采样（默认双线性，优先 `fast_image_resize`，失败回退 `image::imageops`）
//! 3. 按阈值二值化：亮度 `>=` 阈值即为需要修复

use fast_image_resize as fr;
use image::GrayImage;
use image::imageops::FilterType;

use super::source::{Channels, Mask, PixelBuffer};
use super::{InpaintConfig, InpaintError, resize_filter_name};

/// 将原始掩码对齐到 `width x height` 并二值化。输入不会被修改。
pub fn normalize_mask(
    mask: &PixelBuffer,
    width: u32,
    height: u32,
    config: &InpaintConfig,
) -> Result<Mask, InpaintError> {
    let gray = to_luminance(mask)?;

    let gray = if gray.dimensions() == (width, height) {
        gray
    } else {
        log::info!(
            "🧩 掩码尺寸与图片不一致，重采样：{}x{} -> {}x{}（filter={}）",
            gray.width(),
            gray.height(),
            width,
            height,
            resize_filter_name(config.mask_resize_filter)
        );
        resize_gray(gray, width, height, config.mask_resize_filter)
    };

    let threshold = config.mask_threshold;
    Mask::from_fn(width, height, |x, y| gray.get_pixel(x, y).0[0] >= threshold)
}

/// 单通道直接复用样本，RGB 走 `image` 的标准亮度换算。
fn to_luminance(mask: &PixelBuffer) -> Result<GrayImage, InpaintError> {
    match mask.channels() {
        Channels::Gray => GrayImage::from_raw(mask.width(), mask.height(), mask.as_raw().to_vec())
            .ok_or_else(|| InpaintError::InvalidInput("掩码像素数据长度异常".to_string())),
        Channels::Rgb => Ok(mask.to_dynamic()?.to_luma8()),
    }
}

fn resize_gray(gray: GrayImage, width: u32, height: u32, filter: FilterType) -> GrayImage {
    match resize_with_fast_image_resize(&gray, width, height, filter) {
        Ok(resized) => resized,
        Err(err) => {
            log::warn!(
                "⚠️ fast_image_resize 重采样失败，回退 image::imageops::resize：{}",
                err
            );
            image::imageops::resize(&gray, width, height, filter)
        }
    }
}

fn resize_with_fast_image_resize(
    gray: &GrayImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<GrayImage, InpaintError> {
    let src_image = fr::images::Image::from_vec_u8(
        gray.width(),
        gray.height(),
        gray.as_raw().clone(),
        fr::PixelType::U8,
    )
    .map_err(|e| InpaintError::Decode(format!("构建掩码源缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(width, height, fr::PixelType::U8);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(to_resize_alg(filter));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| InpaintError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    GrayImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| InpaintError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))
}

/// 最近邻保持掩码边界不引入中间灰度，其余滤镜走卷积。
fn to_resize_alg(filter: FilterType) -> fr::ResizeAlg {
    match filter {
        FilterType::Nearest => fr::ResizeAlg::Nearest,
        FilterType::Triangle => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
        FilterType::CatmullRom => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
        FilterType::Gaussian => fr::ResizeAlg::Convolution(fr::FilterType::Mitchell),
        FilterType::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
    }
}
