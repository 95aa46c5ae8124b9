//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `PixelBuffer` 表示解码后的 8 位像素网格（1 或 3 通道）
//! - `Mask` 表示与图片等尺寸的严格二值掩码
//!
//! 两种网格都按行优先展开为一维数组，与距离场 / 像素状态共用同一套下标。

use std::path::PathBuf;

use image::{DynamicImage, GrayImage, RgbImage};

use super::InpaintError;

/// 图片输入来源。
pub enum ImageSource {
    /// 已在内存中的原始字节（例如上传表单字段）。
    Bytes(Vec<u8>),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 本地文件路径来源。
    FilePath(PathBuf),
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 像素通道布局。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Gray,
    Rgb,
}

impl Channels {
    /// 每个像素占用的样本数。
    pub fn count(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
        }
    }
}

/// 8 位像素缓冲区，行优先、通道交错存储。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: Channels,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// 创建全零缓冲区。
    pub fn new(width: u32, height: u32, channels: Channels) -> Result<Self, InpaintError> {
        let len = Self::expected_len(width, height, channels)?;
        Ok(Self {
            width,
            height,
            channels,
            data: vec![0; len],
        })
    }

    /// 从已有样本构建缓冲区，校验尺寸与长度一致。
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: Channels,
        data: Vec<u8>,
    ) -> Result<Self, InpaintError> {
        let expected = Self::expected_len(width, height, channels)?;
        if data.len() != expected {
            return Err(InpaintError::InvalidInput(format!(
                "像素数据长度异常：{}（期望：{}）",
                data.len(),
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// 按坐标生成缓冲区。
    pub fn from_fn<F>(
        width: u32,
        height: u32,
        channels: Channels,
        mut pixel: F,
    ) -> Result<Self, InpaintError>
    where
        F: FnMut(u32, u32) -> [u8; 3],
    {
        let mut buffer = Self::new(width, height, channels)?;
        let count = channels.count();
        for y in 0..height {
            for x in 0..width {
                let value = pixel(x, y);
                buffer.pixel_mut(x, y).copy_from_slice(&value[..count]);
            }
        }
        Ok(buffer)
    }

    /// 从解码结果转换：彩色图转 RGB（丢弃 alpha），灰度图保持单通道。
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, InpaintError> {
        let (width, height) = (image.width(), image.height());
        if image.color().has_color() {
            Self::from_raw(width, height, Channels::Rgb, image.to_rgb8().into_raw())
        } else {
            Self::from_raw(width, height, Channels::Gray, image.to_luma8().into_raw())
        }
    }

    /// 转换为 `image` 的动态图，用于编码或灰度化。
    pub fn to_dynamic(&self) -> Result<DynamicImage, InpaintError> {
        let data = self.data.clone();
        let image = match self.channels {
            Channels::Gray => GrayImage::from_raw(self.width, self.height, data)
                .map(DynamicImage::ImageLuma8),
            Channels::Rgb => {
                RgbImage::from_raw(self.width, self.height, data).map(DynamicImage::ImageRgb8)
            }
        };
        image.ok_or_else(|| InpaintError::Encode("像素缓冲长度与尺寸不一致".to_string()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// 全部样本（行优先、通道交错）。
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// 读取 (x, y) 处像素的全部通道。
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        self.pixel_at(y as usize * self.width as usize + x as usize)
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        self.pixel_at_mut(y as usize * self.width as usize + x as usize)
    }

    /// 按行优先下标读取像素。
    pub(crate) fn pixel_at(&self, index: usize) -> &[u8] {
        let count = self.channels.count();
        &self.data[index * count..(index + 1) * count]
    }

    pub(crate) fn pixel_at_mut(&mut self, index: usize) -> &mut [u8] {
        let count = self.channels.count();
        &mut self.data[index * count..(index + 1) * count]
    }

    fn expected_len(width: u32, height: u32, channels: Channels) -> Result<usize, InpaintError> {
        if width == 0 || height == 0 {
            return Err(InpaintError::InvalidInput(format!(
                "图片尺寸不能为 0：{}x{}",
                width, height
            )));
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(channels.count()))
            .ok_or_else(|| InpaintError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))
    }
}

/// 严格二值掩码，`true` 表示该像素需要合成。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Mask {
    /// 按坐标生成掩码。
    pub fn from_fn<F>(width: u32, height: u32, mut masked: F) -> Result<Self, InpaintError>
    where
        F: FnMut(u32, u32) -> bool,
    {
        if width == 0 || height == 0 {
            return Err(InpaintError::InvalidInput(format!(
                "掩码尺寸不能为 0：{}x{}",
                width, height
            )));
        }
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(masked(x, y));
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// 行优先展开的单元格。
    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }

    /// 需要修复的像素数量。
    pub fn masked_count(&self) -> usize {
        self.cells.iter().filter(|&&masked| masked).count()
    }

    /// 没有任何像素需要修复。
    pub fn is_clear(&self) -> bool {
        !self.cells.iter().any(|&masked| masked)
    }

    /// 所有像素都需要修复。
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&masked| masked)
    }
}
