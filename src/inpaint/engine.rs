//! # 填充引擎模块
//!
//! ## 设计思路
//!
//! 按距离场给出的顺序逐个合成掩码像素。每个像素只依赖已知或更早填充的像素，
//! 因此单次调用天然是串行的；并行只发生在多次独立调用之间。
//!
//! ## 实现思路
//!
//! 主循环（经典快速行进填充）：
//! 1. 从前沿取出距离最小的像素 `p`
//! 2. 更新 `p` 的四邻域：`Inside` 变为 `Band`，试探距离变小则重新入队
//! 3. 在 `(2R+1)²` 窗口内对已知像素加权平均，权重 = 方向 × 几何距离 × 等值线接近度
//! 4. `p` 标记为 `Known`，距离固定为出队时的值
//!
//! 窗口内没有可用像素时退化为八邻域均值，仍没有则保留原值。

use super::distance::{FastMarch, Grid, PixelState, build_distance_field, solve_eikonal};
use super::source::{Mask, PixelBuffer};
use super::{InpaintError, MAX_INPAINT_RADIUS};

/// 方向因子低于该值时视为垂直于梯度。
const DIRECTION_EPSILON: f32 = 0.01;
/// 垂直方向的最小权重，避免整窗权重归零。
const DIRECTION_FLOOR: f32 = 1.0e-6;
const MAX_CHANNELS: usize = 3;

/// 单次填充的统计信息。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct FillReport {
    /// 完成合成的像素数量。
    pub filled: usize,
    /// 前沿有效出队次数。
    pub frontier_pops: usize,
    /// 使用退化规则（八邻域均值或保留原值）的像素数量。
    pub fallbacks: usize,
    /// 是否以图像最外圈作为种子。
    pub border_seeded: bool,
}

/// 修复图片，返回新的缓冲区，输入保持不变。
pub fn inpaint(image: &PixelBuffer, mask: &Mask, radius: u32) -> Result<PixelBuffer, InpaintError> {
    let mut output = image.clone();
    inpaint_in_place(&mut output, mask, radius)?;
    Ok(output)
}

/// 原地修复图片。
///
/// 空掩码直接返回，图片保持逐字节不变。
pub fn inpaint_in_place(
    image: &mut PixelBuffer,
    mask: &Mask,
    radius: u32,
) -> Result<FillReport, InpaintError> {
    if image.dimensions() != mask.dimensions() {
        return Err(InpaintError::InvalidInput(format!(
            "掩码尺寸 {}x{} 与图片尺寸 {}x{} 不一致",
            mask.width(),
            mask.height(),
            image.width(),
            image.height()
        )));
    }
    if !(1..=MAX_INPAINT_RADIUS).contains(&radius) {
        return Err(InpaintError::InvalidInput(format!(
            "修复半径必须在 1~{} 之间（当前：{}）",
            MAX_INPAINT_RADIUS, radius
        )));
    }
    if mask.is_clear() {
        log::debug!("⏭️ 掩码为空，跳过修复");
        return Ok(FillReport::default());
    }

    let mut march = build_distance_field(mask, radius);
    fill(image, &mut march)
}

/// 消费距离场与前沿，按顺序填充全部掩码像素。
///
/// 修复半径取自 `march`。返回后 `march` 中不再有 `Band` / `Inside` 像素。
pub fn fill(image: &mut PixelBuffer, march: &mut FastMarch) -> Result<FillReport, InpaintError> {
    fill_with_hook(image, march, |_, _, _| {})
}

/// 与 [`fill`] 相同，每个像素完成时回调 `on_fill(x, y, t)`，`t` 为其最终到达时间。
///
/// 回调顺序即填充顺序，`t` 单调不减。
pub fn fill_with_hook<F>(
    image: &mut PixelBuffer,
    march: &mut FastMarch,
    mut on_fill: F,
) -> Result<FillReport, InpaintError>
where
    F: FnMut(u32, u32, f32),
{
    if image.dimensions() != (march.field.width(), march.field.height()) {
        return Err(InpaintError::InvalidInput(format!(
            "距离场尺寸 {}x{} 与图片尺寸 {}x{} 不一致",
            march.field.width(),
            march.field.height(),
            image.width(),
            image.height()
        )));
    }

    let FastMarch {
        grid,
        field,
        states,
        frontier,
        border_seeded,
        radius,
    } = march;
    let grid = *grid;
    let radius = *radius;
    let values = &mut field.values;

    let mut report = FillReport {
        border_seeded: *border_seeded,
        ..FillReport::default()
    };

    while let Some((index, t)) =
        frontier.pop_min(|i, d| states[i] == PixelState::Band && values[i] == d)
    {
        report.frontier_pops += 1;

        for neighbor in grid.neighbors4(index).into_iter().flatten() {
            if states[neighbor] == PixelState::Known {
                continue;
            }
            let trial = solve_eikonal(grid, states, values, neighbor);
            if trial < values[neighbor] {
                values[neighbor] = trial;
                states[neighbor] = PixelState::Band;
                frontier.push(neighbor, trial);
            }
        }

        if !synthesize(image, grid, states, values, index, radius) {
            report.fallbacks += 1;
        }

        states[index] = PixelState::Known;
        values[index] = t;
        report.filled += 1;

        let (x, y) = grid.coords(index);
        on_fill(x as u32, y as u32, t);
    }

    Ok(report)
}

/// 到达时间在 `index` 处的梯度（中心差分，单侧可用时退化为单侧差分）。
fn gradient(grid: Grid, states: &[PixelState], values: &[f32], index: usize) -> (f32, f32) {
    let t = values[index];
    let usable = |neighbor: Option<usize>| {
        neighbor
            .filter(|&n| states[n] != PixelState::Inside)
            .map(|n| values[n])
    };
    let axis = |prev: Option<usize>, next: Option<usize>| match (usable(prev), usable(next)) {
        (Some(a), Some(b)) => (b - a) * 0.5,
        (None, Some(b)) => b - t,
        (Some(a), None) => t - a,
        (None, None) => 0.0,
    };

    let [left, right, up, down] = grid.neighbors4(index);
    (axis(left, right), axis(up, down))
}

/// 合成单个像素；返回 `false` 表示使用了退化规则。
fn synthesize(
    image: &mut PixelBuffer,
    grid: Grid,
    states: &[PixelState],
    values: &[f32],
    index: usize,
    radius: u32,
) -> bool {
    let channels = image.channels().count();
    let t = values[index];
    let (gx, gy) = gradient(grid, states, values, index);
    let gradient_norm = (gx * gx + gy * gy).sqrt();

    let mut sums = [0.0f32; MAX_CHANNELS];
    let mut weight_sum = 0.0f32;
    let r = radius as isize;

    for dy in -r..=r {
        for dx in -r..=r {
            if dx == 0 && dy == 0 {
                continue;
            }
            let Some(sample) = grid.offset(index, dx, dy) else {
                continue;
            };
            if states[sample] != PixelState::Known {
                continue;
            }

            // 从采样点指向当前像素
            let (rx, ry) = (-dx as f32, -dy as f32);
            let length_sq = rx * rx + ry * ry;

            let direction = if gradient_norm > 0.0 {
                let cos = ((rx * gx + ry * gy) / (length_sq.sqrt() * gradient_norm)).abs();
                if cos <= DIRECTION_EPSILON {
                    DIRECTION_FLOOR
                } else {
                    cos
                }
            } else {
                1.0
            };
            let geometric = 1.0 / length_sq;
            let level = 1.0 / (1.0 + (t - values[sample]).abs());
            let weight = direction * geometric * level;

            for (sum, &value) in sums.iter_mut().zip(image.pixel_at(sample)) {
                *sum += weight * value as f32;
            }
            weight_sum += weight;
        }
    }

    if weight_sum > 0.0 {
        write_pixel(image.pixel_at_mut(index), &sums[..channels], weight_sum);
        return true;
    }

    // 退化：八邻域已知像素的算术平均
    let mut sums = [0.0f32; MAX_CHANNELS];
    let mut count = 0usize;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let Some(sample) = grid.offset(index, dx, dy) else {
                continue;
            };
            if sample == index || states[sample] != PixelState::Known {
                continue;
            }
            for (sum, &value) in sums.iter_mut().zip(image.pixel_at(sample)) {
                *sum += value as f32;
            }
            count += 1;
        }
    }
    if count > 0 {
        write_pixel(image.pixel_at_mut(index), &sums[..channels], count as f32);
    }
    false
}

fn write_pixel(pixel: &mut [u8], sums: &[f32], divisor: f32) {
    for (out, &sum) in pixel.iter_mut().zip(sums) {
        *out = (sum / divisor).round().clamp(0.0, 255.0) as u8;
    }
}
