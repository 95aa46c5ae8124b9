//! # 距离场构建模块
//!
//! ## 设计思路
//!
//! 使用快速行进法（Fast Marching）为掩码区域建立到达时间场，决定填充顺序：
//! - 已知像素：从掩码边界向外推进一段固定半径，记录为负距离（供权重计算参考）
//! - 掩码像素：距离为正，越靠近内部越晚被填充
//!
//! ## 实现思路
//!
//! 1. 按掩码分类 `Known` / `Inside`；全图被掩码覆盖时把图像最外圈提升为种子
//! 2. 以贴近掩码的已知像素为零距离，向外推进 `2R + 1`，结果取负写入距离场
//! 3. 与已知像素四邻接的掩码像素标记为 `Band`，用迎风差分求试探距离后入队
//!
//! 像素状态与距离场均为行优先一维数组，与像素缓冲区共用下标。

use super::frontier::Frontier;
use super::source::Mask;

/// 未到达像素的距离占位值。
pub(crate) const FAR_DISTANCE: f32 = 1.0e6;

/// 单个像素在行进过程中的分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelState {
    /// 原始已知像素，或已完成填充的像素。
    Known,
    /// 位于推进前沿、已有试探距离的掩码像素。
    Band,
    /// 尚未触及的掩码像素。
    Inside,
}

/// 行优先网格几何。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Grid {
    pub(crate) width: usize,
    pub(crate) height: usize,
}

impl Grid {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as usize,
            height: height as usize,
        }
    }

    pub(crate) fn len(self) -> usize {
        self.width * self.height
    }

    pub(crate) fn coords(self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// 相对偏移后的下标，越界返回 `None`。
    pub(crate) fn offset(self, index: usize, dx: isize, dy: isize) -> Option<usize> {
        let (x, y) = self.coords(index);
        let nx = x.checked_add_signed(dx).filter(|&nx| nx < self.width)?;
        let ny = y.checked_add_signed(dy).filter(|&ny| ny < self.height)?;
        Some(ny * self.width + nx)
    }

    /// 四邻域：左、右、上、下。
    pub(crate) fn neighbors4(self, index: usize) -> [Option<usize>; 4] {
        [
            self.offset(index, -1, 0),
            self.offset(index, 1, 0),
            self.offset(index, 0, -1),
            self.offset(index, 0, 1),
        ]
    }

    pub(crate) fn is_border(self, index: usize) -> bool {
        let (x, y) = self.coords(index);
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }
}

/// 有符号距离场。
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceField {
    width: u32,
    height: u32,
    pub(crate) values: Vec<f32>,
}

impl DistanceField {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// 距离场构建结果：填充引擎的全部输入状态。
#[derive(Debug)]
pub struct FastMarch {
    pub(crate) grid: Grid,
    pub(crate) field: DistanceField,
    pub(crate) states: Vec<PixelState>,
    pub(crate) frontier: Frontier,
    pub(crate) border_seeded: bool,
    pub(crate) radius: u32,
}

impl FastMarch {
    pub fn field(&self) -> &DistanceField {
        &self.field
    }

    pub fn states(&self) -> &[PixelState] {
        &self.states
    }

    pub fn state(&self, x: u32, y: u32) -> PixelState {
        self.states[y as usize * self.grid.width + x as usize]
    }

    /// 构建距离场时使用的修复半径，填充阶段沿用同一值。
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// 前沿中的条目数。
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// 全图被掩码覆盖时，是否把最外圈提升为已知种子。
    pub fn border_seeded(&self) -> bool {
        self.border_seeded
    }

    /// 仍未完成的掩码像素数量（`Band` + `Inside`）。
    pub fn pending(&self) -> usize {
        self.states
            .iter()
            .filter(|&&state| state != PixelState::Known)
            .count()
    }
}

/// 外推距离的截止半径：只有修复窗口可能访问到的已知像素需要精确值。
pub(crate) fn flood_limit(radius: u32) -> f32 {
    2.0 * radius as f32 + 1.0
}

/// 由掩码构建距离场与初始前沿。
pub fn build_distance_field(mask: &Mask, radius: u32) -> FastMarch {
    let grid = Grid::new(mask.width(), mask.height());
    let cells = mask.as_slice();

    let mut states: Vec<PixelState> = cells
        .iter()
        .map(|&masked| {
            if masked {
                PixelState::Inside
            } else {
                PixelState::Known
            }
        })
        .collect();

    let border_seeded = mask.is_full();
    if border_seeded {
        log::warn!(
            "⚠️ 掩码覆盖整张图片（{}x{}），以图像最外圈作为填充种子",
            grid.width,
            grid.height
        );
        for (index, state) in states.iter_mut().enumerate() {
            if grid.is_border(index) {
                *state = PixelState::Known;
            }
        }
    }

    let mut values: Vec<f32> = states
        .iter()
        .map(|&state| {
            if state == PixelState::Known {
                0.0
            } else {
                FAR_DISTANCE
            }
        })
        .collect();

    march_outward(grid, &states, &mut values, flood_limit(radius));

    let seeds: Vec<usize> = (0..grid.len())
        .filter(|&index| {
            states[index] == PixelState::Inside
                && grid
                    .neighbors4(index)
                    .into_iter()
                    .flatten()
                    .any(|neighbor| states[neighbor] == PixelState::Known)
        })
        .collect();

    // 初始试探值只依赖已知像素，与种子遍历顺序无关
    let trials: Vec<(usize, f32)> = seeds
        .iter()
        .map(|&index| (index, solve_eikonal(grid, &states, &values, index)))
        .collect();

    let mut frontier = Frontier::with_capacity(seeds.len() * 2);
    for (index, trial) in trials {
        states[index] = PixelState::Band;
        values[index] = trial;
        frontier.push(index, trial);
    }

    log::debug!(
        "🧭 距离场初始化完成 - 尺寸: {}x{} 掩码像素: {} 初始前沿: {}",
        grid.width,
        grid.height,
        states.iter().filter(|&&s| s != PixelState::Known).count(),
        seeds.len()
    );

    FastMarch {
        grid,
        field: DistanceField {
            width: mask.width(),
            height: mask.height(),
            values,
        },
        states,
        frontier,
        border_seeded,
        radius,
    }
}

/// 从掩码边界向已知区域推进，写入负距离。
///
/// 贴近掩码的已知像素距离为 0；超过 `limit` 后停止，剩余像素保留最后一次
/// 试探值或 `-FAR_DISTANCE`。
fn march_outward(grid: Grid, states: &[PixelState], values: &mut [f32], limit: f32) {
    // 外推阶段单独分类：掩码像素永远不可用，只在已知像素之间推进
    let mut outer = vec![PixelState::Inside; grid.len()];
    let mut distance = vec![FAR_DISTANCE; grid.len()];
    let mut frontier = Frontier::new();

    for index in 0..grid.len() {
        if states[index] != PixelState::Known {
            continue;
        }
        let touches_mask = grid
            .neighbors4(index)
            .into_iter()
            .flatten()
            .any(|neighbor| states[neighbor] != PixelState::Known);
        if touches_mask {
            outer[index] = PixelState::Band;
            distance[index] = 0.0;
            frontier.push(index, 0.0);
        }
    }

    while let Some((index, t)) =
        frontier.pop_min(|i, d| outer[i] == PixelState::Band && distance[i] == d)
    {
        outer[index] = PixelState::Known;
        if t > limit {
            break;
        }
        for neighbor in grid.neighbors4(index).into_iter().flatten() {
            if states[neighbor] != PixelState::Known || outer[neighbor] == PixelState::Known {
                continue;
            }
            let trial = solve_eikonal(grid, &outer, &distance, neighbor);
            if trial < distance[neighbor] {
                distance[neighbor] = trial;
                outer[neighbor] = PixelState::Band;
                frontier.push(neighbor, trial);
            }
        }
    }

    for index in 0..grid.len() {
        if states[index] == PixelState::Known {
            values[index] = -distance[index];
        }
    }
}

/// 迎风差分求解程函方程，取四个象限中的最小解。
///
/// 只使用 `Known` / `Band` 邻居；两个轴都有值时用二次解，只有一个轴时退化为线性解。
pub(crate) fn solve_eikonal(
    grid: Grid,
    states: &[PixelState],
    values: &[f32],
    index: usize,
) -> f32 {
    let usable = |neighbor: Option<usize>| {
        neighbor
            .filter(|&n| states[n] != PixelState::Inside)
            .map(|n| values[n])
    };

    let [left, right, up, down] = grid.neighbors4(index);
    let mut best = FAR_DISTANCE;
    for horizontal in [left, right] {
        for vertical in [up, down] {
            best = best.min(solve_pair(usable(horizontal), usable(vertical)));
        }
    }
    best
}

fn solve_pair(a: Option<f32>, b: Option<f32>) -> f32 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let diff = a - b;
            if diff.abs() >= 1.0 {
                1.0 + a.min(b)
            } else {
                (a + b + (2.0 - diff * diff).sqrt()) * 0.5
            }
        }
        (Some(a), None) | (None, Some(a)) => 1.0 + a,
        (None, None) => FAR_DISTANCE,
    }
}
