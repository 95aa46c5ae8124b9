//! # 水印修复模块（inpaint）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 解码 → 掩码归一化 → 距离场 → 填充 → 编码”按职责拆分为多个子模块，
//! 算法核心与入口层互不依赖：
//!
//! - `service`：可克隆的共享状态（`InpaintServiceState`），异步入口 + 超时 + 存活探针
//! - `handler`：编排整条处理流水线
//! - `loader`：负责字节/Base64/文件加载与安全校验
//! - `pipeline`：负责解码、像素限制、PNG 编码
//! - `mask`：掩码对齐尺寸与二值化
//! - `distance` / `frontier`：快速行进距离场与最小堆前沿
//! - `engine`：按距离顺序逐像素合成
//! - `config/error/source`：配置、错误、数据模型
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! main.rs（CLI 参数）
//!    ↓
//! service.rs（spawn_blocking + 超时）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积/签名校验）
//!    ├─ pipeline.rs（解码 + 像素限制）
//!    ├─ mask.rs（重采样 + 阈值）
//!    ├─ distance.rs（距离场 + 初始前沿）
//!    ├─ engine.rs（填充主循环）
//!    └─ pipeline.rs（PNG 编码）
//!    ↓
//! 返回 AppError 给调用方
//! ```
//!
//! ## 分层职责建议
//!
//! - 阈值、半径、滤镜等参数变更优先改 `config.rs`
//! - 流程顺序变更优先改 `handler.rs`
//! - 填充质量问题优先看 `engine.rs` 的权重与 `distance.rs` 的程函求解

mod config;
mod distance;
mod engine;
mod error;
mod frontier;
mod handler;
mod loader;
mod mask;
mod pipeline;
mod service;
mod source;

pub use config::{
    DEFAULT_INPAINT_RADIUS, DEFAULT_MASK_THRESHOLD, InpaintConfig, MAX_INPAINT_RADIUS,
    resize_filter_from_str, resize_filter_name,
};
pub use distance::{DistanceField, FastMarch, PixelState, build_distance_field};
pub use engine::{FillReport, fill, fill_with_hook, inpaint, inpaint_in_place};
pub use error::InpaintError;
pub use frontier::Frontier;
pub use handler::{InpaintHandler, ProcessOutcome};
pub use mask::normalize_mask;
pub use service::{HEALTH_MESSAGE, HealthStatus, InpaintServiceState};
pub use source::{Channels, ImageSource, Mask, PixelBuffer};
