//! # 水印去除工具：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 入口 (CLI / 异步调用方)                    │
//! │                                                          │
//! │  main.rs ── clap 参数 ── env_logger                      │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            库 (Rust)                             │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  └─ inpaint ──── 图片修复                                 │
//! │      ├─ service / handler   异步入口·编排·阶段耗时         │
//! │      ├─ loader / pipeline   加载·校验·解码·PNG 编码        │
//! │      ├─ mask                掩码重采样·二值化              │
//! │      ├─ distance / frontier 快速行进距离场                 │
//! │      └─ engine              逐像素加权合成                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，入口层的返回类型 |
//! | [`inpaint`] | 根据二值掩码，用周围已知像素填补被标记区域 |

pub mod error;
pub mod inpaint;
