//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载修复链路中的所有错误来源（加载 / 解码 / 参数 / 编码 / 超时），
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 算法核心（掩码归一化、距离场、填充引擎）对合法输入没有可恢复错误，
//! 只有输入尺寸不一致或半径越界会以 `InvalidInput` 拒绝。

/// 修复流程统一错误类型。
///
/// 该类型会在入口层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum InpaintError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("输入无效：{0}")]
    InvalidInput(String),

    #[error("配置错误：{0}")]
    Config(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("任务错误：{0}")]
    Task(String),
}
