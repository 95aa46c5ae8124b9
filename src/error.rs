//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，入口层（CLI）统一返回 `Result<T, AppError>`，
//! 避免在各处散落 `.map_err(|e| e.to_string())`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `InpaintError` / `io::Error` / `serde_json::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于以 JSON 输出。

use serde::Serialize;

use crate::inpaint::InpaintError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 修复流水线错误（加载 / 解码 / 填充 / 编码）
    #[error("{0}")]
    Inpaint(#[from] InpaintError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 输出失败
    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inpaint_error_is_transparent() {
        let err: AppError = InpaintError::InvalidInput("尺寸不一致".to_string()).into();

        assert_eq!(err.to_string(), "输入无效：尺寸不一致");
        assert_eq!(
            serde_json::to_string(&err).expect("serialize"),
            "\"输入无效：尺寸不一致\""
        );
    }
}
