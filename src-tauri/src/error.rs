//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各子模块使用自己的 `thiserror` 枚举（`AcquireError`、`DecodeError`、
//! `ClipboardError`、`StorageError`）。其中只有 `StorageError` 会让命令失败，
//! 在命令层上转为 `AppError`；其余错误都在会话内转换为状态栏文案。
//!
//! 需要注意：识别流程中的大多数失败（类型不符、过大、未识别到二维码）
//! 并不走 `AppError`，而是写入状态栏（见 `status` 模块），命令本身返回成功。
//! `AppError` 只承载“命令无法完成”的情况。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `StorageError` 提供 `From` 转换。
//! - 实现 `Serialize` 将错误序列化为字符串，满足 Tauri IPC 要求。

use serde::Serialize;

use crate::history::StorageError;

/// 应用级统一错误类型
///
/// 所有 Tauri command 均返回此类型，确保前端收到一致的错误格式。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 历史记录读写失败
    #[error("历史记录存储失败: {0}")]
    History(#[from] StorageError),

    /// 存储目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),

    /// 文件选择对话框失败
    #[error("文件选择失败: {0}")]
    Dialog(String),

    /// 打开外部链接失败
    #[error("打开链接失败: {0}")]
    Shell(String),
}

/// Tauri IPC 要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
