//! # 获取阶段错误
//!
//! 错误消息即状态栏文案，直接展示给用户。

use crate::clipboard::ClipboardError;

/// 图片获取与校验错误。
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    /// 来源没有产生任何图片
    #[error("No image received.")]
    NoImage,

    /// 粘贴内容里没有图片条目
    #[error("Clipboard does not contain an image.")]
    NoImageInClipboard,

    /// 声明的媒体类型不是 `image/*`
    #[error("Unsupported file type.")]
    UnsupportedType(String),

    /// 超过体积上限
    #[error("Image too large (>{}MB).", mib(.limit))]
    TooLarge { size: u64, limit: u64 },

    /// 文件或粘贴数据无法读取
    #[error("Could not read the selected file.")]
    Unreadable(String),

    /// 主动读取剪贴板失败，调用方应提示用户手动粘贴
    #[error("Clipboard image unavailable: {0}")]
    ClipboardUnavailable(#[from] ClipboardError),
}

fn mib(bytes: &u64) -> u64 {
    *bytes / 1024 / 1024
}
