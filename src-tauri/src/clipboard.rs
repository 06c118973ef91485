//! 系统剪贴板访问
//!
//! # 设计思路
//!
//! 弹窗只需要两种剪贴板能力：读取一张图片（“粘贴”按钮）与写入纯文本（“复制”按钮）。
//! 用 `SystemClipboard` trait 隔离系统依赖，生产环境使用 `arboard`，测试注入假实现。
//!
//! # 实现思路
//!
//! - 每次调用都新建 `arboard::Clipboard`，不长期持有系统句柄。
//! - `arboard` 为阻塞调用，调用方负责放入 `spawn_blocking`。

/// 剪贴板中读取到的图片（RGBA 像素）。
#[derive(Debug, Clone)]
pub struct ClipboardImage {
    pub width: usize,
    pub height: usize,
    /// RGBA 字节数组（`width * height * 4`）。
    pub rgba: Vec<u8>,
}

/// 剪贴板错误。
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// 无法访问剪贴板（权限、桌面环境不支持等）
    #[error("无法访问剪贴板：{0}")]
    Unavailable(String),

    /// 剪贴板中没有图片
    #[error("剪贴板中没有图片")]
    NoImage,

    /// 写入被拒绝
    #[error("写入剪贴板失败：{0}")]
    Rejected(String),
}

/// 剪贴板能力抽象。
pub trait SystemClipboard: Send + Sync {
    /// 读取剪贴板中的图片。
    fn read_image(&self) -> Result<ClipboardImage, ClipboardError>;

    /// 写入纯文本。
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// 当前环境是否可以访问剪贴板。
    fn is_available(&self) -> bool;
}

/// 基于 `arboard` 的系统剪贴板实现。
#[derive(Debug, Default, Clone, Copy)]
pub struct ArboardClipboard;

impl ArboardClipboard {
    fn open() -> Result<arboard::Clipboard, ClipboardError> {
        arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

impl SystemClipboard for ArboardClipboard {
    fn read_image(&self) -> Result<ClipboardImage, ClipboardError> {
        let mut clipboard = Self::open()?;
        let image = clipboard.get_image().map_err(|e| match e {
            arboard::Error::ContentNotAvailable => ClipboardError::NoImage,
            other => ClipboardError::Unavailable(other.to_string()),
        })?;

        log::debug!("📋 读取剪贴板图片 - {}x{}", image.width, image.height);

        Ok(ClipboardImage {
            width: image.width,
            height: image.height,
            rgba: image.bytes.into_owned(),
        })
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = Self::open()?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Rejected(e.to_string()))
    }

    fn is_available(&self) -> bool {
        Self::open().is_ok()
    }
}
