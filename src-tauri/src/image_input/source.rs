//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `BlobCandidate` 表示已知声明类型与体积、但尚未读取内容的候选
//! - `ImageBlob` 表示已通过校验、可交给识别流水线的字节

use std::path::PathBuf;

use serde::Deserialize;

/// 前端粘贴事件中的一个条目。
#[derive(Debug, Clone, Deserialize)]
pub struct PastedItem {
    /// 条目声明的媒体类型，如 `image/png`。
    pub mime_type: String,
    /// Data URL 或纯 Base64；浏览器无法取得文件内容时为空。
    #[serde(default)]
    pub data: Option<String>,
}

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 粘贴事件（文档级或拖放区域内）。
    Paste(Vec<PastedItem>),
    /// 拖放的文件，只使用第一个。
    Drop(Vec<PathBuf>),
    /// 文件选择器的结果，用户取消时为 `None`。
    FilePicker(Option<PathBuf>),
    /// 主动读取系统剪贴板。
    ClipboardRead,
}

impl ImageSource {
    /// 来源标识（用于日志与诊断）。
    pub fn origin(&self) -> &'static str {
        match self {
            Self::Paste(_) => "paste",
            Self::Drop(_) => "drop",
            Self::FilePicker(_) => "file",
            Self::ClipboardRead => "clipboard",
        }
    }
}

/// 候选内容的载体，`materialize` 时才真正读取。
#[derive(Debug)]
pub(crate) enum Payload {
    Base64(String),
    File(PathBuf),
    Bytes(Vec<u8>),
}

/// 归一化后的候选图片。
#[derive(Debug)]
pub(crate) struct BlobCandidate {
    pub(crate) media_type: String,
    pub(crate) declared_size: u64,
    pub(crate) payload: Payload,
    pub(crate) origin: &'static str,
}

/// 已通过校验的图片字节。
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub media_type: String,
    /// 来源提示（用于日志与诊断）。
    pub origin: &'static str,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            origin: "memory",
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
