//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源的候选归一化，并在“尽可能早”的阶段执行输入校验：
//! 类型和体积都基于声明值判断，文件内容在校验通过后才读取。
//!
//! ## 实现思路
//!
//! - 粘贴：取第一个 `image/*` 条目；Base64 的解码后体积按长度精确计算。
//! - 文件（拖放 / 选择器）：类型按扩展名声明，扩展名无法识别时再做文件签名探测；
//!   体积取自 metadata。
//! - 剪贴板：RGBA 像素编码为 PNG 后作为 `image/png` 候选。

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use image::{ImageFormat, RgbaImage};

use super::source::{BlobCandidate, ImageBlob, ImageSource, PastedItem, Payload};
use super::AcquireError;
use crate::clipboard::{ClipboardImage, SystemClipboard};
use crate::config::PopupConfig;

/// 获取图片：归一化 → 校验 → 读取。
///
/// # 示例
/// ```rust,no_run
/// use qr_paste::clipboard::ArboardClipboard;
/// use qr_paste::config::PopupConfig;
/// use qr_paste::image_input::{acquire, ImageSource};
///
/// let source = ImageSource::FilePicker(Some("/tmp/code.png".into()));
/// let blob = acquire(source, &PopupConfig::default(), &ArboardClipboard)?;
/// # Ok::<(), qr_paste::image_input::AcquireError>(())
/// ```
pub fn acquire(
    source: ImageSource,
    config: &PopupConfig,
    clipboard: &dyn SystemClipboard,
) -> Result<ImageBlob, AcquireError> {
    let candidate = load_candidate(source, clipboard)?;
    let candidate = validate_candidate(candidate, config)?;
    materialize(candidate, config)
}

/// 按来源归一化为候选；`Ok(None)` 表示来源没有产生任何文件。
pub(crate) fn load_candidate(
    source: ImageSource,
    clipboard: &dyn SystemClipboard,
) -> Result<Option<BlobCandidate>, AcquireError> {
    match source {
        ImageSource::Paste(items) => paste_candidate(items),
        ImageSource::Drop(paths) => match paths.into_iter().next() {
            Some(path) => file_candidate(path, "drop").map(Some),
            None => Ok(None),
        },
        ImageSource::FilePicker(path) => match path {
            Some(path) => file_candidate(path, "file").map(Some),
            None => Ok(None),
        },
        ImageSource::ClipboardRead => {
            let image = clipboard.read_image()?;
            clipboard_candidate(image).map(Some)
        }
    }
}

/// 按顺序校验，首个失败即返回。
pub(crate) fn validate_candidate(
    candidate: Option<BlobCandidate>,
    config: &PopupConfig,
) -> Result<BlobCandidate, AcquireError> {
    let candidate = candidate.ok_or(AcquireError::NoImage)?;

    if !candidate.media_type.starts_with("image/") {
        return Err(AcquireError::UnsupportedType(candidate.media_type));
    }

    if candidate.declared_size > config.max_file_size {
        return Err(AcquireError::TooLarge {
            size: candidate.declared_size,
            limit: config.max_file_size,
        });
    }

    Ok(candidate)
}

/// 读取候选的完整字节，并以实际长度复核体积。
fn materialize(candidate: BlobCandidate, config: &PopupConfig) -> Result<ImageBlob, AcquireError> {
    let bytes = match candidate.payload {
        Payload::Base64(data) => general_purpose::STANDARD
            .decode(data.as_bytes())
            .map_err(|e| AcquireError::Unreadable(format!("Base64 解码失败：{}", e)))?,
        Payload::File(path) => fs::read(&path)
            .map_err(|e| AcquireError::Unreadable(format!("无法读取图片文件 {}：{}", path.display(), e)))?,
        Payload::Bytes(bytes) => bytes,
    };

    let size = bytes.len() as u64;
    if size > config.max_file_size {
        return Err(AcquireError::TooLarge {
            size,
            limit: config.max_file_size,
        });
    }

    log::info!(
        "📥 已获取图片 - 来源: {} 类型: {} 体积: {} bytes",
        candidate.origin,
        candidate.media_type,
        size
    );

    Ok(ImageBlob {
        bytes,
        media_type: candidate.media_type,
        origin: candidate.origin,
    })
}

fn paste_candidate(items: Vec<PastedItem>) -> Result<Option<BlobCandidate>, AcquireError> {
    let item = items
        .into_iter()
        .find(|item| item.mime_type.starts_with("image/"))
        .ok_or(AcquireError::NoImageInClipboard)?;

    let Some(data) = item.data else {
        return Ok(None);
    };

    let encoded = strip_data_url(&data)?;
    Ok(Some(BlobCandidate {
        media_type: item.mime_type,
        declared_size: base64_decoded_len(encoded),
        payload: Payload::Base64(encoded.to_string()),
        origin: "paste",
    }))
}

fn file_candidate(path: PathBuf, origin: &'static str) -> Result<BlobCandidate, AcquireError> {
    let metadata = fs::metadata(&path)
        .map_err(|e| AcquireError::Unreadable(format!("无法读取文件信息 {}：{}", path.display(), e)))?;

    if !metadata.is_file() {
        return Err(AcquireError::Unreadable(format!("不是文件：{}", path.display())));
    }

    Ok(BlobCandidate {
        media_type: declared_media_type(&path),
        declared_size: metadata.len(),
        payload: Payload::File(path),
        origin,
    })
}

fn clipboard_candidate(image: ClipboardImage) -> Result<BlobCandidate, AcquireError> {
    let width = u32::try_from(image.width)
        .map_err(|_| AcquireError::Unreadable("剪贴板图片宽度溢出".to_string()))?;
    let height = u32::try_from(image.height)
        .map_err(|_| AcquireError::Unreadable("剪贴板图片高度溢出".to_string()))?;

    let rgba = RgbaImage::from_raw(width, height, image.rgba)
        .ok_or_else(|| AcquireError::Unreadable("剪贴板像素数据长度异常".to_string()))?;

    let mut png = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AcquireError::Unreadable(format!("剪贴板图片编码失败：{}", e)))?;

    Ok(BlobCandidate {
        media_type: "image/png".to_string(),
        declared_size: png.len() as u64,
        payload: Payload::Bytes(png),
        origin: "clipboard",
    })
}

/// 声明类型：优先按扩展名，无法识别时探测文件签名；都失败则为空串。
fn declared_media_type(path: &Path) -> String {
    if let Ok(format) = ImageFormat::from_path(path) {
        return format.to_mime_type().to_string();
    }

    match infer::get_from_path(path) {
        Ok(Some(kind)) => kind.mime_type().to_string(),
        _ => String::new(),
    }
}

/// 去掉 Data URL 前缀，返回纯 Base64 部分。
fn strip_data_url(data: &str) -> Result<&str, AcquireError> {
    let normalized = data.trim();

    if normalized.starts_with("data:") {
        let base64_start = normalized
            .find(";base64,")
            .ok_or_else(|| AcquireError::Unreadable("缺少 base64 标记".to_string()))?;
        return Ok(&normalized[base64_start + 8..]);
    }

    Ok(normalized)
}

/// 按 Base64 长度计算解码后的字节数（考虑填充）。
fn base64_decoded_len(encoded: &str) -> u64 {
    let len = encoded.len() as u64;
    let padding = encoded.bytes().rev().take_while(|&b| b == b'=').count().min(2) as u64;
    let tail = match len % 4 {
        2 => 1,
        3 => 2,
        _ => 0,
    };
    (len / 4 * 3 + tail).saturating_sub(padding)
}
