//! # 外部解码器
//!
//! 二维码解码算法不在本项目内实现，只通过 `QrDecoder` 调用。
//! 解码器的错误分类对上层不透明，统一视为“未识别到二维码”。

use super::{DecodeError, DecodeSurface};

/// 二维码解码器抽象。
pub trait QrDecoder: Send + Sync {
    /// 在画布上识别二维码，返回其中的文本。
    fn decode(&self, surface: &DecodeSurface) -> Result<String, DecodeError>;
}

/// 基于 `rqrr` 的解码器。
///
/// 画布上可能检测到多个定位网格，按顺序尝试，返回第一个成功解码的结果。
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl QrDecoder for RqrrDecoder {
    fn decode(&self, surface: &DecodeSurface) -> Result<String, DecodeError> {
        if surface.is_empty() {
            return Err(DecodeError::NotFound("画布为空".to_string()));
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            surface.width(),
            surface.height(),
            |x, y| surface.pixel(x, y),
        );

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Err(DecodeError::NotFound("未检测到定位图案".to_string()));
        }

        let mut last_error = None;
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => return Ok(content),
                Err(err) => last_error = Some(err.to_string()),
            }
        }

        Err(DecodeError::NotFound(
            last_error.unwrap_or_else(|| "未知错误".to_string()),
        ))
    }
}
