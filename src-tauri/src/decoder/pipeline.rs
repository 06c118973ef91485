//! # 识别流水线
//!
//! ## 设计思路
//!
//! 步骤严格按顺序执行：
//! 1. 读取 header 尺寸，按像素上限快速拒绝
//! 2. 完整解码为位图
//! 3. 计算缩放比例 `min(1, max_dimension / 长边)`，只缩小不放大
//! 4. 绘制到复用的离屏画布
//! 5. 调用外部解码器
//!
//! ## 实现思路
//!
//! - 缩放优先使用 `fast_image_resize`，失败时回退 `image::imageops::resize`。
//! - 画布放在 `Mutex` 中；由于在途标志保证同一时间最多一次识别，这把锁不会产生竞争。
//! - 外部解码器的 panic 被捕获为本次识别的 [`DecodeError::DecoderPanicked`]；
//!   画布每次都会整体重绘，锁中毒时直接取回继续使用。

use std::any::Any;
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::time::Instant;

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};

use super::{DecodeError, DecodeSurface, QrDecoder};
use crate::config::PopupConfig;
use crate::image_input::ImageBlob;

/// 缩放比例：长边不超过 `max_dimension`，且永不放大。
pub fn scale_factor(width: u32, height: u32, max_dimension: u32) -> f64 {
    let long_edge = width.max(height);
    if long_edge == 0 {
        return 1.0;
    }
    (max_dimension as f64 / long_edge as f64).min(1.0)
}

/// 缩放后的尺寸。
///
/// 使用整数运算，保证长边恰好落在 `max_dimension` 上；每条边至少 1 像素。
///
/// # 示例
/// ```rust
/// use qr_paste::decoder::scaled_dimensions;
///
/// assert_eq!(scaled_dimensions(1600, 800, 800), (800, 400));
/// assert_eq!(scaled_dimensions(400, 200, 800), (400, 200));
/// ```
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let long_edge = width.max(height);
    if long_edge <= max_dimension {
        return (width, height);
    }

    let scale_edge = |edge: u32| -> u32 {
        let scaled = edge as u64 * max_dimension as u64 / long_edge as u64;
        (scaled as u32).max(1)
    };

    (scale_edge(width), scale_edge(height))
}

/// 识别流水线。
///
/// 持有配置快照、复用画布与外部解码器。
pub struct DecodePipeline {
    config: PopupConfig,
    surface: Mutex<DecodeSurface>,
    decoder: Box<dyn QrDecoder>,
}

impl DecodePipeline {
    pub fn new(config: PopupConfig, decoder: Box<dyn QrDecoder>) -> Self {
        Self {
            config,
            surface: Mutex::new(DecodeSurface::new()),
            decoder,
        }
    }

    /// 识别图片中的二维码文本。
    ///
    /// 阻塞调用，调用方负责放入 `spawn_blocking`。
    pub fn decode(&self, blob: &ImageBlob) -> Result<String, DecodeError> {
        let start = Instant::now();

        let (header_width, header_height) = header_dimensions(&blob.bytes)?;
        self.check_pixel_budget(header_width, header_height)?;

        let bitmap = image::load_from_memory(&blob.bytes)
            .map_err(|e| DecodeError::Bitmap(e.to_string()))?;
        let (width, height) = bitmap.dimensions();
        self.check_pixel_budget(width, height)?;

        let (target_width, target_height) =
            scaled_dimensions(width, height, self.config.max_dimension);
        let rendered = if (target_width, target_height) == (width, height) {
            bitmap.to_rgba8()
        } else {
            log::debug!(
                "🧩 识别前缩放：{}x{} -> {}x{}（比例 {:.3}）",
                width,
                height,
                target_width,
                target_height,
                scale_factor(width, height, self.config.max_dimension)
            );
            downscale(&bitmap, target_width, target_height, self.config.resize_filter)
        };

        let text = {
            let mut surface = self
                .surface
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            surface.render(&rendered);
            let surface = &*surface;
            panic::catch_unwind(AssertUnwindSafe(|| self.decoder.decode(surface)))
                .map_err(|payload| DecodeError::DecoderPanicked(panic_message(payload.as_ref())))??
        };

        log::info!(
            "✅ 二维码识别成功 - 来源: {} 原始尺寸: {}x{} 画布尺寸: {}x{} 耗时: {}ms",
            blob.origin,
            width,
            height,
            target_width,
            target_height,
            start.elapsed().as_millis()
        );

        Ok(text)
    }

    /// 像素总量超过上限时拒绝，防止解压炸弹。
    fn check_pixel_budget(&self, width: u32, height: u32) -> Result<(), DecodeError> {
        let budget = self.config.max_decoded_pixels;
        match (width as u64).checked_mul(height as u64) {
            Some(pixels) if pixels <= budget => Ok(()),
            Some(pixels) => Err(DecodeError::ResourceLimit(format!(
                "{}x{} 共 {} 像素，超过上限 {}",
                width, height, pixels, budget
            ))),
            None => Err(DecodeError::ResourceLimit(format!("{}x{} 像素数溢出", width, height))),
        }
    }
}

/// 只解析 header，拿到宽高而不解码像素。
fn header_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::InvalidFormat(e.to_string()))?;
    reader
        .into_dimensions()
        .map_err(|e| DecodeError::InvalidFormat(e.to_string()))
}

/// 缩小位图：`fast_image_resize` 卷积缩放，任何一步失败都回退到 `imageops`。
fn downscale(image: &DynamicImage, width: u32, height: u32, filter: FilterType) -> RgbaImage {
    let rgba = image.to_rgba8();

    let fast = || -> Result<RgbaImage, String> {
        let src = fr::images::ImageRef::new(rgba.width(), rgba.height(), rgba.as_raw(), fr::PixelType::U8x4)
            .map_err(|e| e.to_string())?;
        let mut dst = fr::images::Image::new(width, height, fr::PixelType::U8x4);
        let algorithm = match filter {
            FilterType::Nearest => fr::ResizeAlg::Nearest,
            FilterType::Triangle => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            FilterType::CatmullRom => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
            FilterType::Gaussian => fr::ResizeAlg::Convolution(fr::FilterType::Gaussian),
            FilterType::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
        };
        fr::Resizer::new()
            .resize(&src, &mut dst, &fr::ResizeOptions::new().resize_alg(algorithm))
            .map_err(|e| e.to_string())?;
        RgbaImage::from_raw(width, height, dst.into_vec())
            .ok_or_else(|| "输出缓冲长度与尺寸不符".to_string())
    };

    fast().unwrap_or_else(|err| {
        log::warn!("⚠️ fast_image_resize 缩放失败，回退 imageops：{}", err);
        image::imageops::resize(&rgba, width, height, filter)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "未知 panic".to_string())
}
