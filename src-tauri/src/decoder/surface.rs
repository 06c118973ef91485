//! # 离屏画布
//!
//! 识别前把缩放后的位图绘制到一块灰度缓冲上，解码器只读取这块缓冲。
//! 画布在多次识别之间复用（只在容量不足时扩容），这依赖于同一时间最多一次识别。

use image::RgbaImage;

/// 可复用的灰度画布。
#[derive(Debug, Default)]
pub struct DecodeSurface {
    width: usize,
    height: usize,
    luma: Vec<u8>,
}

impl DecodeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将 RGBA 位图绘制到画布，尺寸随位图调整。
    ///
    /// 透明像素按白底合成，避免透明背景的二维码被当成黑色。
    pub fn render(&mut self, image: &RgbaImage) {
        self.width = image.width() as usize;
        self.height = image.height() as usize;
        self.luma.clear();
        self.luma.reserve(self.width * self.height);

        self.luma.extend(image.pixels().map(|p| {
            let [r, g, b, a] = p.0;
            let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
            let alpha = a as u32;
            ((luma * alpha + 255 * (255 - alpha)) / 255) as u8
        }));
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// 读取 `(x, y)` 处的灰度值；越界返回白色。
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 255;
        }
        self.luma[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::DecodeSurface;

    #[test]
    fn render_converts_to_luma_over_white() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 0, 0, 0]));

        let mut surface = DecodeSurface::new();
        surface.render(&image);

        assert_eq!((surface.width(), surface.height()), (2, 1));
        assert_eq!(surface.pixel(0, 0), 0);
        assert_eq!(surface.pixel(1, 0), 255);
        assert_eq!(surface.pixel(5, 5), 255);
    }

    #[test]
    fn surface_is_resized_on_reuse() {
        let mut surface = DecodeSurface::new();
        surface.render(&RgbaImage::from_pixel(8, 8, Rgba([10, 10, 10, 255])));
        surface.render(&RgbaImage::from_pixel(3, 2, Rgba([200, 200, 200, 255])));

        assert_eq!((surface.width(), surface.height()), (3, 2));
        for (x, y) in [(0, 0), (2, 0), (0, 1), (2, 1)] {
            assert_eq!(surface.pixel(x, y), 200);
        }
        assert_eq!(surface.pixel(3, 0), 255);
    }
}
