//! # 错误模型模块
//!
//! 使用单一错误枚举承载识别链路中的所有错误来源，调用侧统一展示为“未识别到二维码”。

/// 识别失败时展示给用户的唯一文案。
pub const NO_CODE_MESSAGE: &str = "No QR code detected.";

/// 识别流水线统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("位图解码失败：{0}")]
    Bitmap(String),

    #[error("解码器内部错误：{0}")]
    DecoderPanicked(String),

    #[error("未识别到二维码：{0}")]
    NotFound(String),
}
