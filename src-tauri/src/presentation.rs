//! 识别结果展示
//!
//! 负责把识别出的文本整理成前端可直接渲染的结构，并判断是否可作为网页链接打开。
//! 只有 `http` / `https` 链接会暴露“打开链接”入口；解析失败一律视为普通文本，不报错。

use serde::Serialize;
use url::Url;

/// 当前展示的识别结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedResult {
    /// 识别出的完整文本。
    pub text: String,
    /// 可打开的规范化链接；非网页链接时为 `None`。
    pub link: Option<String>,
}

impl DecodedResult {
    pub fn new(text: String) -> Self {
        let link = detect_link(&text);
        Self { text, link }
    }
}

/// 判断文本是否为可打开的网页链接，返回规范化后的字符串形式。
///
/// # 示例
/// ```rust
/// use qr_paste::presentation::detect_link;
///
/// assert_eq!(detect_link("https://example.com").as_deref(), Some("https://example.com/"));
/// assert_eq!(detect_link("ftp://host/x"), None);
/// ```
pub fn detect_link(text: &str) -> Option<String> {
    let url = Url::parse(text).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}

/// 截取前 `max_chars` 个字符作为预览，控制字符替换为空格。
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
