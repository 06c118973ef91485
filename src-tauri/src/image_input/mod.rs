//! # 图片获取模块（image_input）
//!
//! ## 设计思路
//!
//! 四种输入来源（粘贴事件、拖放、文件选择、主动读取剪贴板）先各自归一化为
//! `BlobCandidate`，再经过同一套校验，最后才读取完整字节，交给识别流水线。
//! 校验逻辑只有一份，不随来源重复。
//!
//! ```text
//! ImageSource ──load_candidate──▶ Option<BlobCandidate>
//!                                      │
//!                              validate_candidate（顺序校验，首个失败即返回）
//!                                      │ 1. 没有图片        → NoImage
//!                                      │ 2. 类型非 image/*  → UnsupportedType
//!                                      │ 3. 超过体积上限    → TooLarge
//!                                      ▼
//!                                  materialize ──▶ ImageBlob
//! ```
//!
//! 整个获取过程是阻塞的（文件 I/O、剪贴板），调用方负责放入 `spawn_blocking`。

mod error;
mod loader;
mod source;

pub use error::AcquireError;
pub use loader::acquire;
pub use source::{ImageBlob, ImageSource, PastedItem};
