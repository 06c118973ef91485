//! # 识别流水线模块（decoder）
//!
//! ## 设计思路
//!
//! “字节 → 位图 → 缩放 → 灰度画布 → 二维码解码”按职责拆分：
//!
//! - `pipeline`：编排整条流水线，负责尺寸检查与缩放
//! - `surface`：可复用的离屏灰度画布
//! - `engine`：外部解码器抽象（`QrDecoder`）与 rqrr 实现
//! - `guard`：单次在途识别的 RAII 标志
//! - `error`：识别阶段错误
//!
//! 识别阶段的任何错误对用户都只展示为 [`NO_CODE_MESSAGE`]，细节仅写日志。

mod engine;
mod error;
mod guard;
mod pipeline;
mod surface;

pub use engine::{QrDecoder, RqrrDecoder};
pub use error::{DecodeError, NO_CODE_MESSAGE};
pub use guard::InFlightGuard;
pub use pipeline::{scale_factor, scaled_dimensions, DecodePipeline};
pub use surface::DecodeSurface;
