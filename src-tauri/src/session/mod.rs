//! # 弹窗会话（session）
//!
//! ## 设计思路
//!
//! `PopupSession` 在 `setup` 阶段创建一次，生命周期等同弹窗进程，承载原本散落在
//! 事件回调里的全部可变状态：在途标志、状态栏、当前结果。它不直接依赖 Tauri，
//! 外部能力（解码器、剪贴板、存储、事件推送）都通过 trait 注入，便于测试。
//!
//! ## 调用链
//!
//! ```text
//! 粘贴 / 拖放 / 文件选择 / 读剪贴板
//!    ↓
//! submit()
//!    ├─ InFlightGuard（已有识别在途 → 直接忽略）
//!    ├─ image_input::acquire（spawn_blocking，校验失败 → 状态栏报错）
//!    ├─ 状态栏 “Decoding…”
//!    ├─ DecodePipeline::decode（spawn_blocking，任何失败 → “No QR code detected.”）
//!    ├─ 展示结果 + 状态栏成功
//!    └─ HistoryStore::append + 重新渲染历史
//! ```
//!
//! 所有失败只终止当前这一次操作，不重试，也不向上抛出；守卫离开作用域时在途标志必定被清除。

mod events;
pub mod commands;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;

pub use events::{
    PopupEvents, TauriEvents, HISTORY_CHANGED_EVENT, RESULT_CHANGED_EVENT, STATUS_CHANGED_EVENT,
};

use crate::clipboard::SystemClipboard;
use crate::config::PopupConfig;
use crate::decoder::{DecodePipeline, InFlightGuard, QrDecoder, NO_CODE_MESSAGE};
use crate::error::AppError;
use crate::history::{HistoryEntry, HistoryStore, HistoryView, KeyValueStore};
use crate::image_input::{self, AcquireError, ImageSource};
use crate::presentation::DecodedResult;
use crate::status::{Status, StatusChannel};

pub const DECODING_MESSAGE: &str = "Decoding…";
pub const DECODED_MESSAGE: &str = "QR decoded successfully.";
pub const MANUAL_PASTE_MESSAGE: &str = "Press Ctrl/Cmd+V now.";
pub const COPIED_MESSAGE: &str = "Copied to clipboard.";
pub const COPY_FAILED_MESSAGE: &str = "Copy failed. Select text manually.";
pub const HISTORY_CLEARED_MESSAGE: &str = "History cleared.";
pub const HISTORY_SAVE_FAILED_MESSAGE: &str = "QR decoded, but history could not be saved.";
pub const HISTORY_LOAD_FAILED_MESSAGE: &str = "History could not be loaded.";
pub const HISTORY_CLEAR_FAILED_MESSAGE: &str = "History could not be cleared.";

/// 一次提交的结果，与状态栏展示的信息一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// 已有识别在途，本次请求被忽略。
    Ignored,
    /// 获取或校验阶段被拒绝。
    Rejected { reason: String },
    /// 无法直接读取剪贴板，已提示用户手动粘贴。
    ManualPaste,
    /// 未识别到二维码。
    NoCode,
    /// 识别成功。
    Decoded { result: DecodedResult },
}

/// 弹窗会话控制器。
#[derive(Clone)]
pub struct PopupSession {
    config: Arc<PopupConfig>,
    pipeline: Arc<DecodePipeline>,
    in_flight: Arc<AtomicBool>,
    history: Arc<HistoryStore>,
    status: Arc<StatusChannel>,
    clipboard: Arc<dyn SystemClipboard>,
    current: Arc<Mutex<Option<DecodedResult>>>,
    events: Arc<dyn PopupEvents>,
}

impl PopupSession {
    /// 组装会话。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use qr_paste::clipboard::ArboardClipboard;
    /// use qr_paste::config::PopupConfig;
    /// use qr_paste::decoder::RqrrDecoder;
    /// use qr_paste::history::JsonFileStore;
    /// use qr_paste::session::PopupSession;
    /// # fn events() -> Arc<dyn qr_paste::session::PopupEvents> { unimplemented!() }
    ///
    /// let session = PopupSession::new(
    ///     PopupConfig::default(),
    ///     Box::new(RqrrDecoder),
    ///     Arc::new(JsonFileStore::new("/tmp/qr-paste/storage.json")),
    ///     Arc::new(ArboardClipboard),
    ///     events(),
    /// );
    /// ```
    pub fn new(
        config: PopupConfig,
        decoder: Box<dyn QrDecoder>,
        store: Arc<dyn KeyValueStore>,
        clipboard: Arc<dyn SystemClipboard>,
        events: Arc<dyn PopupEvents>,
    ) -> Self {
        let history = HistoryStore::new(store, config.max_stored_text_chars);
        let pipeline = DecodePipeline::new(config.clone(), decoder);

        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            in_flight: Arc::new(AtomicBool::new(false)),
            history: Arc::new(history),
            status: Arc::new(StatusChannel::new(Arc::clone(&events))),
            clipboard,
            current: Arc::new(Mutex::new(None)),
            events,
        }
    }

    /// 处理一次图片输入：获取 → 识别 → 展示 → 写入历史。
    pub async fn submit(&self, source: ImageSource) -> SubmitOutcome {
        let origin = source.origin();
        let Some(_guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            log::debug!("⏭️ 已有识别在进行，忽略来自 {} 的请求", origin);
            return SubmitOutcome::Ignored;
        };

        let total_start = Instant::now();

        let config = Arc::clone(&self.config);
        let clipboard = Arc::clone(&self.clipboard);
        let acquired = tokio::task::spawn_blocking(move || {
            image_input::acquire(source, &config, clipboard.as_ref())
        })
        .await
        .unwrap_or_else(|e| Err(AcquireError::Unreadable(format!("后台任务执行失败：{}", e))));

        let blob = match acquired {
            Ok(blob) => blob,
            Err(AcquireError::ClipboardUnavailable(err)) => {
                log::warn!("直接读取剪贴板失败，回退为手动粘贴: {err}");
                self.status.info(MANUAL_PASTE_MESSAGE);
                return SubmitOutcome::ManualPaste;
            }
            Err(err) => {
                log::info!("图片被拒绝 - 来源: {} 原因: {:?}", origin, err);
                let reason = err.to_string();
                self.status.error(reason.clone());
                return SubmitOutcome::Rejected { reason };
            }
        };
        let load_elapsed = total_start.elapsed();

        self.status.info(DECODING_MESSAGE);

        let decode_start = Instant::now();
        let pipeline = Arc::clone(&self.pipeline);
        let decoded = tokio::task::spawn_blocking(move || pipeline.decode(&blob)).await;

        let text = match decoded {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                log::warn!("识别失败 - 来源: {} 原因: {}", origin, err);
                self.show_no_code();
                return SubmitOutcome::NoCode;
            }
            Err(err) => {
                log::error!("识别任务异常终止 - 来源: {} 原因: {}", origin, err);
                self.show_no_code();
                return SubmitOutcome::NoCode;
            }
        };
        let decode_elapsed = decode_start.elapsed();

        let timestamp = chrono::Utc::now().timestamp_millis();
        let result = DecodedResult::new(text);
        self.set_current(Some(result.clone()));
        self.status.success(DECODED_MESSAGE);

        let entry = HistoryEntry {
            text: result.text.clone(),
            timestamp,
        };
        let history = Arc::clone(&self.history);
        match tokio::task::spawn_blocking(move || history.append(entry)).await {
            Ok(Ok(entries)) => self.events.history_changed(&HistoryView::render(&entries)),
            Ok(Err(err)) => {
                log::error!("写入识别历史失败: {err}");
                self.status.error(HISTORY_SAVE_FAILED_MESSAGE);
            }
            Err(err) => {
                log::error!("写入历史任务异常终止: {err}");
                self.status.error(HISTORY_SAVE_FAILED_MESSAGE);
            }
        }

        log::info!(
            "✅ 处理完成 - 来源: {} load={}ms decode={}ms total={}ms",
            origin,
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        SubmitOutcome::Decoded { result }
    }

    /// 复制当前展示的结果；没有结果时不做任何事并返回 `false`。
    pub async fn copy_result(&self) -> bool {
        let Some(result) = self.current_result() else {
            return false;
        };

        let clipboard = Arc::clone(&self.clipboard);
        let written = tokio::task::spawn_blocking(move || clipboard.write_text(&result.text)).await;

        match written {
            Ok(Ok(())) => {
                self.status.success(COPIED_MESSAGE);
                true
            }
            Ok(Err(err)) => {
                log::warn!("复制结果失败: {err}");
                self.status.error(COPY_FAILED_MESSAGE);
                false
            }
            Err(err) => {
                log::error!("复制任务异常终止: {err}");
                self.status.error(COPY_FAILED_MESSAGE);
                false
            }
        }
    }

    /// 读取并渲染历史列表，同时推送给前端。
    pub fn history_view(&self) -> Result<HistoryView, AppError> {
        match self.history.read_all() {
            Ok(entries) => {
                let view = HistoryView::render(&entries);
                self.events.history_changed(&view);
                Ok(view)
            }
            Err(err) => {
                log::error!("读取识别历史失败: {err}");
                self.status.error(HISTORY_LOAD_FAILED_MESSAGE);
                Err(err.into())
            }
        }
    }

    /// 清空历史并重新渲染。
    pub fn clear_history(&self) -> Result<HistoryView, AppError> {
        if let Err(err) = self.history.clear() {
            log::error!("清空识别历史失败: {err}");
            self.status.error(HISTORY_CLEAR_FAILED_MESSAGE);
            return Err(err.into());
        }

        let view = self.history_view()?;
        self.status.info(HISTORY_CLEARED_MESSAGE);
        Ok(view)
    }

    /// 当前展示的结果。
    pub fn current_result(&self) -> Option<DecodedResult> {
        match self.current.lock() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn status(&self) -> Status {
        self.status.current()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn clipboard_available(&self) -> bool {
        let clipboard = Arc::clone(&self.clipboard);
        tokio::task::spawn_blocking(move || clipboard.is_available())
            .await
            .unwrap_or(false)
    }

    fn show_no_code(&self) {
        self.status.error(NO_CODE_MESSAGE);
        self.set_current(None);
    }

    fn set_current(&self, result: Option<DecodedResult>) {
        match self.current.lock() {
            Ok(mut current) => *current = result.clone(),
            Err(poisoned) => *poisoned.into_inner() = result.clone(),
        }
        self.events.result_changed(result.as_ref());
    }
}
