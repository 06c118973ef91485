//! # 前端事件推送
//!
//! 拖放由原生窗口事件触发，不经过命令调用，因此状态、结果和历史的变化都以事件推送给前端；
//! 命令的返回值只是同一信息的副本。

use tauri::{AppHandle, Emitter, Wry};

use crate::history::HistoryView;
use crate::presentation::DecodedResult;
use crate::status::Status;

pub const STATUS_CHANGED_EVENT: &str = "status-changed";
pub const RESULT_CHANGED_EVENT: &str = "result-changed";
pub const HISTORY_CHANGED_EVENT: &str = "history-changed";

/// 弹窗状态变化的接收方。
pub trait PopupEvents: Send + Sync {
    fn status_changed(&self, status: &Status);

    /// `None` 表示隐藏结果面板。
    fn result_changed(&self, result: Option<&DecodedResult>);

    fn history_changed(&self, view: &HistoryView);
}

/// 通过 Tauri 事件推送给前端。
pub struct TauriEvents {
    app: AppHandle<Wry>,
}

impl TauriEvents {
    pub fn new(app: AppHandle<Wry>) -> Self {
        Self { app }
    }
}

impl PopupEvents for TauriEvents {
    fn status_changed(&self, status: &Status) {
        if let Err(err) = self.app.emit(STATUS_CHANGED_EVENT, status) {
            log::warn!("推送状态事件失败: {err}");
        }
    }

    fn result_changed(&self, result: Option<&DecodedResult>) {
        if let Err(err) = self.app.emit(RESULT_CHANGED_EVENT, result) {
            log::warn!("推送结果事件失败: {err}");
        }
    }

    fn history_changed(&self, view: &HistoryView) {
        if let Err(err) = self.app.emit(HISTORY_CHANGED_EVENT, view) {
            log::warn!("推送历史事件失败: {err}");
        }
    }
}
