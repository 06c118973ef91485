//! 状态栏模块
//!
//! # 设计思路
//!
//! 弹窗只有一行状态文本，附带一个严重级别标记。每次更新都直接覆盖，
//! 不保留历史、不排队、不自动消失。其余模块的终态（成功、校验拒绝、
//! 识别失败、复制失败、剪贴板降级）全部经由这里展示，保证用户看到的总是最近一次事件。
//!
//! # 实现思路
//!
//! - `StatusChannel` 内部用 `Mutex<Status>` 存放单槽值。
//! - 每次 `set` 之后通过 `PopupEvents::status_changed` 推送给前端。

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::session::PopupEvents;

/// 状态严重级别，序列化为前端使用的 `info` / `error` / `success`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
    Success,
}

/// 当前状态值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub message: String,
    pub severity: Severity,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            message: String::new(),
            severity: Severity::Info,
        }
    }
}

/// 单槽、后写覆盖的状态通道。
pub struct StatusChannel {
    slot: Mutex<Status>,
    events: Arc<dyn PopupEvents>,
}

impl StatusChannel {
    pub fn new(events: Arc<dyn PopupEvents>) -> Self {
        Self {
            slot: Mutex::new(Status::default()),
            events,
        }
    }

    /// 覆盖当前状态并通知前端。
    pub fn set(&self, message: impl Into<String>, severity: Severity) {
        let status = Status {
            message: message.into(),
            severity,
        };

        match self.slot.lock() {
            Ok(mut slot) => *slot = status.clone(),
            Err(poisoned) => *poisoned.into_inner() = status.clone(),
        }

        log::debug!("状态更新 [{:?}] {}", status.severity, status.message);
        self.events.status_changed(&status);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.set(message, Severity::Info);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.set(message, Severity::Error);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.set(message, Severity::Success);
    }

    /// 读取当前状态快照。
    pub fn current(&self) -> Status {
        match self.slot.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
