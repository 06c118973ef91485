//! # 历史列表渲染
//!
//! 每次渲染都生成完整列表，前端整体替换，不做增量比对。

use chrono::{Local, TimeZone};
use serde::Serialize;

use super::HistoryEntry;
use crate::presentation::preview;

/// 列表中单条文本的最大展示字符数。
pub const PREVIEW_CHARS: usize = 160;

/// 历史列表中的一行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    /// 最多 160 个字符的预览。
    pub preview: String,
    /// 原始时间戳（毫秒）。
    pub timestamp: i64,
    /// 本地时区格式化后的时间。
    pub time_label: String,
}

/// 完整的历史列表视图。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryView {
    pub rows: Vec<HistoryRow>,
}

impl HistoryView {
    pub fn render(entries: &[HistoryEntry]) -> Self {
        let rows = entries
            .iter()
            .map(|entry| HistoryRow {
                preview: preview(&entry.text, PREVIEW_CHARS),
                timestamp: entry.timestamp,
                time_label: format_timestamp(entry.timestamp),
            })
            .collect();
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
