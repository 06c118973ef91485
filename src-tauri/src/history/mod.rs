//! 识别历史模块
//!
//! # 设计思路
//!
//! 历史记录是一个有上限的、最新在前的列表，整体存放在键值存储的单个键下。
//! 对外只有三个操作：追加、清空、读取全部；每次写入都截断到 [`HISTORY_LIMIT`] 条，
//! 不只在溢出时截断。
//!
//! # 实现思路
//!
//! - 每次修改都是完整的“读取 → 修改 → 写回”，一致性由存储后端对单键写入的原子性保证。
//! - 条目在识别成功时生成时间戳，之后不再修改。
//! - 写入前按 `max_stored_text_chars` 截断过长文本，展示侧另有 160 字符预览。

mod render;
mod storage;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use render::{HistoryRow, HistoryView, PREVIEW_CHARS};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};

/// 历史记录所在的存储键。
pub const HISTORY_KEY: &str = "history";

/// 历史记录最多保留的条数。
pub const HISTORY_LIMIT: usize = 10;

/// 一次成功识别的记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    /// 识别成功时刻（Unix 毫秒）。
    pub timestamp: i64,
}

/// 识别历史存储。
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    max_text_chars: usize,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>, max_text_chars: usize) -> Self {
        Self {
            store,
            max_text_chars,
        }
    }

    /// 读取全部历史（最新在前），不修改存储。
    pub fn read_all(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        let value = self.store.get_or(HISTORY_KEY, Value::Array(Vec::new()))?;
        serde_json::from_value(value)
            .map_err(|e| StorageError::Corrupt(format!("历史记录格式错误：{}", e)))
    }

    /// 在最前面插入一条记录并写回，返回写回后的完整列表。
    pub fn append(&self, entry: HistoryEntry) -> Result<Vec<HistoryEntry>, StorageError> {
        let mut entries = self.read_all()?;
        entries.insert(0, self.cap_text(entry));
        self.write(entries)
    }

    /// 清空历史。
    pub fn clear(&self) -> Result<(), StorageError> {
        self.write(Vec::new()).map(|_| ())
    }

    fn write(&self, mut entries: Vec<HistoryEntry>) -> Result<Vec<HistoryEntry>, StorageError> {
        entries.truncate(HISTORY_LIMIT);
        self.store.set(HISTORY_KEY, serde_json::to_value(&entries)?)?;
        Ok(entries)
    }

    fn cap_text(&self, entry: HistoryEntry) -> HistoryEntry {
        match entry.text.char_indices().nth(self.max_text_chars) {
            Some((cut, _)) => {
                log::debug!("历史文本过长，截断为 {} 个字符后保存", self.max_text_chars);
                HistoryEntry {
                    text: entry.text[..cut].to_string(),
                    timestamp: entry.timestamp,
                }
            }
            None => entry,
        }
    }
}
