//! # 键值存储
//!
//! ## 设计思路
//!
//! 历史记录只依赖“带默认值读取 + 整体替换写入”两个能力，用 `KeyValueStore` 抽象：
//! - `JsonFileStore`：应用数据目录下的单个 JSON 对象文件（生产）
//! - `MemoryStore`：进程内存（测试）
//!
//! ## 实现思路
//!
//! - 每次读写都重新读取文件，不在内存中缓存，多个窗口实例看到的是同一份数据。
//! - 写入先落临时文件再 `rename` 覆盖，单个键的替换是原子的。
//! - 文件缺失视为空对象；读取时内容损坏返回 `StorageError::Corrupt`，交给上层展示。
//! - 写入时遇到损坏文件：原文件改名为 `*.corrupt` 备份，从空对象重新开始，
//!   这样“清空历史”总能把存储恢复到可用状态。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};

/// 存储错误。
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("存储文件读写失败：{0}")]
    Io(#[from] std::io::Error),

    #[error("存储数据序列化失败：{0}")]
    Json(#[from] serde_json::Error),

    #[error("存储数据已损坏：{0}")]
    Corrupt(String),

    #[error("存储锁已中毒")]
    Lock,
}

/// 键值存储抽象。
pub trait KeyValueStore: Send + Sync {
    /// 读取键值，不存在时返回 `None`。
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// 整体替换键值。
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// 读取键值，不存在时返回 `default`。
    fn get_or(&self, key: &str, default: Value) -> Result<Value, StorageError> {
        Ok(self.get(key)?.unwrap_or(default))
    }
}

/// 单文件 JSON 存储。
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StorageError::Corrupt(format!(
                "{} 顶层不是 JSON 对象",
                self.path.display()
            ))),
            Err(e) => Err(StorageError::Corrupt(format!("{}：{}", self.path.display(), e))),
        }
    }

    /// 写入前读取现有内容；损坏的文件先备份再从空对象开始。
    fn read_map_for_write(&self) -> Result<Map<String, Value>, StorageError> {
        match self.read_map() {
            Err(StorageError::Corrupt(reason)) => {
                let backup = self.corrupt_backup_path();
                log::warn!("⚠️ 存储文件已损坏，备份到 {} 后重建：{}", backup.display(), reason);
                fs::rename(&self.path, &backup)?;
                Ok(Map::new())
            }
            other => other,
        }
    }

    fn corrupt_backup_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _lock = self.write_lock.lock().map_err(|_| StorageError::Lock)?;
        let mut map = self.read_map_for_write()?;
        map.insert(key.to_string(), value);
        self.write_map(&map)
    }
}

/// 内存存储。
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let values = self.values.lock().map_err(|_| StorageError::Lock)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut values = self.values.lock().map_err(|_| StorageError::Lock)?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use serde_json::json;

    use super::*;

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("qr-paste-store-test-{nanos}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn missing_file_reads_default() {
        let dir = unique_temp_dir();
        let store = JsonFileStore::new(dir.join("storage.json"));

        assert_eq!(store.get("history").expect("get"), None);
        assert_eq!(store.get_or("history", json!([])).expect("get_or"), json!([]));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn set_replaces_single_key_and_keeps_others() {
        let dir = unique_temp_dir();
        let store = JsonFileStore::new(dir.join("nested").join("storage.json"));

        store.set("other", json!({"keep": true})).expect("set other");
        store.set("history", json!([1])).expect("set history");
        store.set("history", json!([2, 3])).expect("replace history");

        assert_eq!(store.get("history").expect("get"), Some(json!([2, 3])));
        assert_eq!(store.get("other").expect("get"), Some(json!({"keep": true})));
        assert!(!store.path().with_extension("json.tmp").exists());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = unique_temp_dir();
        let path = dir.join("storage.json");
        fs::write(&path, "[not an object").expect("write corrupt");

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get("history"), Err(StorageError::Corrupt(_))));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn write_over_corrupt_file_backs_it_up_and_starts_fresh() {
        let dir = unique_temp_dir();
        let path = dir.join("storage.json");
        fs::write(&path, "{truncated").expect("write corrupt");

        let store = JsonFileStore::new(&path);
        store.set("history", json!([])).expect("set over corrupt file");

        assert_eq!(store.get("history").expect("get"), Some(json!([])));
        let backup = dir.join("storage.json.corrupt");
        assert_eq!(fs::read_to_string(backup).expect("read backup"), "{truncated");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_or("k", json!(0)).expect("get_or"), json!(0));
        store.set("k", json!(1)).expect("set");
        assert_eq!(store.get("k").expect("get"), Some(json!(1)));
    }
}
