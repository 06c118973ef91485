//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `PopupConfig`，默认值即生产配置：
//! 5 MiB 输入上限、长边 800 像素的识别画布、单条历史最多保存 4096 个字符。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用配置。
//! - 可选的 `<app_data_dir>/config.json` 覆盖部分字段；文件缺失或无法解析时回退默认值，
//!   只记录警告，不阻止应用启动。
//! - 覆盖值会被夹紧到合理区间，避免手写配置把识别画布设为 0 或无限大。

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use serde::Deserialize;
use tauri::{AppHandle, Manager};

use crate::error::AppError;

const CONFIG_FILE_NAME: &str = "config.json";

const MAX_DIMENSION_RANGE: (u32, u32) = (64, 4096);
const MAX_FILE_SIZE_RANGE: (u64, u64) = (1024, 64 * 1024 * 1024);
const STORED_TEXT_RANGE: (usize, usize) = (160, 1024 * 1024);

/// 弹窗运行时配置。
#[derive(Debug, Clone)]
pub struct PopupConfig {
    /// 输入图片允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 识别画布的长边上限（像素），只缩小不放大。
    pub max_dimension: u32,
    /// 完整解码前按图片头信息检查的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 缩放滤镜。
    pub resize_filter: FilterType,
    /// 写入历史前保留的最大字符数。
    pub max_stored_text_chars: usize,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024,
            max_dimension: 800,
            max_decoded_pixels: 40_000_000,
            resize_filter: FilterType::Triangle,
            max_stored_text_chars: 4096,
        }
    }
}

/// `config.json` 中允许出现的覆盖项，全部可选。
#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    #[serde(default)]
    max_file_size: Option<u64>,
    #[serde(default)]
    max_dimension: Option<u32>,
    #[serde(default)]
    max_decoded_pixels: Option<u64>,
    #[serde(default)]
    resize_filter: Option<String>,
    #[serde(default)]
    max_stored_text_chars: Option<usize>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut PopupConfig) {
        if let Some(size) = self.max_file_size {
            config.max_file_size = size.clamp(MAX_FILE_SIZE_RANGE.0, MAX_FILE_SIZE_RANGE.1);
        }
        if let Some(dimension) = self.max_dimension {
            config.max_dimension = dimension.clamp(MAX_DIMENSION_RANGE.0, MAX_DIMENSION_RANGE.1);
        }
        if let Some(pixels) = self.max_decoded_pixels {
            config.max_decoded_pixels = pixels.max(1);
        }
        if let Some(name) = self.resize_filter {
            match parse_filter(&name) {
                Some(filter) => config.resize_filter = filter,
                None => log::warn!("未知缩放滤镜：{}（可选：nearest / triangle / catmull-rom / gaussian / lanczos3）", name),
            }
        }
        if let Some(chars) = self.max_stored_text_chars {
            config.max_stored_text_chars = chars.clamp(STORED_TEXT_RANGE.0, STORED_TEXT_RANGE.1);
        }
    }
}

fn parse_filter(name: &str) -> Option<FilterType> {
    match name.trim().to_lowercase().as_str() {
        "nearest" => Some(FilterType::Nearest),
        "triangle" => Some(FilterType::Triangle),
        "catmull-rom" | "catmullrom" => Some(FilterType::CatmullRom),
        "gaussian" => Some(FilterType::Gaussian),
        "lanczos3" => Some(FilterType::Lanczos3),
        _ => None,
    }
}

/// 从指定路径加载配置；缺失或损坏时回退默认值。
pub fn load_config_from_path(config_path: &Path) -> PopupConfig {
    let mut config = PopupConfig::default();

    if !config_path.exists() {
        return config;
    }

    let overrides = fs::read_to_string(config_path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str::<ConfigOverrides>(&content).map_err(|e| e.to_string()));

    match overrides {
        Ok(overrides) => {
            overrides.apply(&mut config);
            log::info!("已加载配置覆盖：{}", config_path.display());
        }
        Err(err) => {
            log::warn!("配置文件无法解析，使用默认配置（{}）：{}", config_path.display(), err);
        }
    }

    config
}

/// 应用数据目录，不存在时自动创建。
pub fn app_data_dir(app: &AppHandle) -> Result<PathBuf, AppError> {
    let dir = app
        .path()
        .app_data_dir()
        .map_err(|e| AppError::Storage(format!("获取应用数据目录失败: {}", e)))?;

    fs::create_dir_all(&dir)
        .map_err(|e| AppError::Storage(format!("创建应用数据目录失败: {}", e)))?;

    Ok(dir)
}

/// 加载应用配置。
pub fn load_config(app: &AppHandle) -> PopupConfig {
    match app_data_dir(app) {
        Ok(dir) => load_config_from_path(&dir.join(CONFIG_FILE_NAME)),
        Err(err) => {
            log::warn!("无法定位配置目录，使用默认配置：{}", err);
            PopupConfig::default()
        }
    }
}
