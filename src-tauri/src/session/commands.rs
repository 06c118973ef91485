//! # Tauri 命令层
//!
//! 命令层仅做 IPC 参数接收与结果返回，不承载业务逻辑。
//! 所有实际处理交由 `PopupSession`。

use std::path::PathBuf;

use tauri::{AppHandle, State, Wry};
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_shell::ShellExt;

use super::{PopupSession, SubmitOutcome};
use crate::error::AppError;
use crate::history::HistoryView;
use crate::image_input::{ImageSource, PastedItem};
use crate::presentation::DecodedResult;
use crate::status::Status;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "ico"];

/// 识别粘贴事件中的图片。
#[tauri::command]
pub async fn decode_pasted_image(
    session: State<'_, PopupSession>,
    items: Vec<PastedItem>,
) -> Result<SubmitOutcome, AppError> {
    Ok(session.submit(ImageSource::Paste(items)).await)
}

/// 识别指定路径的图片。
#[tauri::command]
pub async fn decode_image_file(
    session: State<'_, PopupSession>,
    path: Option<PathBuf>,
) -> Result<SubmitOutcome, AppError> {
    Ok(session.submit(ImageSource::FilePicker(path)).await)
}

/// 打开文件选择器并识别所选图片；用户取消时返回 `None`。
///
/// 每次都是新的对话框，连续选择同一个文件也会触发新的识别。
#[tauri::command]
pub async fn choose_image_file(
    app: AppHandle<Wry>,
    session: State<'_, PopupSession>,
) -> Result<Option<SubmitOutcome>, AppError> {
    let picked = tokio::task::spawn_blocking(move || {
        app.dialog()
            .file()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .blocking_pick_file()
    })
    .await
    .map_err(|e| AppError::Dialog(e.to_string()))?;

    let Some(file_path) = picked else {
        log::debug!("用户取消了文件选择");
        return Ok(None);
    };

    let path = file_path
        .into_path()
        .map_err(|e| AppError::Dialog(e.to_string()))?;

    Ok(Some(session.submit(ImageSource::FilePicker(Some(path))).await))
}

/// 主动读取系统剪贴板中的图片并识别。
#[tauri::command]
pub async fn read_clipboard_image(
    session: State<'_, PopupSession>,
) -> Result<SubmitOutcome, AppError> {
    Ok(session.submit(ImageSource::ClipboardRead).await)
}

/// 复制当前结果。
#[tauri::command]
pub async fn copy_result(session: State<'_, PopupSession>) -> Result<bool, AppError> {
    Ok(session.copy_result().await)
}

/// 用系统浏览器打开当前结果中的链接。
#[tauri::command]
#[allow(deprecated)]
pub fn open_result_link(
    app: AppHandle<Wry>,
    session: State<'_, PopupSession>,
) -> Result<bool, AppError> {
    let Some(link) = session.current_result().and_then(|result| result.link) else {
        return Ok(false);
    };

    app.shell()
        .open(link, None)
        .map_err(|e| AppError::Shell(e.to_string()))?;
    Ok(true)
}

#[tauri::command]
pub fn get_history(session: State<'_, PopupSession>) -> Result<HistoryView, AppError> {
    session.history_view()
}

#[tauri::command]
pub fn clear_history(session: State<'_, PopupSession>) -> Result<HistoryView, AppError> {
    session.clear_history()
}

#[tauri::command]
pub fn get_status(session: State<'_, PopupSession>) -> Status {
    session.status()
}

#[tauri::command]
pub fn get_current_result(session: State<'_, PopupSession>) -> Option<DecodedResult> {
    session.current_result()
}

/// 当前环境能否访问剪贴板，前端据此禁用“粘贴”按钮。
#[tauri::command]
pub async fn clipboard_available(session: State<'_, PopupSession>) -> Result<bool, AppError> {
    Ok(session.clipboard_available().await)
}
