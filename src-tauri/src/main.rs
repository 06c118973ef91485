// 防止在 Windows 发布版本中显示额外的控制台窗口，不要删除！
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! # 二维码识别弹窗 — 应用入口
//!
//! 本文件仅负责应用初始化、原生拖放转发与命令注册。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::sync::Arc;

use qr_paste::clipboard::ArboardClipboard;
use qr_paste::config;
use qr_paste::decoder::RqrrDecoder;
use qr_paste::history::JsonFileStore;
use qr_paste::image_input::ImageSource;
use qr_paste::session::{self, PopupSession, TauriEvents};
use tauri::{DragDropEvent, Manager, WindowEvent};

const STORAGE_FILE_NAME: &str = "storage.json";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    tauri::Builder::default()
        // 插件初始化
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        // 应用设置
        .setup(|app| {
            log::info!("setup: begin");
            let handle = app.handle().clone();

            let popup_config = config::load_config(&handle);
            let storage_path = config::app_data_dir(&handle)?.join(STORAGE_FILE_NAME);
            log::info!("setup: 历史存储路径 {}", storage_path.display());

            let session = PopupSession::new(
                popup_config,
                Box::new(RqrrDecoder),
                Arc::new(JsonFileStore::new(storage_path)),
                Arc::new(ArboardClipboard),
                Arc::new(TauriEvents::new(handle)),
            );

            // 启动时渲染一次历史；失败已经写入状态栏，不阻止启动
            if let Err(err) = session.history_view() {
                log::error!("setup: 初始历史加载失败: {err}");
            }

            app.manage(session);
            log::info!("setup: complete");
            Ok(())
        })
        // 原生拖放：只取第一个文件
        .on_window_event(|window, event| {
            if let WindowEvent::DragDrop(DragDropEvent::Drop { paths, .. }) = event {
                let Some(session) = window.try_state::<PopupSession>() else {
                    log::warn!("会话尚未就绪，忽略拖放");
                    return;
                };
                let session = session.inner().clone();
                let paths = paths.clone();
                tauri::async_runtime::spawn(async move {
                    let outcome = session.submit(ImageSource::Drop(paths)).await;
                    log::debug!("拖放处理结果: {:?}", outcome);
                });
            }
        })
        // 注册所有 Tauri 命令
        .invoke_handler(tauri::generate_handler![
            session::commands::decode_pasted_image,
            session::commands::decode_image_file,
            session::commands::choose_image_file,
            session::commands::read_clipboard_image,
            session::commands::copy_result,
            session::commands::open_result_link,
            session::commands::get_history,
            session::commands::clear_history,
            session::commands::get_status,
            session::commands::get_current_result,
            session::commands::clipboard_available,
        ])
        .run(tauri::generate_context!())
        .expect("运行 Tauri 应用时出错");
}
