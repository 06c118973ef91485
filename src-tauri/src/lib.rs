//! # 二维码识别弹窗 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                前端 (ui/index.html)                       │
//! │   拖放区 · 粘贴 · 按钮 · 结果面板 · 历史列表 · 状态栏       │
//! └───────┬──────────────────────────────────▲───────────────┘
//!         ↓ Tauri IPC (invoke)               │ 事件 status/result/history-changed
//! ┌───────┼──────────────────────────────────┼───────────────┐
//! │       ↓            后端 (Rust)            │               │
//! │  session ── PopupSession（在途标志 · 当前结果 · 事件推送）  │
//! │    ├─ image_input   来源归一化 + 类型/体积校验              │
//! │    ├─ decoder       缩放 · 离屏画布 · rqrr 解码             │
//! │    ├─ presentation  链接识别 · 预览截断                     │
//! │    ├─ history       最多 10 条、最新在前的持久化历史         │
//! │    ├─ status        单槽状态栏                             │
//! │    └─ clipboard     arboard 读图 / 写文本                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，所有 Tauri command 的返回类型 |
//! | [`config`] | 运行时配置与 `config.json` 覆盖 |
//! | [`image_input`] | 粘贴 / 拖放 / 文件选择 / 剪贴板四种来源的获取与校验 |
//! | [`decoder`] | 识别流水线、离屏画布、外部解码器抽象、在途标志 |
//! | [`presentation`] | 识别结果展示与链接判断 |
//! | [`history`] | 识别历史与键值存储 |
//! | [`status`] | 状态栏 |
//! | [`clipboard`] | 系统剪贴板访问 |
//! | [`session`] | 会话控制器与 Tauri 命令 |

pub mod clipboard;
pub mod config;
pub mod decoder;
pub mod error;
pub mod history;
pub mod image_input;
pub mod presentation;
pub mod session;
pub mod status;
