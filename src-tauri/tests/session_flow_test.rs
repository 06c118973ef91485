// 会话级流程测试：用假解码器 / 假剪贴板 / 内存存储驱动完整的识别链路
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::Value;

use qr_paste::clipboard::{ClipboardError, ClipboardImage, SystemClipboard};
use qr_paste::config::PopupConfig;
use qr_paste::decoder::{DecodeError, DecodeSurface, QrDecoder, NO_CODE_MESSAGE};
use qr_paste::history::{HistoryView, KeyValueStore, MemoryStore, StorageError, HISTORY_KEY};
use qr_paste::image_input::{ImageSource, PastedItem};
use qr_paste::presentation::DecodedResult;
use qr_paste::session::{
    PopupEvents, PopupSession, SubmitOutcome, COPIED_MESSAGE, COPY_FAILED_MESSAGE,
    DECODED_MESSAGE, HISTORY_CLEARED_MESSAGE, HISTORY_SAVE_FAILED_MESSAGE, MANUAL_PASTE_MESSAGE,
};
use qr_paste::status::{Severity, Status};

// ============================================================================
// 测试替身
// ============================================================================

#[derive(Default)]
struct RecordingEvents {
    statuses: Mutex<Vec<Status>>,
    results: Mutex<Vec<Option<DecodedResult>>>,
    histories: Mutex<Vec<HistoryView>>,
}

impl RecordingEvents {
    fn total(&self) -> usize {
        self.statuses.lock().unwrap().len()
            + self.results.lock().unwrap().len()
            + self.histories.lock().unwrap().len()
    }

    fn messages(&self) -> Vec<String> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.message.clone())
            .collect()
    }
}

impl PopupEvents for RecordingEvents {
    fn status_changed(&self, status: &Status) {
        self.statuses.lock().unwrap().push(status.clone());
    }

    fn result_changed(&self, result: Option<&DecodedResult>) {
        self.results.lock().unwrap().push(result.cloned());
    }

    fn history_changed(&self, view: &HistoryView) {
        self.histories.lock().unwrap().push(view.clone());
    }
}

/// 返回固定文本，并记录被调用次数与画布尺寸。
struct FixedDecoder {
    text: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl QrDecoder for FixedDecoder {
    fn decode(&self, _surface: &DecodeSurface) -> Result<String, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .ok_or_else(|| DecodeError::NotFound("no finder patterns".to_string()))
    }
}

/// 进入解码后阻塞，直到测试放行。
struct GateDecoder {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
    calls: Arc<AtomicUsize>,
}

impl QrDecoder for GateDecoder {
    fn decode(&self, _surface: &DecodeSurface) -> Result<String, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.entered.lock().unwrap().send(());
        let _ = self
            .release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(10));
        Ok("gated".to_string())
    }
}

#[derive(Default)]
struct FakeClipboard {
    image: Option<ClipboardImage>,
    reject_writes: bool,
    written: Mutex<Vec<String>>,
}

impl SystemClipboard for FakeClipboard {
    fn read_image(&self) -> Result<ClipboardImage, ClipboardError> {
        self.image
            .clone()
            .ok_or_else(|| ClipboardError::Unavailable("permission denied".to_string()))
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.reject_writes {
            return Err(ClipboardError::Rejected("not focused".to_string()));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.image.is_some()
    }
}

/// 读取正常、写入总是失败的存储。
#[derive(Default)]
struct ReadOnlyStore(MemoryStore);

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.0.get(key)
    }

    fn set(&self, _key: &str, _value: Value) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only volume",
        )))
    }
}

/// 记录写入发生在哪个线程。
#[derive(Default)]
struct ThreadRecordingStore {
    inner: MemoryStore,
    writers: Mutex<Vec<std::thread::ThreadId>>,
}

impl KeyValueStore for ThreadRecordingStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.writers.lock().unwrap().push(std::thread::current().id());
        self.inner.set(key, value)
    }
}

struct Harness {
    session: PopupSession,
    events: Arc<RecordingEvents>,
    store: Arc<MemoryStore>,
    clipboard: Arc<FakeClipboard>,
}

impl Harness {
    fn new(decoder: Box<dyn QrDecoder>) -> Self {
        Self::with_clipboard(decoder, FakeClipboard::default())
    }

    fn with_clipboard(decoder: Box<dyn QrDecoder>, clipboard: FakeClipboard) -> Self {
        let events = Arc::new(RecordingEvents::default());
        let store = Arc::new(MemoryStore::new());
        let clipboard = Arc::new(clipboard);
        let session = PopupSession::new(
            PopupConfig::default(),
            decoder,
            store.clone(),
            clipboard.clone(),
            events.clone(),
        );
        Self {
            session,
            events,
            store,
            clipboard,
        }
    }

    fn stored_len(&self) -> usize {
        self.store
            .get(HISTORY_KEY)
            .unwrap()
            .and_then(|v| v.as_array().map(|a| a.len()))
            .unwrap_or(0)
    }
}

fn fixed(text: Option<&str>) -> (Box<dyn QrDecoder>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let decoder = FixedDecoder {
        text: text.map(str::to_string),
        calls: calls.clone(),
    };
    (Box::new(decoder), calls)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn png_paste() -> ImageSource {
    let data = format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png_bytes(32, 32))
    );
    ImageSource::Paste(vec![PastedItem {
        mime_type: "image/png".to_string(),
        data: Some(data),
    }])
}

// ============================================================================
// 识别成功 / 失败
// ============================================================================

#[tokio::test]
async fn decoded_text_is_shown_and_prepended_to_history() {
    let (decoder, calls) = fixed(Some("https://example.com"));
    let harness = Harness::new(decoder);
    let before = chrono::Utc::now().timestamp_millis();

    let outcome = harness.session.submit(png_paste()).await;

    let SubmitOutcome::Decoded { result } = outcome else {
        panic!("expected decoded outcome, got {outcome:?}");
    };
    assert_eq!(result.text, "https://example.com");
    assert_eq!(result.link.as_deref(), Some("https://example.com/"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let status = harness.session.status();
    assert_eq!(status.message, DECODED_MESSAGE);
    assert_eq!(status.severity, Severity::Success);
    assert_eq!(harness.session.current_result(), Some(result));

    let view = harness.session.history_view().unwrap();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].preview, "https://example.com");
    assert!(view.rows[0].timestamp >= before);

    let messages = harness.events.messages();
    assert_eq!(messages, vec!["Decoding…".to_string(), DECODED_MESSAGE.to_string()]);
}

#[tokio::test]
async fn newest_decode_goes_first() {
    let (decoder, _) = fixed(Some("same text"));
    let harness = Harness::new(decoder);

    harness.session.submit(png_paste()).await;
    harness.session.submit(png_paste()).await;

    let view = harness.session.history_view().unwrap();
    assert_eq!(view.rows.len(), 2);
    assert!(view.rows[0].timestamp >= view.rows[1].timestamp);
}

#[tokio::test]
async fn decoder_failure_hides_result_and_reports_no_code() {
    let (decoder, calls) = fixed(None);
    let harness = Harness::new(decoder);

    let outcome = harness.session.submit(png_paste()).await;

    assert_eq!(outcome, SubmitOutcome::NoCode);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.session.status().message, NO_CODE_MESSAGE);
    assert_eq!(harness.session.status().severity, Severity::Error);
    assert_eq!(harness.session.current_result(), None);
    assert_eq!(harness.events.results.lock().unwrap().last(), Some(&None));
    assert_eq!(harness.stored_len(), 0);
    assert!(!harness.session.is_busy());
}

#[tokio::test]
async fn corrupt_image_is_reported_like_missing_code() {
    let (decoder, calls) = fixed(Some("never"));
    let harness = Harness::new(decoder);

    let source = ImageSource::Paste(vec![PastedItem {
        mime_type: "image/png".to_string(),
        data: Some(general_purpose::STANDARD.encode(b"definitely not a png")),
    }]);
    let outcome = harness.session.submit(source).await;

    assert_eq!(outcome, SubmitOutcome::NoCode);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.session.status().message, NO_CODE_MESSAGE);
}

// ============================================================================
// 获取与校验
// ============================================================================

#[tokio::test]
async fn non_image_file_is_rejected_without_decoding() {
    let (decoder, calls) = fixed(Some("never"));
    let harness = Harness::new(decoder);

    let dir = std::env::temp_dir().join(format!(
        "qr-paste-session-test-{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("report.pdf");
    std::fs::write(&path, b"%PDF-1.7 not an image").unwrap();

    let outcome = harness.session.submit(ImageSource::Drop(vec![path])).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            reason: "Unsupported file type.".to_string()
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.session.status().severity, Severity::Error);
    assert_eq!(harness.stored_len(), 0);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn oversized_image_is_rejected_regardless_of_content() {
    let (decoder, calls) = fixed(Some("never"));
    let harness = Harness::new(decoder);

    let dir = std::env::temp_dir().join(format!(
        "qr-paste-session-large-{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("huge.png");
    std::fs::write(&path, vec![0u8; 5 * 1024 * 1024 + 1]).unwrap();

    let outcome = harness.session.submit(ImageSource::FilePicker(Some(path))).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            reason: "Image too large (>5MB).".to_string()
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn empty_drop_reports_no_image() {
    let (decoder, _) = fixed(Some("never"));
    let harness = Harness::new(decoder);

    let outcome = harness.session.submit(ImageSource::Drop(Vec::new())).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            reason: "No image received.".to_string()
        }
    );
}

#[tokio::test]
async fn clipboard_read_failure_falls_back_to_manual_paste() {
    let (decoder, calls) = fixed(Some("never"));
    let harness = Harness::new(decoder);

    let outcome = harness.session.submit(ImageSource::ClipboardRead).await;

    assert_eq!(outcome, SubmitOutcome::ManualPaste);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let status = harness.session.status();
    assert_eq!(status.message, MANUAL_PASTE_MESSAGE);
    assert_eq!(status.severity, Severity::Info);
}

#[tokio::test]
async fn clipboard_image_is_decoded() {
    let (decoder, _) = fixed(Some("from clipboard"));
    let clipboard = FakeClipboard {
        image: Some(ClipboardImage {
            width: 4,
            height: 4,
            rgba: vec![255; 64],
        }),
        ..FakeClipboard::default()
    };
    let harness = Harness::with_clipboard(decoder, clipboard);

    let outcome = harness.session.submit(ImageSource::ClipboardRead).await;

    assert!(matches!(outcome, SubmitOutcome::Decoded { ref result } if result.text == "from clipboard"));
    assert!(harness.session.clipboard_available().await);
}

// ============================================================================
// 在途标志
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_submit_has_no_observable_effect() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let decoder = GateDecoder {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
        calls: calls.clone(),
    };
    let harness = Harness::new(Box::new(decoder));

    let first = {
        let session = harness.session.clone();
        tokio::spawn(async move { session.submit(png_paste()).await })
    };

    tokio::task::spawn_blocking(move || entered_rx.recv_timeout(Duration::from_secs(10)))
        .await
        .unwrap()
        .expect("first decode should start");
    assert!(harness.session.is_busy());

    let events_before = harness.events.total();
    let status_before = harness.session.status();

    let second = harness.session.submit(png_paste()).await;

    assert_eq!(second, SubmitOutcome::Ignored);
    assert_eq!(harness.events.total(), events_before);
    assert_eq!(harness.session.status(), status_before);

    release_tx.send(()).unwrap();
    let first = first.await.unwrap();

    assert!(matches!(first, SubmitOutcome::Decoded { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.stored_len(), 1);
    assert!(!harness.session.is_busy());

    // 标志已清除，下一次提交正常执行
    release_tx.send(()).unwrap();
    let third = harness.session.submit(png_paste()).await;
    assert!(matches!(third, SubmitOutcome::Decoded { .. }));
}

// ============================================================================
// 复制 / 历史
// ============================================================================

#[tokio::test]
async fn copy_writes_current_result() {
    let (decoder, _) = fixed(Some("WIFI:S:home;;"));
    let harness = Harness::new(decoder);

    assert!(!harness.session.copy_result().await);
    assert!(harness.events.messages().is_empty());

    harness.session.submit(png_paste()).await;
    assert!(harness.session.copy_result().await);

    assert_eq!(*harness.clipboard.written.lock().unwrap(), vec!["WIFI:S:home;;".to_string()]);
    assert_eq!(harness.session.status().message, COPIED_MESSAGE);
}

#[tokio::test]
async fn rejected_copy_reports_failure() {
    let (decoder, _) = fixed(Some("text"));
    let clipboard = FakeClipboard {
        reject_writes: true,
        ..FakeClipboard::default()
    };
    let harness = Harness::with_clipboard(decoder, clipboard);

    harness.session.submit(png_paste()).await;
    assert!(!harness.session.copy_result().await);

    let status = harness.session.status();
    assert_eq!(status.message, COPY_FAILED_MESSAGE);
    assert_eq!(status.severity, Severity::Error);
}

#[tokio::test]
async fn clear_history_empties_log() {
    let (decoder, _) = fixed(Some("text"));
    let harness = Harness::new(decoder);

    harness.session.submit(png_paste()).await;
    let view = harness.session.clear_history().unwrap();

    assert!(view.is_empty());
    assert!(harness.session.history_view().unwrap().is_empty());
    assert_eq!(harness.session.status().message, HISTORY_CLEARED_MESSAGE);
    assert_eq!(harness.session.status().severity, Severity::Info);
}

#[tokio::test]
async fn storage_failure_keeps_result_and_reports_error() {
    let (decoder, _) = fixed(Some("kept"));
    let events = Arc::new(RecordingEvents::default());
    let session = PopupSession::new(
        PopupConfig::default(),
        decoder,
        Arc::new(ReadOnlyStore::default()),
        Arc::new(FakeClipboard::default()),
        events.clone(),
    );

    let outcome = session.submit(png_paste()).await;

    assert!(matches!(outcome, SubmitOutcome::Decoded { .. }));
    assert_eq!(session.current_result().map(|r| r.text).as_deref(), Some("kept"));
    assert_eq!(session.status().message, HISTORY_SAVE_FAILED_MESSAGE);
    assert_eq!(session.status().severity, Severity::Error);
    assert!(session.clear_history().is_err());
}

#[tokio::test]
async fn history_write_runs_off_the_async_thread() {
    let (decoder, _) = fixed(Some("off thread"));
    let store = Arc::new(ThreadRecordingStore::default());
    let session = PopupSession::new(
        PopupConfig::default(),
        decoder,
        store.clone(),
        Arc::new(FakeClipboard::default()),
        Arc::new(RecordingEvents::default()),
    );

    let outcome = session.submit(png_paste()).await;

    assert!(matches!(outcome, SubmitOutcome::Decoded { .. }));
    let writers = store.writers.lock().unwrap().clone();
    assert_eq!(writers.len(), 1);
    assert_ne!(writers[0], std::thread::current().id());
}

#[test]
fn manual_paste_outcome_is_tagged_for_the_frontend() {
    assert_eq!(
        serde_json::to_value(SubmitOutcome::ManualPaste).unwrap(),
        serde_json::json!({ "kind": "manual_paste" })
    );
}
