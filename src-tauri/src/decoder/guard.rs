//! # 在途标志
//!
//! 同一时间最多只有一次识别在进行。新请求到来时若已有识别在途，直接忽略，
//! 既不排队也不提示。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 在途识别的 RAII 守卫。
///
/// 通过 CAS 获取；`Drop` 时无条件清除标志，识别成功、失败或 panic 都会执行。
///
/// # 示例
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::AtomicBool;
/// use qr_paste::decoder::InFlightGuard;
///
/// let flag = Arc::new(AtomicBool::new(false));
/// let guard = InFlightGuard::try_acquire(&flag).expect("idle");
/// assert!(InFlightGuard::try_acquire(&flag).is_none());
/// drop(guard);
/// assert!(InFlightGuard::try_acquire(&flag).is_some());
/// ```
#[must_use = "释放守卫即清除在途标志"]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    /// 尝试获取在途标志；已被占用时返回 `None`。
    pub fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
