#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(test)]
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Milliseconds since the Unix epoch.
#[cfg(target_arch = "wasm32")]
pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// Milliseconds since the Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Formats an elapsed duration for the ticking display and the stored run.
///
/// Under a minute: `12.3s`. Otherwise: `2m 05s`.
pub(crate) fn format_elapsed(elapsed_ms: i64) -> String {
    let ms = elapsed_ms.max(0);
    if ms < 60_000 {
        let tenths = ms / 100;
        format!("{}.{}s", tenths / 10, tenths % 10)
    } else {
        let secs = ms / 1000;
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Local date/time label for a stored timestamp.
#[cfg(target_arch = "wasm32")]
pub(crate) fn format_timestamp(ms: i64) -> String {
    let d = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(ms as f64));
    d.to_locale_string("default", &wasm_bindgen::JsValue::UNDEFINED)
        .as_string()
        .unwrap_or_default()
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn format_timestamp(ms: i64) -> String {
    format!("{ms}")
}

/// Uniform sample in `[0, 1)`.
pub(crate) fn random_unit() -> f64 {
    let mut buf = [0u8; 8];
    if getrandom::getrandom(&mut buf).is_err() {
        return 0.5;
    }
    // 53 random bits -> f64 mantissa.
    let bits = u64::from_le_bytes(buf) >> 11;
    bits as f64 / (1u64 << 53) as f64
}

pub(crate) fn random_index(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    ((random_unit() * len as f64) as usize).min(len - 1)
}

/// Rounds to two decimals, the precision the compound cards display.
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Suspends for `ms` milliseconds on the browser event loop.
#[cfg(target_arch = "wasm32")]
pub(crate) async fn sleep_ms(ms: u32) {
    if ms > 0 {
        gloo_timers::future::TimeoutFuture::new(ms).await;
    }
}

/// Headless builds have no event loop to park on; delays collapse to zero.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) async fn sleep_ms(_ms: u32) {}

// ============================================================================
// Repeating timers
// ============================================================================

/// Handle to a running repeating timer.
pub(crate) trait IntervalGuard: Send {
    fn stop(&self);
}

/// Starts repeating timers. Injected so page state machines can be driven
/// by hand in tests.
pub(crate) trait IntervalScheduler: Send + Sync {
    fn start(&self, period: Duration, tick: Box<dyn Fn() + Send + 'static>)
        -> Box<dyn IntervalGuard>;
}

/// `setInterval`-backed scheduler.
pub(crate) struct BrowserIntervals;

struct BrowserIntervalGuard(Option<leptos::prelude::IntervalHandle>);

impl IntervalGuard for BrowserIntervalGuard {
    fn stop(&self) {
        if let Some(handle) = self.0 {
            handle.clear();
        }
    }
}

impl IntervalScheduler for BrowserIntervals {
    fn start(
        &self,
        period: Duration,
        tick: Box<dyn Fn() + Send + 'static>,
    ) -> Box<dyn IntervalGuard> {
        match leptos::prelude::set_interval_with_handle(move || tick(), period) {
            Ok(handle) => Box::new(BrowserIntervalGuard(Some(handle))),
            Err(e) => {
                leptos::logging::warn!("[util] setInterval failed: {e:?}");
                Box::new(BrowserIntervalGuard(None))
            }
        }
    }
}

/// Scheduler whose timers only fire when [`ManualIntervals::fire`] is called.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct ManualIntervals {
    inner: Arc<ManualInner>,
}

#[cfg(test)]
#[derive(Default)]
struct ManualInner {
    started: AtomicUsize,
    timers: Mutex<Vec<ManualTimer>>,
}

#[cfg(test)]
struct ManualTimer {
    id: usize,
    tick: Box<dyn Fn() + Send + 'static>,
}

#[cfg(test)]
struct ManualGuard {
    id: usize,
    inner: Arc<ManualInner>,
}

#[cfg(test)]
impl IntervalGuard for ManualGuard {
    fn stop(&self) {
        if let Ok(mut timers) = self.inner.timers.lock() {
            timers.retain(|t| t.id != self.id);
        }
    }
}

#[cfg(test)]
impl IntervalScheduler for ManualIntervals {
    fn start(
        &self,
        _period: Duration,
        tick: Box<dyn Fn() + Send + 'static>,
    ) -> Box<dyn IntervalGuard> {
        let id = self.inner.started.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut timers) = self.inner.timers.lock() {
            timers.push(ManualTimer { id, tick });
        }
        Box::new(ManualGuard {
            id,
            inner: self.inner.clone(),
        })
    }
}

#[cfg(test)]
impl ManualIntervals {
    /// Runs every live timer once.
    pub fn fire(&self) {
        if let Ok(timers) = self.inner.timers.lock() {
            for t in timers.iter() {
                (t.tick)();
            }
        }
    }

    pub fn active(&self) -> usize {
        self.inner.timers.lock().map(|t| t.len()).unwrap_or_default()
    }

    pub fn started(&self) -> usize {
        self.inner.started.load(Ordering::SeqCst)
    }
}
