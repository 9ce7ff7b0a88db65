//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time fed into the session's virtual clock
//! - Run seeds
//! - JS bindings (web only)

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Monotonic-enough milliseconds since an arbitrary epoch
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    #[cfg(not(target_arch = "wasm32"))]
    start: std::time::Instant,
    #[cfg(target_arch = "wasm32")]
    start: f64,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            start: std::time::Instant::now(),
            #[cfg(target_arch = "wasm32")]
            start: js_sys::Date::now(),
        }
    }

    /// Milliseconds since `start`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Milliseconds since `start`
    #[cfg(target_arch = "wasm32")]
    pub fn elapsed_ms(&self) -> u64 {
        (js_sys::Date::now() - self.start).max(0.0) as u64
    }
}

/// Seed for a new run, taken from the wall clock
pub fn clock_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    }
}
