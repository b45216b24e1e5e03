//! DPI awareness utilities
//!
//! Configured window sizes are logical (96 DPI) pixels; everything that
//! reaches the OS is physical. `scale_px`/`unscale_px` convert between the
//! two.

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::HiDpi::*;

/// Enable per-monitor DPI awareness (call before creating windows)
pub fn enable_dpi_awareness() -> Result<(), windows::core::Error> {
    unsafe {
        // Try V2 first (Windows 10 1703+)
        if SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2).is_ok() {
            return Ok(());
        }
        // Fall back to V1
        SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE)
    }
}

/// Get DPI for a specific window
pub fn get_window_dpi(hwnd: HWND) -> u32 {
    unsafe { GetDpiForWindow(hwnd) }
}

/// Scale a logical pixel value to physical pixels
pub fn scale_px(px: i32, dpi: u32) -> i32 {
    ((px as f64) * (dpi as f64) / 96.0).round() as i32
}

/// Convert a physical pixel value back to logical pixels
pub fn unscale_px(px: i32, dpi: u32) -> i32 {
    ((px as f64) * 96.0 / (dpi as f64)).round() as i32
}

/// DPI information struct
#[derive(Clone, Copy, Debug)]
pub struct DpiInfo {
    pub dpi: u32,
    pub scale_factor: f32,
}

impl DpiInfo {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi,
            scale_factor: dpi as f32 / 96.0,
        }
    }

    pub fn for_window(hwnd: HWND) -> Self {
        Self::new(get_window_dpi(hwnd))
    }

    pub fn default_96() -> Self {
        Self::new(96)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_px_identity_at_96() {
        assert_eq!(scale_px(100, 96), 100);
        assert_eq!(unscale_px(100, 96), 100);
    }

    #[test]
    fn test_scale_px_150_percent() {
        assert_eq!(scale_px(100, 144), 150);
        assert_eq!(unscale_px(150, 144), 100);
    }

    #[test]
    fn test_scale_px_rounds() {
        // 97 * 1.25 = 121.25 -> 121
        assert_eq!(scale_px(97, 120), 121);
    }

    #[test]
    fn test_dpi_info_scale_factor() {
        assert_eq!(DpiInfo::new(192).scale_factor, 2.0);
        assert_eq!(DpiInfo::default_96().scale_factor, 1.0);
    }
}
