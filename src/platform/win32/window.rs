//! Win32 window creation and management
//!
//! One OS class registration is shared by every window using the same class
//! name and dropped with the last of them. Each window dispatches its
//! translated messages to a per-window handler stored thread-locally, so all
//! window calls stay on the creating thread.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    GetMonitorInfoW, InvalidateRect, MonitorFromWindow, UpdateWindow, HBRUSH, MONITORINFO,
    MONITOR_DEFAULTTONEAREST, MONITOR_DEFAULTTOPRIMARY,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::HiDpi::GetDpiForSystem;
use windows::Win32::UI::WindowsAndMessaging::*;

use super::dpi::scale_px;
use super::event::{run_message_loop, translate_message, Event};
use crate::config::WindowConfig;
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect, Size};

// ── Border styles ─────────────────────────────────────────────────────────

/// Frame style of a top-level window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    /// Title bar, sizing frame, min/max boxes
    #[default]
    Sizable,
    /// Title bar and system menu, fixed size
    Fixed,
    /// Bare client area
    None,
}

impl BorderStyle {
    /// Win32 style bits for this border style
    pub(crate) fn window_style(self) -> WINDOW_STYLE {
        match self {
            BorderStyle::Sizable => WS_OVERLAPPEDWINDOW,
            BorderStyle::Fixed => WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU | WS_MINIMIZEBOX,
            BorderStyle::None => WS_POPUP,
        }
    }

    /// Recover the border style from live style bits
    pub(crate) fn from_window_style(style: WINDOW_STYLE) -> Self {
        if style.0 & WS_THICKFRAME.0 != 0 {
            BorderStyle::Sizable
        } else if style.0 & WS_CAPTION.0 == WS_CAPTION.0 {
            BorderStyle::Fixed
        } else {
            BorderStyle::None
        }
    }
}

/// Style bits for the fullscreen state: frame stripped, visibility kept
fn fullscreen_style(current: WINDOW_STYLE) -> WINDOW_STYLE {
    WINDOW_STYLE(WS_POPUP.0 | (current.0 & WS_VISIBLE.0))
}

/// Snapshot taken on entering fullscreen, applied verbatim on leaving
#[derive(Clone, Copy, Debug)]
struct SavedPlacement {
    rect: Rect,
    style: WINDOW_STYLE,
}

// ── Window class registration ─────────────────────────────────────────────

/// Reference counts per class name. Pure bookkeeping; the OS calls happen
/// at the retain-to-one and release-to-zero edges.
#[derive(Default)]
struct ClassRegistry {
    counts: HashMap<String, usize>,
}

impl ClassRegistry {
    /// Returns true when this is the first reference and the class must be
    /// registered with the OS
    fn retain(&mut self, name: &str) -> bool {
        let count = self.counts.entry(name.to_string()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Returns true when this was the last reference and the class must be
    /// unregistered with the OS
    fn release(&mut self, name: &str) -> bool {
        match self.counts.get_mut(name) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.counts.remove(name);
                true
            }
            None => false,
        }
    }

    fn is_registered(&self, name: &str) -> bool {
        self.counts.contains_key(name)
    }
}

thread_local! {
    static CLASS_REGISTRY: RefCell<ClassRegistry> = RefCell::new(ClassRegistry::default());
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Retain the named class, registering it with the OS on first use
fn register_class(name: &str) -> Result<()> {
    let first = CLASS_REGISTRY.with(|r| r.borrow_mut().retain(name));
    if !first {
        return Ok(());
    }

    if let Err(e) = register_class_os(name) {
        CLASS_REGISTRY.with(|r| r.borrow_mut().release(name));
        return Err(e);
    }
    Ok(())
}

fn register_class_os(name: &str) -> Result<()> {
    let wide_name = to_wide(name);
    unsafe {
        let hinstance = GetModuleHandleW(None).map_err(Error::ClassRegistration)?;

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(wnd_proc),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: hinstance.into(),
            hIcon: HICON::default(),
            hCursor: LoadCursorW(None, IDC_ARROW).map_err(Error::ClassRegistration)?,
            hbrBackground: HBRUSH::default(), // windows paint their whole client area
            lpszMenuName: PCWSTR::null(),
            lpszClassName: PCWSTR(wide_name.as_ptr()),
            hIconSm: HICON::default(),
        };

        let atom = RegisterClassExW(&wc);
        if atom == 0 {
            return Err(Error::ClassRegistration(windows::core::Error::from_win32()));
        }
        Ok(())
    }
}

/// Release the named class, unregistering it with the OS on last use
fn release_class(name: &str) {
    let last = CLASS_REGISTRY.with(|r| r.borrow_mut().release(name));
    if !last {
        return;
    }

    let wide_name = to_wide(name);
    unsafe {
        let _ = GetModuleHandleW(None).map(|h| {
            let _ = UnregisterClassW(PCWSTR(wide_name.as_ptr()), h);
        });
    }
}

/// True while any window uses the named class (diagnostics and tests)
pub fn class_is_registered(name: &str) -> bool {
    CLASS_REGISTRY.with(|r| r.borrow().is_registered(name))
}

// ── Handler dispatch ──────────────────────────────────────────────────────

type Handler = Rc<RefCell<Box<dyn FnMut(Event) -> bool>>>;

thread_local! {
    static HANDLERS: RefCell<HashMap<isize, Handler>> = RefCell::new(HashMap::new());
    static LIVE_WINDOWS: Cell<usize> = Cell::new(0);
}

fn set_handler_for<F>(hwnd: HWND, handler: F)
where
    F: FnMut(Event) -> bool + 'static,
{
    let handler: Handler = Rc::new(RefCell::new(Box::new(handler)));
    HANDLERS.with(|h| {
        h.borrow_mut().insert(hwnd.0 as isize, handler);
    });
}

fn remove_handler(hwnd: HWND) {
    HANDLERS.with(|h| {
        h.borrow_mut().remove(&(hwnd.0 as isize));
    });
}

/// Dispatch an event to the window's handler; false if unhandled
fn dispatch_to_handler(hwnd: HWND, event: Event) -> bool {
    let handler = HANDLERS.with(|h| h.borrow().get(&(hwnd.0 as isize)).cloned());
    let Some(handler) = handler else {
        return false;
    };

    // ShowWindow and friends can send messages synchronously from inside a
    // handler call; a re-entrant message falls through to default handling.
    match handler.try_borrow_mut() {
        Ok(mut callback) => (*callback)(event),
        Err(_) => {
            log!("re-entrant message dropped: {:?}", event);
            false
        }
    }
}

// ── Window procedure ──────────────────────────────────────────────────────

unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let handled = translate_message(msg, wparam, lparam)
        .map(|event| dispatch_to_handler(hwnd, event))
        .unwrap_or(false);

    // A consumed WM_DESTROY still must not skip teardown below.
    if handled && msg != WM_DESTROY {
        return LRESULT(0);
    }

    match msg {
        WM_CLOSE => {
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }
        WM_DESTROY => {
            remove_handler(hwnd);
            LRESULT(0)
        }
        WM_NCDESTROY => {
            let remaining = LIVE_WINDOWS.with(|l| {
                let n = l.get().saturating_sub(1);
                l.set(n);
                n
            });
            if remaining == 0 {
                PostQuitMessage(0);
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        WM_ERASEBKGND => {
            // Prevent background erase flickering
            LRESULT(1)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// ── Window ────────────────────────────────────────────────────────────────

/// A top-level native window
///
/// All methods must be called on the thread that opened the window. The OS
/// can destroy the handle out from under the object (close box, Alt+F4);
/// setters on a dead handle are no-ops and getters return defaults.
pub struct Window {
    hwnd: HWND,
    class_name: String,
    saved_placement: Option<SavedPlacement>,
}

impl Window {
    /// Register the class if needed and create the window
    pub fn open(config: &WindowConfig) -> Result<Self> {
        register_class(&config.class_name)?;

        let hwnd = match create_hwnd(config) {
            Ok(hwnd) => hwnd,
            Err(e) => {
                release_class(&config.class_name);
                return Err(Error::WindowCreation(e));
            }
        };
        LIVE_WINDOWS.with(|l| l.set(l.get() + 1));
        log!(
            "window created: hwnd={:?} class={:?}",
            hwnd,
            config.class_name
        );

        let mut window = Self {
            hwnd,
            class_name: config.class_name.clone(),
            saved_placement: None,
        };
        if config.visible {
            window.show();
        }
        Ok(window)
    }

    /// The raw OS handle (escape hatch for code this crate does not wrap)
    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Whether the handle still refers to a live window
    pub fn is_live(&self) -> bool {
        unsafe { IsWindow(self.hwnd).as_bool() }
    }

    /// Install the event handler; replaces any previous one
    ///
    /// Return true from the handler to consume the event. Consuming
    /// [`Event::CloseRequested`] keeps the window open.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: FnMut(Event) -> bool + 'static,
    {
        set_handler_for(self.hwnd, handler);
    }

    /// Remove the event handler
    pub fn clear_handler(&self) {
        remove_handler(self.hwnd);
    }

    /// Run the blocking message loop until the last window is destroyed
    pub fn run(&self) -> Result<()> {
        run_message_loop()
    }

    // ── Geometry ──────────────────────────────────────────────────────

    /// Outer bounds in screen pixels; zero rect when the handle is dead
    pub fn bounds(&self) -> Rect {
        let mut rect = RECT::default();
        if unsafe { GetWindowRect(self.hwnd, &mut rect) }.is_err() {
            return Rect::default();
        }
        Rect::new(
            rect.left,
            rect.top,
            rect.right - rect.left,
            rect.bottom - rect.top,
        )
    }

    /// Move and size in one call; sizes clamp to at least 1x1
    pub fn set_bounds(&self, bounds: Rect) {
        let size = bounds.size().clamped();
        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                None,
                bounds.x,
                bounds.y,
                size.width,
                size.height,
                SWP_NOZORDER | SWP_NOACTIVATE,
            );
        }
    }

    pub fn set_position(&self, position: Point) {
        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                None,
                position.x,
                position.y,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            );
        }
    }

    pub fn set_size(&self, size: Size) {
        let size = size.clamped();
        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                None,
                0,
                0,
                size.width,
                size.height,
                SWP_NOMOVE | SWP_NOZORDER | SWP_NOACTIVATE,
            );
        }
    }

    /// Client-area size in pixels; zero when the handle is dead
    pub fn client_size(&self) -> Size {
        let mut rect = RECT::default();
        if unsafe { GetClientRect(self.hwnd, &mut rect) }.is_err() {
            return Size::default();
        }
        Size::new(rect.right - rect.left, rect.bottom - rect.top)
    }

    // ── Title ─────────────────────────────────────────────────────────

    /// Title bar text; empty when the handle is dead
    pub fn title(&self) -> String {
        let mut buf = [0u16; 512];
        let len = unsafe { GetWindowTextW(self.hwnd, &mut buf) };
        if len <= 0 {
            return String::new();
        }
        String::from_utf16_lossy(&buf[..len as usize])
    }

    pub fn set_title(&self, title: &str) {
        let wide = to_wide(title);
        unsafe {
            let _ = SetWindowTextW(self.hwnd, PCWSTR(wide.as_ptr()));
        }
    }

    // ── Visibility and state ──────────────────────────────────────────

    pub fn show(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOW);
            let _ = UpdateWindow(self.hwnd);
        }
    }

    pub fn hide(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_HIDE);
        }
    }

    pub fn is_visible(&self) -> bool {
        unsafe { IsWindowVisible(self.hwnd).as_bool() }
    }

    pub fn minimize(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_MINIMIZE);
        }
    }

    pub fn maximize(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_MAXIMIZE);
        }
    }

    pub fn restore(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_RESTORE);
        }
    }

    pub fn is_minimized(&self) -> bool {
        unsafe { IsIconic(self.hwnd).as_bool() }
    }

    pub fn is_maximized(&self) -> bool {
        unsafe { IsZoomed(self.hwnd).as_bool() }
    }

    // ── Frame style ───────────────────────────────────────────────────

    /// Current border style, recovered from live style bits
    pub fn border_style(&self) -> BorderStyle {
        let style = unsafe { WINDOW_STYLE(GetWindowLongPtrW(self.hwnd, GWL_STYLE) as u32) };
        BorderStyle::from_window_style(style)
    }

    /// Swap the frame style in place, keeping position and size
    pub fn set_border_style(&mut self, border: BorderStyle) {
        if !self.is_live() || self.saved_placement.is_some() {
            return;
        }
        let visible = unsafe { GetWindowLongPtrW(self.hwnd, GWL_STYLE) } as u32 & WS_VISIBLE.0;
        let style = WINDOW_STYLE(border.window_style().0 | visible);
        unsafe {
            SetWindowLongPtrW(self.hwnd, GWL_STYLE, style.0 as isize);
            let _ = SetWindowPos(
                self.hwnd,
                None,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE | SWP_FRAMECHANGED,
            );
        }
    }

    // ── Fullscreen ────────────────────────────────────────────────────

    pub fn is_fullscreen(&self) -> bool {
        self.saved_placement.is_some()
    }

    /// Borderless fullscreen on the window's monitor
    ///
    /// Entering saves the current rect and style bits; leaving restores
    /// them exactly, so toggling twice is a round trip.
    pub fn set_fullscreen(&mut self, enable: bool) {
        if enable == self.saved_placement.is_some() || !self.is_live() {
            return;
        }

        if enable {
            let style = unsafe { WINDOW_STYLE(GetWindowLongPtrW(self.hwnd, GWL_STYLE) as u32) };
            let rect = self.bounds();

            let monitor = match monitor_rect(self.hwnd) {
                Some(rect) => rect,
                None => return,
            };

            unsafe {
                SetWindowLongPtrW(self.hwnd, GWL_STYLE, fullscreen_style(style).0 as isize);
                let _ = SetWindowPos(
                    self.hwnd,
                    HWND_TOP,
                    monitor.x,
                    monitor.y,
                    monitor.width,
                    monitor.height,
                    SWP_FRAMECHANGED,
                );
            }
            self.saved_placement = Some(SavedPlacement { rect, style });
            log!("fullscreen entered, saved {:?}", rect);
        } else if let Some(saved) = self.saved_placement.take() {
            unsafe {
                SetWindowLongPtrW(self.hwnd, GWL_STYLE, saved.style.0 as isize);
                let _ = SetWindowPos(
                    self.hwnd,
                    None,
                    saved.rect.x,
                    saved.rect.y,
                    saved.rect.width,
                    saved.rect.height,
                    SWP_NOZORDER | SWP_FRAMECHANGED,
                );
            }
            log!("fullscreen left, restored {:?}", saved.rect);
        }
    }

    // ── Painting and teardown ─────────────────────────────────────────

    /// Request a repaint of the whole client area
    pub fn invalidate(&self) {
        unsafe {
            let _ = InvalidateRect(self.hwnd, None, false);
        }
    }

    /// Destroy the window now; Drop does the same for a live handle
    pub fn close(&mut self) {
        if self.is_live() {
            unsafe {
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.clear_handler();
        self.close();
        release_class(&self.class_name);
    }
}

// ── Creation helpers ──────────────────────────────────────────────────────

/// Monitor rect for the window's monitor, in screen pixels
fn monitor_rect(hwnd: HWND) -> Option<Rect> {
    unsafe {
        let monitor = MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST);
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if !GetMonitorInfoW(monitor, &mut info).as_bool() {
            return None;
        }
        let m = info.rcMonitor;
        Some(Rect::new(m.left, m.top, m.right - m.left, m.bottom - m.top))
    }
}

/// Work-area rect of the primary monitor
fn primary_work_area() -> Rect {
    unsafe {
        let monitor = MonitorFromWindow(HWND::default(), MONITOR_DEFAULTTOPRIMARY);
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        let _ = GetMonitorInfoW(monitor, &mut info);
        let w = info.rcWork;
        Rect::new(w.left, w.top, w.right - w.left, w.bottom - w.top)
    }
}

fn create_hwnd(config: &WindowConfig) -> std::result::Result<HWND, windows::core::Error> {
    unsafe {
        let hinstance = GetModuleHandleW(None)?;

        let style = config.border.window_style();
        let dpi = GetDpiForSystem();

        // Configured size is the logical client area; grow to the outer
        // rect the frame needs.
        let client = config.logical_size();
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: scale_px(client.width, dpi),
            bottom: scale_px(client.height, dpi),
        };
        let _ = AdjustWindowRectEx(&mut rect, style, false, WINDOW_EX_STYLE(0));
        let width = rect.right - rect.left;
        let height = rect.bottom - rect.top;

        let (x, y) = match config.position {
            Some(p) => (p.x, p.y),
            None => {
                let work = primary_work_area();
                (
                    work.x + (work.width - width) / 2,
                    work.y + (work.height - height) / 2,
                )
            }
        };

        let class = to_wide(&config.class_name);
        let title = to_wide(&config.title);

        // Created hidden; Window::open shows it afterwards if configured.
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            PCWSTR(class.as_ptr()),
            PCWSTR(title.as_ptr()),
            style,
            x,
            y,
            width,
            height,
            None,
            None,
            hinstance,
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_registry_retain_release() {
        let mut registry = ClassRegistry::default();

        assert!(registry.retain("A"));
        assert!(!registry.retain("A"));
        assert!(registry.is_registered("A"));

        assert!(!registry.release("A"));
        assert!(registry.release("A"));
        assert!(!registry.is_registered("A"));
    }

    #[test]
    fn test_class_registry_single_window_round_trip() {
        // Open-then-dispose must leave nothing registered.
        let mut registry = ClassRegistry::default();
        assert!(registry.retain("OneShot"));
        assert!(registry.release("OneShot"));
        assert!(!registry.is_registered("OneShot"));
    }

    #[test]
    fn test_class_registry_release_unknown() {
        let mut registry = ClassRegistry::default();
        assert!(!registry.release("Nobody"));
    }

    #[test]
    fn test_class_registry_names_are_independent() {
        let mut registry = ClassRegistry::default();
        registry.retain("A");
        registry.retain("B");
        assert!(registry.release("A"));
        assert!(registry.is_registered("B"));
    }

    #[test]
    fn test_border_style_round_trip() {
        for border in [BorderStyle::Sizable, BorderStyle::Fixed, BorderStyle::None] {
            assert_eq!(BorderStyle::from_window_style(border.window_style()), border);
        }
    }

    #[test]
    fn test_fullscreen_style_strips_frame() {
        let style = fullscreen_style(WS_OVERLAPPEDWINDOW | WS_VISIBLE);
        assert_eq!(style.0 & WS_THICKFRAME.0, 0);
        assert_eq!(style.0 & WS_CAPTION.0, 0);
        assert_ne!(style.0 & WS_VISIBLE.0, 0);
    }

    #[test]
    fn test_fullscreen_style_on_hidden_window() {
        let style = fullscreen_style(WS_OVERLAPPEDWINDOW);
        assert_eq!(style.0 & WS_VISIBLE.0, 0);
    }
}
