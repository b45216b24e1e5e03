//! Event types and Win32 message translation
//!
//! Packed message parameters are decoded into plain value structs before
//! they reach a window handler, so handlers never see a WPARAM/LPARAM and
//! may keep event values as long as they like.

use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::error::{Error, Result};

/// Keyboard key codes (matching Win32 virtual key codes)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum KeyCode {
    // Letters
    A = 0x41,
    B = 0x42,
    C = 0x43,
    D = 0x44,
    E = 0x45,
    F = 0x46,
    G = 0x47,
    H = 0x48,
    I = 0x49,
    J = 0x4A,
    K = 0x4B,
    L = 0x4C,
    M = 0x4D,
    N = 0x4E,
    O = 0x4F,
    P = 0x50,
    Q = 0x51,
    R = 0x52,
    S = 0x53,
    T = 0x54,
    U = 0x55,
    V = 0x56,
    W = 0x57,
    X = 0x58,
    Y = 0x59,
    Z = 0x5A,

    // Numbers
    Num0 = 0x30,
    Num1 = 0x31,
    Num2 = 0x32,
    Num3 = 0x33,
    Num4 = 0x34,
    Num5 = 0x35,
    Num6 = 0x36,
    Num7 = 0x37,
    Num8 = 0x38,
    Num9 = 0x39,

    // Function keys
    F1 = 0x70,
    F2 = 0x71,
    F3 = 0x72,
    F4 = 0x73,
    F5 = 0x74,
    F6 = 0x75,
    F7 = 0x76,
    F8 = 0x77,
    F9 = 0x78,
    F10 = 0x79,
    F11 = 0x7A,
    F12 = 0x7B,

    // Navigation
    Left = 0x25,
    Up = 0x26,
    Right = 0x27,
    Down = 0x28,
    Home = 0x24,
    End = 0x23,
    PageUp = 0x21,
    PageDown = 0x22,

    // Editing
    Backspace = 0x08,
    Tab = 0x09,
    Enter = 0x0D,
    Escape = 0x1B,
    Space = 0x20,
    Delete = 0x2E,
    Insert = 0x2D,

    // Modifiers (for detecting state)
    Shift = 0x10,
    Control = 0x11,
    Alt = 0x12,

    // Misc
    CapsLock = 0x14,
    NumLock = 0x90,
    ScrollLock = 0x91,

    // Unknown key
    Unknown = 0,
}

impl KeyCode {
    /// Convert from Win32 virtual key code
    pub fn from_vk(vk: u32) -> Self {
        match vk {
            0x41 => KeyCode::A,
            0x42 => KeyCode::B,
            0x43 => KeyCode::C,
            0x44 => KeyCode::D,
            0x45 => KeyCode::E,
            0x46 => KeyCode::F,
            0x47 => KeyCode::G,
            0x48 => KeyCode::H,
            0x49 => KeyCode::I,
            0x4A => KeyCode::J,
            0x4B => KeyCode::K,
            0x4C => KeyCode::L,
            0x4D => KeyCode::M,
            0x4E => KeyCode::N,
            0x4F => KeyCode::O,
            0x50 => KeyCode::P,
            0x51 => KeyCode::Q,
            0x52 => KeyCode::R,
            0x53 => KeyCode::S,
            0x54 => KeyCode::T,
            0x55 => KeyCode::U,
            0x56 => KeyCode::V,
            0x57 => KeyCode::W,
            0x58 => KeyCode::X,
            0x59 => KeyCode::Y,
            0x5A => KeyCode::Z,
            0x30 => KeyCode::Num0,
            0x31 => KeyCode::Num1,
            0x32 => KeyCode::Num2,
            0x33 => KeyCode::Num3,
            0x34 => KeyCode::Num4,
            0x35 => KeyCode::Num5,
            0x36 => KeyCode::Num6,
            0x37 => KeyCode::Num7,
            0x38 => KeyCode::Num8,
            0x39 => KeyCode::Num9,
            0x70 => KeyCode::F1,
            0x71 => KeyCode::F2,
            0x72 => KeyCode::F3,
            0x73 => KeyCode::F4,
            0x74 => KeyCode::F5,
            0x75 => KeyCode::F6,
            0x76 => KeyCode::F7,
            0x77 => KeyCode::F8,
            0x78 => KeyCode::F9,
            0x79 => KeyCode::F10,
            0x7A => KeyCode::F11,
            0x7B => KeyCode::F12,
            0x25 => KeyCode::Left,
            0x26 => KeyCode::Up,
            0x27 => KeyCode::Right,
            0x28 => KeyCode::Down,
            0x24 => KeyCode::Home,
            0x23 => KeyCode::End,
            0x21 => KeyCode::PageUp,
            0x22 => KeyCode::PageDown,
            0x08 => KeyCode::Backspace,
            0x09 => KeyCode::Tab,
            0x0D => KeyCode::Enter,
            0x1B => KeyCode::Escape,
            0x20 => KeyCode::Space,
            0x2E => KeyCode::Delete,
            0x2D => KeyCode::Insert,
            0x10 => KeyCode::Shift,
            0x11 => KeyCode::Control,
            0x12 => KeyCode::Alt,
            0x14 => KeyCode::CapsLock,
            0x90 => KeyCode::NumLock,
            0x91 => KeyCode::ScrollLock,
            _ => KeyCode::Unknown,
        }
    }

    /// Check if this is a printable character key
    pub fn is_printable(&self) -> bool {
        let code = *self as u32;
        // A-Z: 0x41-0x5A, 0-9: 0x30-0x39, Space: 0x20
        (0x41..=0x5A).contains(&code) || (0x30..=0x39).contains(&code) || code == 0x20
    }
}

/// Modifier key state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Get current modifier state from the OS
    ///
    /// Polled live rather than tracked from message flags, so the state is
    /// correct even for messages synthesized while a modifier was held.
    pub fn current() -> Self {
        use windows::Win32::UI::Input::KeyboardAndMouse::GetKeyState;
        unsafe {
            Self {
                shift: GetKeyState(0x10) < 0, // VK_SHIFT
                ctrl: GetKeyState(0x11) < 0,  // VK_CONTROL
                alt: GetKeyState(0x12) < 0,   // VK_MENU (Alt)
            }
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Mouse button
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// A mouse button or motion event, in client coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseEvent {
    pub x: i32,
    pub y: i32,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

/// A key transition event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifiers: Modifiers,
    /// True when the key was already down (auto-repeat)
    pub repeat: bool,
}

/// Window events
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// Key pressed
    KeyDown(KeyEvent),
    /// Key released
    KeyUp(KeyEvent),
    /// Character typed (after keyboard translation)
    Char(char),
    /// Mouse button pressed
    MouseDown(MouseEvent),
    /// Mouse button released
    MouseUp(MouseEvent),
    /// Mouse moved
    MouseMove {
        x: i32,
        y: i32,
        modifiers: Modifiers,
    },
    /// Vertical wheel, in notches; positive is away from the user
    Wheel {
        x: i32,
        y: i32,
        delta: f32,
        modifiers: Modifiers,
    },
    /// Client area resized
    Resized { width: i32, height: i32 },
    /// Window moved, client origin in screen coordinates
    Moved { x: i32, y: i32 },
    /// Window needs repainting
    Paint,
    /// Window received focus
    FocusGained,
    /// Window lost focus
    FocusLost,
    /// DPI changed, new DPI value
    DpiChanged(u32),
    /// Close box / Alt+F4; consume to prevent destruction
    CloseRequested,
    /// Window is being destroyed
    Destroyed,
}

// ── Packed parameter decoding ─────────────────────────────────────────────

/// Client coordinates from a mouse-message lparam (signed 16-bit words)
pub fn point_from_lparam(lparam: isize) -> (i32, i32) {
    let x = (lparam & 0xFFFF) as u16 as i16 as i32;
    let y = ((lparam >> 16) & 0xFFFF) as u16 as i16 as i32;
    (x, y)
}

/// Client size from a WM_SIZE lparam (unsigned 16-bit words)
pub fn size_from_lparam(lparam: isize) -> (i32, i32) {
    let width = (lparam & 0xFFFF) as i32;
    let height = ((lparam >> 16) & 0xFFFF) as i32;
    (width, height)
}

/// Wheel notches from a WM_MOUSEWHEEL wparam (high word, WHEEL_DELTA units)
pub fn wheel_from_wparam(wparam: usize) -> f32 {
    let raw = ((wparam >> 16) & 0xFFFF) as u16 as i16;
    raw as f32 / 120.0
}

/// Auto-repeat flag from a key-message lparam (bit 30: previous key state)
pub fn repeat_from_lparam(lparam: isize) -> bool {
    lparam & (1 << 30) != 0
}

/// Translate a Win32 message to an [`Event`]
///
/// Returns `None` for messages this crate does not surface; the window
/// procedure passes those to `DefWindowProcW`.
pub fn translate_message(msg: u32, wparam: WPARAM, lparam: LPARAM) -> Option<Event> {
    match msg {
        WM_KEYDOWN | WM_SYSKEYDOWN => Some(Event::KeyDown(KeyEvent {
            key: KeyCode::from_vk(wparam.0 as u32),
            modifiers: Modifiers::current(),
            repeat: repeat_from_lparam(lparam.0),
        })),
        WM_KEYUP | WM_SYSKEYUP => Some(Event::KeyUp(KeyEvent {
            key: KeyCode::from_vk(wparam.0 as u32),
            modifiers: Modifiers::current(),
            repeat: false,
        })),
        WM_CHAR => {
            // wparam contains the UTF-16 code unit
            let code = wparam.0 as u16;
            if let Some(ch) = char::from_u32(code as u32) {
                // Control characters other than tab are not surfaced
                if ch >= ' ' || ch == '\t' {
                    return Some(Event::Char(ch));
                }
            }
            None
        }
        WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN => {
            let (x, y) = point_from_lparam(lparam.0);
            Some(Event::MouseDown(MouseEvent {
                x,
                y,
                button: button_for_message(msg),
                modifiers: Modifiers::current(),
            }))
        }
        WM_LBUTTONUP | WM_RBUTTONUP | WM_MBUTTONUP => {
            let (x, y) = point_from_lparam(lparam.0);
            Some(Event::MouseUp(MouseEvent {
                x,
                y,
                button: button_for_message(msg),
                modifiers: Modifiers::current(),
            }))
        }
        WM_MOUSEMOVE => {
            let (x, y) = point_from_lparam(lparam.0);
            Some(Event::MouseMove {
                x,
                y,
                modifiers: Modifiers::current(),
            })
        }
        WM_MOUSEWHEEL => {
            // Wheel coordinates arrive in screen space
            let (x, y) = point_from_lparam(lparam.0);
            Some(Event::Wheel {
                x,
                y,
                delta: wheel_from_wparam(wparam.0),
                modifiers: Modifiers::current(),
            })
        }
        WM_SIZE => {
            let (width, height) = size_from_lparam(lparam.0);
            Some(Event::Resized { width, height })
        }
        WM_MOVE => {
            let (x, y) = point_from_lparam(lparam.0);
            Some(Event::Moved { x, y })
        }
        WM_PAINT => Some(Event::Paint),
        WM_SETFOCUS => Some(Event::FocusGained),
        WM_KILLFOCUS => Some(Event::FocusLost),
        WM_DPICHANGED => {
            let dpi = (wparam.0 & 0xFFFF) as u32;
            Some(Event::DpiChanged(dpi))
        }
        WM_CLOSE => Some(Event::CloseRequested),
        WM_DESTROY => Some(Event::Destroyed),
        _ => None,
    }
}

fn button_for_message(msg: u32) -> MouseButton {
    match msg {
        WM_LBUTTONDOWN | WM_LBUTTONUP => MouseButton::Left,
        WM_RBUTTONDOWN | WM_RBUTTONUP => MouseButton::Right,
        _ => MouseButton::Middle,
    }
}

// ── Message loops ─────────────────────────────────────────────────────────

/// Run the blocking message loop until WM_QUIT
pub fn run_message_loop() -> Result<()> {
    unsafe {
        let mut msg = MSG::default();
        loop {
            let ret = GetMessageW(&mut msg, None, 0, 0);
            match ret.0 {
                -1 => return Err(Error::MessageLoop(windows::core::Error::from_win32())),
                0 => return Ok(()),
                _ => {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }
    }
}

/// Drain all pending messages without blocking
///
/// Returns false once WM_QUIT has been retrieved; callers use this as the
/// render loop's continue condition.
pub fn pump_messages() -> bool {
    unsafe {
        let mut msg = MSG::default();
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            if msg.message == WM_QUIT {
                return false;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    true
}

/// Post a quit message, ending any loop on this thread
pub fn post_quit() {
    unsafe {
        PostQuitMessage(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack_point(x: i16, y: i16) -> isize {
        ((y as u16 as isize) << 16) | (x as u16 as isize)
    }

    #[test]
    fn test_point_from_lparam_positive() {
        assert_eq!(point_from_lparam(pack_point(100, 250)), (100, 250));
    }

    #[test]
    fn test_point_from_lparam_sign_extends() {
        // Mouse capture can report client coordinates left/above the origin.
        assert_eq!(point_from_lparam(pack_point(-10, -1)), (-10, -1));
        assert_eq!(point_from_lparam(pack_point(-32768, 32767)), (-32768, 32767));
    }

    #[test]
    fn test_size_from_lparam_is_unsigned() {
        let lparam = ((40000u16 as isize) << 16) | 33000u16 as isize;
        assert_eq!(size_from_lparam(lparam), (33000, 40000));
    }

    #[test]
    fn test_wheel_from_wparam() {
        assert_eq!(wheel_from_wparam((120usize) << 16), 1.0);
        assert_eq!(wheel_from_wparam(((-240i16) as u16 as usize) << 16), -2.0);
        // Free-spinning wheels report fractions of a notch
        assert_eq!(wheel_from_wparam((60usize) << 16), 0.5);
    }

    #[test]
    fn test_repeat_from_lparam() {
        assert!(repeat_from_lparam(1 << 30));
        assert!(!repeat_from_lparam(1));
    }

    #[test]
    fn test_keycode_from_vk() {
        assert_eq!(KeyCode::from_vk(0x41), KeyCode::A);
        assert_eq!(KeyCode::from_vk(0x5A), KeyCode::Z);
        assert_eq!(KeyCode::from_vk(0x30), KeyCode::Num0);
        assert_eq!(KeyCode::from_vk(0x7B), KeyCode::F12);
        assert_eq!(KeyCode::from_vk(0x1B), KeyCode::Escape);
        assert_eq!(KeyCode::from_vk(0xFF), KeyCode::Unknown);
    }

    #[test]
    fn test_keycode_discriminants_match_vk() {
        // from_vk must invert the discriminant for every named key.
        for vk in [0x41u32, 0x39, 0x70, 0x25, 0x0D, 0x20, 0x91] {
            assert_eq!(KeyCode::from_vk(vk) as u32, vk);
        }
    }

    #[test]
    fn test_is_printable() {
        assert!(KeyCode::A.is_printable());
        assert!(KeyCode::Num7.is_printable());
        assert!(KeyCode::Space.is_printable());
        assert!(!KeyCode::F1.is_printable());
        assert!(!KeyCode::Escape.is_printable());
    }

    #[test]
    fn test_button_for_message() {
        assert_eq!(button_for_message(WM_LBUTTONDOWN), MouseButton::Left);
        assert_eq!(button_for_message(WM_RBUTTONUP), MouseButton::Right);
        assert_eq!(button_for_message(WM_MBUTTONDOWN), MouseButton::Middle);
    }
}
