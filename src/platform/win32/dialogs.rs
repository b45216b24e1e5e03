//! Modal message box and common file dialogs
//!
//! Dialogs are modal and must run on the window thread. Cancellation is
//! `None`, never an error; a dialog that fails outright logs the extended
//! error code and also reports `None`.

use std::path::{Path, PathBuf};

use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Controls::Dialogs::{
    CommDlgExtendedError, GetOpenFileNameW, GetSaveFileNameW, OFN_ALLOWMULTISELECT, OFN_EXPLORER,
    OFN_FILEMUSTEXIST, OFN_HIDEREADONLY, OFN_OVERWRITEPROMPT, OFN_PATHMUSTEXIST, OPENFILENAMEW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    MessageBoxW, IDCANCEL, IDNO, IDOK, IDRETRY, IDYES, MB_ICONERROR, MB_ICONINFORMATION,
    MB_ICONQUESTION, MB_ICONWARNING, MB_OK, MB_OKCANCEL, MB_RETRYCANCEL, MB_YESNO, MB_YESNOCANCEL,
    MESSAGEBOX_STYLE,
};

use super::window::Window;

/// Maximum path buffer length in WCHARs, including the null terminator.
/// MAX_PATH (260) is too short for modern Windows paths; 32 768 is the
/// documented maximum for `\\?\` extended paths, and multi-select results
/// have to fit many of them.
const PATH_BUF_LEN: usize = 32_768;

// ── Message box ───────────────────────────────────────────────────────────

/// Button set shown on a message box
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageBoxButtons {
    Ok,
    OkCancel,
    YesNo,
    YesNoCancel,
    RetryCancel,
}

/// Icon shown on a message box
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageBoxIcon {
    None,
    Info,
    Warning,
    Error,
    Question,
}

/// Button the user dismissed the message box with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageBoxResult {
    Ok,
    Cancel,
    Yes,
    No,
    Retry,
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Show a modal message box owned by `owner` (or free-standing)
pub fn message_box(
    owner: Option<&Window>,
    title: &str,
    text: &str,
    buttons: MessageBoxButtons,
    icon: MessageBoxIcon,
) -> MessageBoxResult {
    let style: MESSAGEBOX_STYLE = match buttons {
        MessageBoxButtons::Ok => MB_OK,
        MessageBoxButtons::OkCancel => MB_OKCANCEL,
        MessageBoxButtons::YesNo => MB_YESNO,
        MessageBoxButtons::YesNoCancel => MB_YESNOCANCEL,
        MessageBoxButtons::RetryCancel => MB_RETRYCANCEL,
    } | match icon {
        MessageBoxIcon::None => MESSAGEBOX_STYLE(0),
        MessageBoxIcon::Info => MB_ICONINFORMATION,
        MessageBoxIcon::Warning => MB_ICONWARNING,
        MessageBoxIcon::Error => MB_ICONERROR,
        MessageBoxIcon::Question => MB_ICONQUESTION,
    };

    let text_wide = to_wide(text);
    let title_wide = to_wide(title);
    let hwnd = owner.map(|w| w.hwnd()).unwrap_or_default();

    let result = unsafe {
        MessageBoxW(
            hwnd,
            PCWSTR(text_wide.as_ptr()),
            PCWSTR(title_wide.as_ptr()),
            style,
        )
    };

    match result {
        IDOK => MessageBoxResult::Ok,
        IDYES => MessageBoxResult::Yes,
        IDNO => MessageBoxResult::No,
        IDRETRY => MessageBoxResult::Retry,
        IDCANCEL => MessageBoxResult::Cancel,
        _ => MessageBoxResult::Cancel,
    }
}

// ── File dialogs ──────────────────────────────────────────────────────────

/// Builder for the open/save common dialogs
#[derive(Clone, Debug, Default)]
pub struct FileDialog {
    filters: Vec<(String, String)>,
    default_name: String,
    initial_dir: Option<PathBuf>,
    multi_select: bool,
}

impl FileDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter, e.g. `("Text Files (*.txt)", "*.txt")`
    pub fn filter(mut self, label: &str, pattern: &str) -> Self {
        self.filters.push((label.to_string(), pattern.to_string()));
        self
    }

    /// Pre-populate the filename field (save dialog)
    pub fn default_name(mut self, name: &str) -> Self {
        self.default_name = name.to_string();
        self
    }

    pub fn initial_dir(mut self, dir: &Path) -> Self {
        self.initial_dir = Some(dir.to_path_buf());
        self
    }

    /// Allow selecting more than one file in the open dialog
    pub fn multi_select(mut self, multi: bool) -> Self {
        self.multi_select = multi;
        self
    }

    /// Show the "Open File" dialog
    ///
    /// Returns the chosen paths, or `None` if the user cancelled.
    pub fn show_open(&self, owner: Option<&Window>) -> Option<Vec<PathBuf>> {
        let mut buf = vec![0u16; PATH_BUF_LEN];
        let filter = encode_filter(&self.filters);
        let initial_dir = self.initial_dir.as_ref().map(|d| to_wide_path(d));

        let mut flags = OFN_FILEMUSTEXIST | OFN_PATHMUSTEXIST | OFN_HIDEREADONLY;
        if self.multi_select {
            flags |= OFN_EXPLORER | OFN_ALLOWMULTISELECT;
        }

        let mut ofn = OPENFILENAMEW {
            lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
            hwndOwner: owner.map(|w| w.hwnd()).unwrap_or_default(),
            lpstrFilter: PCWSTR(filter.as_ptr()),
            lpstrFile: windows::core::PWSTR(buf.as_mut_ptr()),
            nMaxFile: PATH_BUF_LEN as u32,
            lpstrInitialDir: initial_dir
                .as_ref()
                .map(|d| PCWSTR(d.as_ptr()))
                .unwrap_or(PCWSTR::null()),
            Flags: flags,
            ..Default::default()
        };

        let ok = unsafe { GetOpenFileNameW(&mut ofn) };
        if !ok.as_bool() {
            log_dialog_cancel();
            return None;
        }

        let paths = parse_open_buffer(&buf);
        if paths.is_empty() {
            return None;
        }
        Some(paths)
    }

    /// Show the "Save As" dialog
    ///
    /// Returns the chosen path, or `None` if the user cancelled.
    pub fn show_save(&self, owner: Option<&Window>) -> Option<PathBuf> {
        // Pre-populate the buffer with the default filename.
        let mut buf: Vec<u16> = self
            .default_name
            .encode_utf16()
            .chain(std::iter::repeat(0))
            .take(PATH_BUF_LEN)
            .collect();
        let filter = encode_filter(&self.filters);
        let initial_dir = self.initial_dir.as_ref().map(|d| to_wide_path(d));

        let mut ofn = OPENFILENAMEW {
            lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
            hwndOwner: owner.map(|w| w.hwnd()).unwrap_or_default(),
            lpstrFilter: PCWSTR(filter.as_ptr()),
            lpstrFile: windows::core::PWSTR(buf.as_mut_ptr()),
            nMaxFile: PATH_BUF_LEN as u32,
            lpstrInitialDir: initial_dir
                .as_ref()
                .map(|d| PCWSTR(d.as_ptr()))
                .unwrap_or(PCWSTR::null()),
            Flags: OFN_OVERWRITEPROMPT | OFN_PATHMUSTEXIST,
            ..Default::default()
        };

        let ok = unsafe { GetSaveFileNameW(&mut ofn) };
        if !ok.as_bool() {
            log_dialog_cancel();
            return None;
        }

        Some(PathBuf::from(string_from_buf(&buf)))
    }
}

/// Distinguish a real cancel from a dialog failure in the log
fn log_dialog_cancel() {
    let code = unsafe { CommDlgExtendedError() };
    if code.0 != 0 {
        log!("common dialog failed, extended error {:#06x}", code.0);
    }
}

// ── Buffer layout ─────────────────────────────────────────────────────────
//
// The dialog returns null-separated strings with a double-null terminator.
// Single select: "C:\full\path.txt\0\0". Multi select (OFN_EXPLORER):
// "C:\dir\0file1.txt\0file2.txt\0\0", directory first, then bare names.

fn to_wide_path(path: &Path) -> Vec<u16> {
    path.as_os_str()
        .to_string_lossy()
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect()
}

/// First null-terminated string in the buffer
fn string_from_buf(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

/// All strings up to the double-null terminator
fn split_null_separated(buf: &[u16]) -> Vec<String> {
    let mut strings = Vec::new();
    let mut start = 0;

    for (i, &c) in buf.iter().enumerate() {
        if c == 0 {
            if i == start {
                break; // empty string: end of list
            }
            strings.push(String::from_utf16_lossy(&buf[start..i]));
            start = i + 1;
        }
    }
    strings
}

/// Decode an open-dialog result buffer into full paths
///
/// One string before the terminator is a complete path; two or more mean a
/// directory followed by filenames within it.
fn parse_open_buffer(buf: &[u16]) -> Vec<PathBuf> {
    let mut strings = split_null_separated(buf);

    match strings.len() {
        0 => Vec::new(),
        1 => vec![PathBuf::from(strings.remove(0))],
        _ => {
            let dir = PathBuf::from(strings.remove(0));
            strings.into_iter().map(|name| dir.join(name)).collect()
        }
    }
}

/// Encode filters as null-separated label/pattern pairs, double-null ended
fn encode_filter(filters: &[(String, String)]) -> Vec<u16> {
    let mut joined = String::new();
    if filters.is_empty() {
        joined.push_str("All Files (*.*)\0*.*\0");
    } else {
        for (label, pattern) in filters {
            joined.push_str(label);
            joined.push('\0');
            joined.push_str(pattern);
            joined.push('\0');
        }
    }
    joined.push('\0');
    joined.encode_utf16().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_parse_single_path() {
        let buf = wide("C:\\a.txt\0\0");
        assert_eq!(parse_open_buffer(&buf), vec![PathBuf::from("C:\\a.txt")]);
    }

    #[test]
    fn test_parse_multi_select() {
        let buf = wide("C:\\dir\0a.txt\0b.txt\0\0");
        assert_eq!(
            parse_open_buffer(&buf),
            vec![
                PathBuf::from("C:\\dir\\a.txt"),
                PathBuf::from("C:\\dir\\b.txt"),
            ]
        );
    }

    #[test]
    fn test_parse_empty_buffer() {
        assert!(parse_open_buffer(&wide("\0\0")).is_empty());
        assert!(parse_open_buffer(&[]).is_empty());
    }

    #[test]
    fn test_parse_ignores_trailing_garbage() {
        // Only the region before the double null is meaningful.
        let buf = wide("C:\\a.txt\0\0leftover\0");
        assert_eq!(parse_open_buffer(&buf), vec![PathBuf::from("C:\\a.txt")]);
    }

    #[test]
    fn test_string_from_buf_stops_at_null() {
        let buf = wide("C:\\out.txt\0junk");
        assert_eq!(string_from_buf(&buf), "C:\\out.txt");
    }

    #[test]
    fn test_encode_filter_layout() {
        let filter = encode_filter(&[("Text Files (*.txt)".into(), "*.txt".into())]);
        let expected = wide("Text Files (*.txt)\0*.txt\0\0");
        assert_eq!(filter, expected);
    }

    #[test]
    fn test_encode_filter_default() {
        let filter = encode_filter(&[]);
        assert_eq!(filter, wide("All Files (*.*)\0*.*\0\0"));
        // Double-null terminated
        assert_eq!(&filter[filter.len() - 2..], &[0, 0]);
    }

    #[test]
    fn test_builder_accumulates() {
        let dialog = FileDialog::new()
            .filter("Text Files (*.txt)", "*.txt")
            .filter("All Files (*.*)", "*.*")
            .default_name("report.txt")
            .multi_select(true);
        assert_eq!(dialog.filters.len(), 2);
        assert_eq!(dialog.default_name, "report.txt");
        assert!(dialog.multi_select);
    }
}
