//! Direct2D rendering
//!
//! A [`Renderer`] wraps the Direct2D/DirectWrite factories and a lazily
//! created HWND render target. [`RenderWindow`] composes a [`Window`] with a
//! renderer and a deferred-action queue into a frame-paced render loop.
//!
//! Device loss is the one recoverable render failure: when `EndDraw`
//! reports `D2DERR_RECREATE_TARGET` the target and brush cache are thrown
//! away and rebuilt on the next frame. Every other failure propagates.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct2D::Common::*;
use windows::Win32::Graphics::Direct2D::*;
use windows::Win32::Graphics::DirectWrite::*;
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_UNKNOWN;

use super::dpi::DpiInfo;
use super::event::pump_messages;
use super::window::Window;
use crate::config::WindowConfig;
use crate::dispatch::{DispatchHandle, DispatchQueue};
use crate::error::{Error, Result};
use crate::geometry::Size;

type OsResult<T> = std::result::Result<T, windows::core::Error>;

// ── Color ─────────────────────────────────────────────────────────────────

/// An RGBA color with components in 0.0..=1.0
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Create color from RGB values (0-255)
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Create color from RGBA values (0-255)
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');

        let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

        match hex.len() {
            3 => Some(Self::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
            4 => Some(Self::rgba(
                nibble(0)? * 17,
                nibble(1)? * 17,
                nibble(2)? * 17,
                nibble(3)? * 17,
            )),
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    fn to_d2d(self) -> D2D1_COLOR_F {
        D2D1_COLOR_F {
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a,
        }
    }
}

/// A cached brush key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct BrushKey {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl From<Color> for BrushKey {
    fn from(c: Color) -> Self {
        Self {
            r: (c.r * 255.0) as u8,
            g: (c.g * 255.0) as u8,
            b: (c.b * 255.0) as u8,
            a: (c.a * 255.0) as u8,
        }
    }
}

/// A cached text-format key; size is quantized to tenths of a point
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct FormatKey {
    family: String,
    size_tenths: u32,
    bold: bool,
    italic: bool,
}

impl FormatKey {
    fn new(family: &str, size: f32, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            size_tenths: (size * 10.0).round() as u32,
            bold,
            italic,
        }
    }
}

// ── Renderer ──────────────────────────────────────────────────────────────

/// Direct2D rendering context for one window
pub struct Renderer {
    factory: ID2D1Factory,
    dwrite_factory: IDWriteFactory,
    render_target: Option<ID2D1HwndRenderTarget>,
    brush_cache: HashMap<BrushKey, ID2D1SolidColorBrush>,
    // DirectWrite formats are device-independent; this cache survives
    // device loss where the brush cache does not.
    format_cache: HashMap<FormatKey, IDWriteTextFormat>,
    hwnd: HWND,
    dpi: DpiInfo,
}

impl Renderer {
    /// Create a renderer for a window
    ///
    /// The render target is created lazily on first draw; a hidden window
    /// has a zero-size client area no target can be built for.
    pub fn new(hwnd: HWND) -> OsResult<Self> {
        let factory: ID2D1Factory =
            unsafe { D2D1CreateFactory(D2D1_FACTORY_TYPE_SINGLE_THREADED, None)? };
        let dwrite_factory: IDWriteFactory =
            unsafe { DWriteCreateFactory(DWRITE_FACTORY_TYPE_SHARED)? };

        let dpi = DpiInfo::for_window(hwnd);
        log!("renderer created, dpi={} scale={}", dpi.dpi, dpi.scale_factor);

        Ok(Self {
            factory,
            dwrite_factory,
            render_target: None,
            brush_cache: HashMap::new(),
            format_cache: HashMap::new(),
            hwnd,
            dpi,
        })
    }

    fn client_size(&self) -> Size {
        use windows::Win32::Foundation::RECT;
        use windows::Win32::UI::WindowsAndMessaging::GetClientRect;

        let mut rect = RECT::default();
        if unsafe { GetClientRect(self.hwnd, &mut rect) }.is_err() {
            return Size::default();
        }
        Size::new(rect.right - rect.left, rect.bottom - rect.top)
    }

    /// Create the render target; Ok(false) when the window has zero size
    fn create_render_target(&mut self) -> OsResult<bool> {
        let size = self.client_size();
        if size.width <= 0 || size.height <= 0 {
            return Ok(false);
        }

        let render_props = D2D1_RENDER_TARGET_PROPERTIES {
            r#type: D2D1_RENDER_TARGET_TYPE_DEFAULT,
            pixelFormat: D2D1_PIXEL_FORMAT {
                format: DXGI_FORMAT_UNKNOWN,
                alphaMode: D2D1_ALPHA_MODE_PREMULTIPLIED,
            },
            dpiX: self.dpi.dpi as f32,
            dpiY: self.dpi.dpi as f32,
            usage: D2D1_RENDER_TARGET_USAGE_NONE,
            minLevel: D2D1_FEATURE_LEVEL_DEFAULT,
        };

        let hwnd_props = D2D1_HWND_RENDER_TARGET_PROPERTIES {
            hwnd: self.hwnd,
            pixelSize: D2D_SIZE_U {
                width: size.width as u32,
                height: size.height as u32,
            },
            presentOptions: D2D1_PRESENT_OPTIONS_NONE,
        };

        self.brush_cache.clear();

        let target = unsafe {
            self.factory
                .CreateHwndRenderTarget(&render_props, &hwnd_props)?
        };
        self.render_target = Some(target);
        Ok(true)
    }

    fn ensure_render_target(&mut self) -> OsResult<bool> {
        if self.render_target.is_some() {
            return Ok(true);
        }
        self.create_render_target()
    }

    /// Drop the target and brushes; the next frame rebuilds them
    ///
    /// Called on device loss and on DPI change.
    pub fn release_target(&mut self) {
        self.render_target = None;
        self.brush_cache.clear();
    }

    /// Rebuild against a new DPI
    pub fn handle_dpi_change(&mut self, new_dpi: u32) {
        self.dpi = DpiInfo::new(new_dpi);
        if self.render_target.is_some() {
            self.release_target();
        }
    }

    /// Match the target's pixel size to the client area
    pub fn resize(&mut self, size: Size) -> OsResult<()> {
        if let Some(ref target) = self.render_target {
            let size = D2D_SIZE_U {
                width: size.width.max(0) as u32,
                height: size.height.max(0) as u32,
            };
            unsafe { target.Resize(&size)? };
        }
        Ok(())
    }

    /// Get or create a solid color brush
    fn get_brush(&mut self, color: Color) -> OsResult<ID2D1SolidColorBrush> {
        let key = BrushKey::from(color);

        if let Some(brush) = self.brush_cache.get(&key) {
            return Ok(brush.clone());
        }

        let target = self
            .render_target
            .as_ref()
            .ok_or_else(windows::core::Error::from_win32)?;

        let brush = unsafe { target.CreateSolidColorBrush(&color.to_d2d(), None)? };
        self.brush_cache.insert(key, brush.clone());
        Ok(brush)
    }

    /// Get the DWrite factory for text formatting
    pub fn dwrite_factory(&self) -> &IDWriteFactory {
        &self.dwrite_factory
    }

    /// Current DPI info
    pub fn dpi(&self) -> DpiInfo {
        self.dpi
    }

    /// Begin a frame; Ok(false) when no target can exist yet
    pub fn begin_draw(&mut self) -> OsResult<bool> {
        if !self.ensure_render_target()? {
            return Ok(false);
        }
        if let Some(ref target) = self.render_target {
            unsafe { target.BeginDraw() };
            return Ok(true);
        }
        Ok(false)
    }

    /// End the frame
    ///
    /// Direct2D defers most drawing errors to this call; the caller decides
    /// whether the returned HRESULT is the recoverable device-loss code.
    pub fn end_draw(&self) -> OsResult<()> {
        if let Some(ref target) = self.render_target {
            unsafe { target.EndDraw(None, None)? };
        }
        Ok(())
    }

    /// Clear the render target
    pub fn clear(&self, color: Color) {
        if let Some(ref target) = self.render_target {
            unsafe {
                target.Clear(Some(&color.to_d2d()));
            }
        }
    }

    /// Fill a rectangle
    pub fn fill_rect(&mut self, rect: D2D_RECT_F, color: Color) -> OsResult<()> {
        let brush = self.get_brush(color)?;
        if let Some(ref target) = self.render_target {
            unsafe {
                target.FillRectangle(&rect, &brush);
            }
        }
        Ok(())
    }

    /// Draw a rectangle outline
    pub fn draw_rect(&mut self, rect: D2D_RECT_F, color: Color, stroke_width: f32) -> OsResult<()> {
        let brush = self.get_brush(color)?;
        if let Some(ref target) = self.render_target {
            unsafe {
                target.DrawRectangle(&rect, &brush, stroke_width, None);
            }
        }
        Ok(())
    }

    /// Fill a rounded rectangle
    pub fn fill_rounded_rect(
        &mut self,
        rect: D2D_RECT_F,
        radius_x: f32,
        radius_y: f32,
        color: Color,
    ) -> OsResult<()> {
        let brush = self.get_brush(color)?;
        let rounded = D2D1_ROUNDED_RECT {
            rect,
            radiusX: radius_x,
            radiusY: radius_y,
        };
        if let Some(ref target) = self.render_target {
            unsafe {
                target.FillRoundedRectangle(&rounded, &brush);
            }
        }
        Ok(())
    }

    /// Draw a rounded rectangle outline
    pub fn draw_rounded_rect(
        &mut self,
        rect: D2D_RECT_F,
        radius_x: f32,
        radius_y: f32,
        color: Color,
        stroke_width: f32,
    ) -> OsResult<()> {
        let brush = self.get_brush(color)?;
        let rounded = D2D1_ROUNDED_RECT {
            rect,
            radiusX: radius_x,
            radiusY: radius_y,
        };
        if let Some(ref target) = self.render_target {
            unsafe {
                target.DrawRoundedRectangle(&rounded, &brush, stroke_width, None);
            }
        }
        Ok(())
    }

    /// Fill an ellipse centered at (cx, cy)
    pub fn fill_ellipse(
        &mut self,
        cx: f32,
        cy: f32,
        radius_x: f32,
        radius_y: f32,
        color: Color,
    ) -> OsResult<()> {
        let brush = self.get_brush(color)?;
        let ellipse = D2D1_ELLIPSE {
            point: D2D_POINT_2F { x: cx, y: cy },
            radiusX: radius_x,
            radiusY: radius_y,
        };
        if let Some(ref target) = self.render_target {
            unsafe {
                target.FillEllipse(&ellipse, &brush);
            }
        }
        Ok(())
    }

    /// Draw an ellipse outline centered at (cx, cy)
    pub fn draw_ellipse(
        &mut self,
        cx: f32,
        cy: f32,
        radius_x: f32,
        radius_y: f32,
        color: Color,
        stroke_width: f32,
    ) -> OsResult<()> {
        let brush = self.get_brush(color)?;
        let ellipse = D2D1_ELLIPSE {
            point: D2D_POINT_2F { x: cx, y: cy },
            radiusX: radius_x,
            radiusY: radius_y,
        };
        if let Some(ref target) = self.render_target {
            unsafe {
                target.DrawEllipse(&ellipse, &brush, stroke_width, None);
            }
        }
        Ok(())
    }

    /// Draw a line
    pub fn draw_line(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
        stroke_width: f32,
    ) -> OsResult<()> {
        let brush = self.get_brush(color)?;
        if let Some(ref target) = self.render_target {
            unsafe {
                target.DrawLine(
                    D2D_POINT_2F { x: x1, y: y1 },
                    D2D_POINT_2F { x: x2, y: y2 },
                    &brush,
                    stroke_width,
                    None,
                );
            }
        }
        Ok(())
    }

    /// Get or create a cached text format
    pub fn text_format(
        &mut self,
        font_family: &str,
        font_size: f32,
        bold: bool,
        italic: bool,
    ) -> OsResult<IDWriteTextFormat> {
        let key = FormatKey::new(font_family, font_size, bold, italic);

        if let Some(format) = self.format_cache.get(&key) {
            return Ok(format.clone());
        }

        let format = self.create_text_format(font_family, font_size, bold, italic)?;
        self.format_cache.insert(key, format.clone());
        Ok(format)
    }

    /// Create an uncached text format
    pub fn create_text_format(
        &self,
        font_family: &str,
        font_size: f32,
        bold: bool,
        italic: bool,
    ) -> OsResult<IDWriteTextFormat> {
        let family: Vec<u16> = font_family
            .encode_utf16()
            .chain(std::iter::once(0))
            .collect();

        let weight = if bold {
            DWRITE_FONT_WEIGHT_BOLD
        } else {
            DWRITE_FONT_WEIGHT_REGULAR
        };

        let style = if italic {
            DWRITE_FONT_STYLE_ITALIC
        } else {
            DWRITE_FONT_STYLE_NORMAL
        };

        unsafe {
            self.dwrite_factory.CreateTextFormat(
                windows::core::PCWSTR(family.as_ptr()),
                None,
                weight,
                style,
                DWRITE_FONT_STRETCH_NORMAL,
                font_size,
                windows::core::w!("en-US"),
            )
        }
    }

    /// Draw text
    pub fn draw_text(
        &mut self,
        text: &str,
        format: &IDWriteTextFormat,
        rect: D2D_RECT_F,
        color: Color,
    ) -> OsResult<()> {
        let brush = self.get_brush(color)?;
        let text_wide: Vec<u16> = text.encode_utf16().collect();

        if let Some(ref target) = self.render_target {
            unsafe {
                target.DrawText(
                    &text_wide,
                    format,
                    &rect,
                    &brush,
                    D2D1_DRAW_TEXT_OPTIONS_NONE,
                    DWRITE_MEASURING_MODE_NATURAL,
                );
            }
        }
        Ok(())
    }

    /// Measure text dimensions
    pub fn measure_text(
        &self,
        text: &str,
        format: &IDWriteTextFormat,
        max_width: f32,
        max_height: f32,
    ) -> OsResult<(f32, f32)> {
        let text_wide: Vec<u16> = text.encode_utf16().collect();

        unsafe {
            let layout = self
                .dwrite_factory
                .CreateTextLayout(&text_wide, format, max_width, max_height)?;

            let mut metrics = DWRITE_TEXT_METRICS::default();
            layout.GetMetrics(&mut metrics)?;

            Ok((metrics.width, metrics.height))
        }
    }
}

/// Helper to create a D2D rect from position and size
pub fn rect(x: f32, y: f32, width: f32, height: f32) -> D2D_RECT_F {
    D2D_RECT_F {
        left: x,
        top: y,
        right: x + width,
        bottom: y + height,
    }
}

// ── RenderWindow ──────────────────────────────────────────────────────────

/// A window with a Direct2D surface and a frame-paced render loop
///
/// The loop replaces the blocking message wait with a non-blocking pump so
/// idle time renders frames. Between frames it drains the deferred-action
/// queue under a time budget; that queue is the supported way for other
/// threads to touch the window.
pub struct RenderWindow {
    window: Window,
    renderer: Renderer,
    queue: DispatchQueue,
    frame_period: Duration,
    dispatch_budget: Duration,
    clear_color: Color,
}

impl RenderWindow {
    pub fn open(config: &WindowConfig) -> Result<Self> {
        let window = Window::open(config)?;
        let renderer = Renderer::new(window.hwnd()).map_err(Error::Render)?;

        Ok(Self {
            window,
            renderer,
            queue: DispatchQueue::new(),
            frame_period: Duration::from_nanos(1_000_000_000 / 60),
            dispatch_budget: Duration::from_millis(2),
            clear_color: Color::BLACK,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Handle other threads use to post work onto this window's thread
    pub fn dispatcher(&self) -> DispatchHandle {
        self.queue.handle()
    }

    /// Install the window event handler (see [`Window::set_handler`])
    pub fn set_handler<F>(&self, handler: F)
    where
        F: FnMut(super::event::Event) -> bool + 'static,
    {
        self.window.set_handler(handler);
    }

    /// Target frame rate; the loop sleeps out the rest of each period
    pub fn set_frame_rate(&mut self, fps: u32) {
        let fps = fps.max(1);
        self.frame_period = Duration::from_nanos(1_000_000_000 / fps as u64);
    }

    /// Per-frame time budget for the deferred-action queue
    pub fn set_dispatch_budget(&mut self, budget: Duration) {
        self.dispatch_budget = budget;
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Run until WM_QUIT, calling `frame` once per rendered frame with the
    /// elapsed seconds since the previous one
    pub fn run<F>(&mut self, mut frame: F) -> Result<()>
    where
        F: FnMut(&mut Renderer, f32),
    {
        let mut last_frame = Instant::now();
        let mut last_size = self.window.client_size();

        while pump_messages() {
            let frame_start = Instant::now();

            self.queue.drain(self.dispatch_budget);

            // Track size and DPI by polling; the handler owns the events.
            let size = self.window.client_size();
            if size != last_size {
                self.renderer.resize(size).map_err(Error::Render)?;
                last_size = size;
            }
            let dpi = DpiInfo::for_window(self.window.hwnd()).dpi;
            if dpi != self.renderer.dpi().dpi {
                log!("dpi changed to {}, rebuilding target", dpi);
                self.renderer.handle_dpi_change(dpi);
            }

            if self.window.is_minimized() || size.width <= 0 || size.height <= 0 {
                std::thread::sleep(self.frame_period);
                last_frame = Instant::now();
                continue;
            }

            if self.renderer.begin_draw().map_err(Error::Render)? {
                let dt = last_frame.elapsed().as_secs_f32();
                last_frame = Instant::now();

                self.renderer.clear(self.clear_color);
                frame(&mut self.renderer, dt);

                match self.renderer.end_draw() {
                    Ok(()) => {}
                    Err(e) if e.code() == D2DERR_RECREATE_TARGET => {
                        log!("device lost, recreating render target");
                        self.renderer.release_target();
                    }
                    Err(e) => return Err(Error::Render(e)),
                }
            }

            if let Some(rest) = self.frame_period.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(rest);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#fff"), Some(Color::WHITE));
        let c = Color::from_hex("#ff0000").unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (1.0, 0.0, 0.0, 1.0));
        let c = Color::from_hex("1e1e2ecc").unwrap();
        assert!((c.a - 0.8).abs() < 0.01);
    }

    #[test]
    fn test_color_from_hex_rejects_garbage() {
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
        assert_eq!(Color::from_hex(""), None);
    }

    #[test]
    fn test_brush_key_quantizes() {
        let a = BrushKey::from(Color::rgb(10, 20, 30));
        let b = BrushKey::from(Color {
            r: 10.0 / 255.0,
            g: 20.0 / 255.0,
            b: 30.0 / 255.0,
            a: 1.0,
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_format_key_quantizes_size() {
        assert_eq!(
            FormatKey::new("Segoe UI", 14.0, false, false),
            FormatKey::new("Segoe UI", 14.01, false, false),
        );
        assert_ne!(
            FormatKey::new("Segoe UI", 14.0, false, false),
            FormatKey::new("Segoe UI", 14.5, false, false),
        );
    }

    #[test]
    fn test_rect_helper() {
        let r = rect(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.left, 10.0);
        assert_eq!(r.top, 20.0);
        assert_eq!(r.right, 40.0);
        assert_eq!(r.bottom, 60.0);
    }
}
