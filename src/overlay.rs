use crate::window::HostError;
use anyhow::Result;
use image::RgbImage;

/// A surface embedded inside a host window.
pub trait OverlaySurface {
    /// Re-validates the host, matches the overlay to its current bounds and raises it
    /// above its siblings. Returns the size frames should be rendered at.
    fn track_host(&mut self) -> Result<(u32, u32), HostError>;

    /// Blits `frame` onto the overlay, scaled to the current overlay size.
    fn present(&mut self, frame: &RgbImage) -> Result<()>;
}

/// Converts RGB to the BGRX rows GDI expects for a 32-bit top-down DIB.
pub fn to_bgrx(frame: &RgbImage, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(frame.width() as usize * frame.height() as usize * 4);
    for pixel in frame.pixels() {
        let [r, g, b] = pixel.0;
        out.extend_from_slice(&[b, g, r, 0]);
    }
}

#[cfg(windows)]
pub use self::win32::Win32Overlay;

#[cfg(windows)]
mod win32 {
    use super::{to_bgrx, OverlaySurface};
    use crate::window::{HostError, WindowSystem, Win32Windows};
    use crate::{log_info, log_warn};
    use anyhow::{Context, Result};
    use image::RgbImage;
    use windows::{
        core::w,
        Win32::{
            Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
            Graphics::Gdi::{
                GetDC, ReleaseDC, StretchDIBits, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, SRCCOPY,
            },
            System::LibraryLoader::GetModuleHandleW,
            UI::WindowsAndMessaging::*,
        },
    };

    /// Borderless child window reparented under the host's embed target.
    pub struct Win32Overlay {
        hwnd: HWND,
        target: HWND,
        windows: Win32Windows,
        size: (u32, u32),
        scratch: Vec<u8>,
    }

    impl Win32Overlay {
        pub fn attach(windows: Win32Windows, target: HWND) -> Result<Self> {
            unsafe {
                let hwnd = create_window()?;
                let mut overlay = Self {
                    hwnd,
                    target,
                    windows,
                    size: (0, 0),
                    scratch: Vec::new(),
                };

                strip_decorations(hwnd);
                SetParent(hwnd, Some(target)).context("Failed to reparent overlay under host window")?;
                log_info!("Overlay {:?} attached to {:?}", hwnd, target);

                overlay.track_host()?;
                Ok(overlay)
            }
        }

        fn pump_messages(&self) {
            unsafe {
                let mut msg = MSG::default();
                while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }
    }

    impl OverlaySurface for Win32Overlay {
        fn track_host(&mut self) -> Result<(u32, u32), HostError> {
            let rect = self.windows.live_geometry(self.target)?;
            let (w, h) = (rect.width(), rect.height());

            unsafe {
                let _ = SetWindowPos(
                    self.hwnd,
                    Some(HWND_TOP),
                    0,
                    0,
                    w,
                    h,
                    SWP_SHOWWINDOW | SWP_NOACTIVATE,
                );
            }

            self.size = (w.max(1) as u32, h.max(1) as u32);
            self.pump_messages();
            Ok(self.size)
        }

        fn present(&mut self, frame: &RgbImage) -> Result<()> {
            to_bgrx(frame, &mut self.scratch);

            let bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: frame.width() as i32,
                    biHeight: -(frame.height() as i32),
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let lines = unsafe {
                let hdc = GetDC(Some(self.hwnd));
                let lines = StretchDIBits(
                    hdc,
                    0,
                    0,
                    self.size.0 as i32,
                    self.size.1 as i32,
                    0,
                    0,
                    frame.width() as i32,
                    frame.height() as i32,
                    Some(self.scratch.as_ptr() as *const _),
                    &bmi,
                    DIB_RGB_COLORS,
                    SRCCOPY,
                );
                ReleaseDC(Some(self.hwnd), hdc);
                lines
            };

            self.pump_messages();

            if lines == 0 {
                anyhow::bail!("StretchDIBits copied no scan lines");
            }
            Ok(())
        }
    }

    impl Drop for Win32Overlay {
        fn drop(&mut self) {
            unsafe {
                if let Err(e) = DestroyWindow(self.hwnd) {
                    log_warn!("Failed to destroy overlay window: {:?}", e);
                } else {
                    log_info!("Overlay removed");
                }
            }
        }
    }

    unsafe fn create_window() -> Result<HWND> {
        let class_name = w!("MirageOverlay");
        let hinstance = GetModuleHandleW(None)?;

        let wc = WNDCLASSW {
            lpfnWndProc: Some(window_proc),
            hInstance: hinstance.into(),
            lpszClassName: class_name,
            style: CS_HREDRAW | CS_VREDRAW,
            ..Default::default()
        };

        // Registration fails harmlessly when the class already exists
        RegisterClassW(&wc);

        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            class_name,
            w!("Mirage Overlay"),
            WS_POPUP,
            0,
            0,
            1,
            1,
            None,
            None,
            Some(HINSTANCE(hinstance.0)),
            None,
        )?;

        Ok(hwnd)
    }

    /// Removes border, caption and resize frame, turns the window into a child and makes
    /// it click-through.
    unsafe fn strip_decorations(hwnd: HWND) {
        let style = GetWindowLongW(hwnd, GWL_STYLE) as u32;
        let new_style = (style & !(WS_BORDER.0 | WS_CAPTION.0 | WS_SYSMENU.0 | WS_SIZEBOX.0 | WS_POPUP.0))
            | WS_CHILD.0
            | WS_VISIBLE.0;
        SetWindowLongW(hwnd, GWL_STYLE, new_style as i32);
        SetWindowLongW(hwnd, GWL_EXSTYLE, (WS_EX_TRANSPARENT.0 | WS_EX_LAYERED.0) as i32);

        // A layered window stays invisible until its attributes are set
        if let Err(e) = SetLayeredWindowAttributes(hwnd, COLORREF(0), 255, LWA_ALPHA) {
            log_warn!("Failed to set layered attributes: {:?}", e);
        }
    }

    unsafe extern "system" fn window_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        match msg {
            WM_ERASEBKGND => LRESULT(1),
            WM_NCHITTEST => LRESULT(HTTRANSPARENT as i32 as isize),
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}
