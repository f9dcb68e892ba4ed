use crate::log_info;
use std::fmt::Debug;

/// Screen-space bounding box of a host-managed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl WindowRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("no window with class '{class}' and title '{title}'")]
    HostNotFound { class: String, title: String },
    #[error("no descendant of the host window has class '{class}'")]
    EmbedTargetNotFound { class: String },
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("host window {0} no longer exists")]
    Lost(String),
    #[error("failed to read geometry of window {0}")]
    Geometry(String),
}

/// Capability view of the host windowing system. Handles are weak references into
/// host-owned state and may go stale at any time.
pub trait WindowSystem {
    type Handle: Copy + Eq + Debug;

    fn find_window(&self, class: &str, title: &str) -> Option<Self::Handle>;

    /// All descendants of `parent`, in enumeration order.
    fn descendants(&self, parent: Self::Handle) -> Vec<Self::Handle>;

    fn class_of(&self, window: Self::Handle) -> Option<String>;

    fn geometry(&self, window: Self::Handle) -> Option<WindowRect>;

    fn is_alive(&self, window: Self::Handle) -> bool;

    /// Re-validates `window` before reading its geometry.
    fn live_geometry(&self, window: Self::Handle) -> Result<WindowRect, HostError> {
        if !self.is_alive(window) {
            return Err(HostError::Lost(format!("{:?}", window)));
        }
        self.geometry(window).ok_or_else(|| HostError::Geometry(format!("{:?}", window)))
    }
}

pub struct WindowLocator<'a, W: WindowSystem> {
    windows: &'a W,
}

impl<'a, W: WindowSystem> WindowLocator<'a, W> {
    pub fn new(windows: &'a W) -> Self {
        Self { windows }
    }

    pub fn locate_host(&self, title: &str, class: &str) -> Result<W::Handle, LocateError> {
        log_info!("Looking for host window '{}' ({})", title, class);
        self.windows.find_window(class, title).ok_or_else(|| LocateError::HostNotFound {
            class: class.to_string(),
            title: title.to_string(),
        })
    }

    /// Largest-area descendant of `host` whose class is exactly `child_class`; the first
    /// one enumerated wins a tie. An empty `child_class` selects the host itself.
    pub fn locate_embed_target(&self, host: W::Handle, child_class: &str) -> Result<W::Handle, LocateError> {
        if child_class.is_empty() {
            return Ok(host);
        }

        let mut best: Option<(W::Handle, i64)> = None;
        for child in self.windows.descendants(host) {
            if self.windows.class_of(child).as_deref() != Some(child_class) {
                continue;
            }
            let area = self.windows.geometry(child).map(|r| r.area()).unwrap_or(0);
            match best {
                Some((_, best_area)) if area <= best_area => {}
                _ => best = Some((child, area)),
            }
        }

        match best {
            Some((handle, area)) => {
                log_info!("Embed target {:?} ({} px²)", handle, area);
                Ok(handle)
            }
            None => Err(LocateError::EmbedTargetNotFound {
                class: child_class.to_string(),
            }),
        }
    }
}

#[cfg(windows)]
pub use self::win32::Win32Windows;

#[cfg(windows)]
mod win32 {
    use super::{WindowRect, WindowSystem};
    use windows::{
        core::{BOOL, HSTRING},
        Win32::{
            Foundation::{HWND, LPARAM, RECT},
            UI::WindowsAndMessaging::{EnumChildWindows, FindWindowW, GetClassNameW, GetWindowRect, IsWindow},
        },
    };

    /// The desktop window manager, queried live on every call.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct Win32Windows;

    impl WindowSystem for Win32Windows {
        type Handle = HWND;

        fn find_window(&self, class: &str, title: &str) -> Option<HWND> {
            let class = HSTRING::from(class);
            let title = HSTRING::from(title);
            unsafe { FindWindowW(&class, &title) }.ok().filter(|hwnd| !hwnd.is_invalid())
        }

        fn descendants(&self, parent: HWND) -> Vec<HWND> {
            let mut found: Vec<HWND> = Vec::new();
            unsafe {
                let _ = EnumChildWindows(
                    Some(parent),
                    Some(collect_child),
                    LPARAM(&mut found as *mut Vec<HWND> as isize),
                );
            }
            found
        }

        fn class_of(&self, window: HWND) -> Option<String> {
            let mut buf = [0u16; 256];
            let len = unsafe { GetClassNameW(window, &mut buf) };
            if len <= 0 {
                return None;
            }
            Some(String::from_utf16_lossy(&buf[..len as usize]))
        }

        fn geometry(&self, window: HWND) -> Option<WindowRect> {
            let mut rect = RECT::default();
            unsafe { GetWindowRect(window, &mut rect) }.ok()?;
            Some(WindowRect::new(rect.left, rect.top, rect.right, rect.bottom))
        }

        fn is_alive(&self, window: HWND) -> bool {
            unsafe { IsWindow(Some(window)) }.as_bool()
        }
    }

    unsafe extern "system" fn collect_child(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let found = &mut *(lparam.0 as *mut Vec<HWND>);
        found.push(hwnd);
        true.into()
    }
}
