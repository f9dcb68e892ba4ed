use crate::palette::Theme;

#[cfg(windows)]
use windows::{
    core::w,
    Win32::{
        Foundation::ERROR_SUCCESS,
        System::Registry::{RegGetValueW, HKEY_CURRENT_USER, RRF_RT_REG_DWORD},
    },
};

/// Reads the host's app theme preference. Any read failure counts as light mode.
#[cfg(windows)]
pub fn probe_theme() -> Theme {
    let mut apps_use_light_theme: u32 = 1;
    let mut size = std::mem::size_of::<u32>() as u32;

    let status = unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            w!("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize"),
            w!("AppsUseLightTheme"),
            RRF_RT_REG_DWORD,
            None,
            Some(&mut apps_use_light_theme as *mut u32 as *mut _),
            Some(&mut size),
        )
    };

    theme_from_registry(if status == ERROR_SUCCESS { Some(apps_use_light_theme) } else { None })
}

#[cfg(not(windows))]
pub fn probe_theme() -> Theme {
    theme_from_registry(None)
}

/// `AppsUseLightTheme` is 0 for dark mode; a missing value means light.
fn theme_from_registry(value: Option<u32>) -> Theme {
    match value {
        Some(0) => Theme::Dark,
        _ => Theme::Light,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_value_defaults_to_light() {
        assert_eq!(theme_from_registry(None), Theme::Light);
        assert_eq!(theme_from_registry(Some(1)), Theme::Light);
        assert_eq!(theme_from_registry(Some(0)), Theme::Dark);
    }
}
