// Administrator check and elevated relaunch; the host monitor runs elevated
use crate::log_info;

/// What the caller should do after [`ensure_elevated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// Already elevated; continue in this process.
    Elevated,
    /// An elevated copy was launched; exit with code 0.
    Relaunched,
    /// The user declined the prompt; exit with code 1.
    Cancelled,
    /// Relaunch failed for another reason; continue unelevated.
    Unavailable,
}

impl Elevation {
    pub fn exit_code(self) -> Option<i32> {
        match self {
            Elevation::Relaunched => Some(0),
            Elevation::Cancelled => Some(1),
            Elevation::Elevated | Elevation::Unavailable => None,
        }
    }
}

#[cfg(windows)]
pub fn is_elevated() -> bool {
    use windows::Win32::{
        Foundation::{CloseHandle, HANDLE},
        Security::{GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY},
        System::Threading::{GetCurrentProcess, OpenProcessToken},
    };

    unsafe {
        let mut token = HANDLE::default();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
            return false;
        }

        let mut elevation = TOKEN_ELEVATION::default();
        let mut returned = 0u32;
        let ok = GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut TOKEN_ELEVATION as *mut _),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        )
        .is_ok();
        let _ = CloseHandle(token);

        ok && elevation.TokenIsElevated != 0
    }
}

#[cfg(not(windows))]
pub fn is_elevated() -> bool {
    true
}

/// Relaunches the current executable through the `runas` verb unless already elevated.
#[cfg(windows)]
pub fn ensure_elevated(args: &[String]) -> Elevation {
    use windows::{
        core::{w, HSTRING, PCWSTR},
        Win32::{
            Foundation::ERROR_CANCELLED,
            UI::{
                Shell::{ShellExecuteExW, SHELLEXECUTEINFOW},
                WindowsAndMessaging::{MessageBoxW, MB_ICONWARNING, MB_OK, SW_NORMAL},
            },
        },
    };

    if is_elevated() {
        return Elevation::Elevated;
    }

    let exe = match std::env::current_exe() {
        Ok(path) => path,
        Err(e) => {
            crate::log_error!("Cannot resolve own executable for relaunch: {}", e);
            return Elevation::Unavailable;
        }
    };

    log_info!("Not elevated, relaunching {} as administrator", exe.display());

    let file = HSTRING::from(exe.as_os_str());
    let params = HSTRING::from(join_args(args));
    let mut info = SHELLEXECUTEINFOW {
        cbSize: std::mem::size_of::<SHELLEXECUTEINFOW>() as u32,
        lpVerb: w!("runas"),
        lpFile: PCWSTR(file.as_ptr()),
        lpParameters: PCWSTR(params.as_ptr()),
        nShow: SW_NORMAL.0,
        ..Default::default()
    };

    match unsafe { ShellExecuteExW(&mut info) } {
        Ok(()) => Elevation::Relaunched,
        Err(e) if e.code() == ERROR_CANCELLED.to_hresult() => {
            unsafe {
                MessageBoxW(
                    None,
                    w!("Administrator privileges are required."),
                    w!("Mirage"),
                    MB_OK | MB_ICONWARNING,
                );
            }
            Elevation::Cancelled
        }
        Err(e) => {
            crate::log_error!("Elevated relaunch failed: {:?}", e);
            Elevation::Unavailable
        }
    }
}

#[cfg(not(windows))]
pub fn ensure_elevated(_args: &[String]) -> Elevation {
    Elevation::Elevated
}

/// Quotes arguments for a Windows command line.
pub fn join_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.is_empty() || arg.contains([' ', '\t', '"']) {
                format!("\"{}\"", arg.replace('"', "\\\""))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(Elevation::Relaunched.exit_code(), Some(0));
        assert_eq!(Elevation::Cancelled.exit_code(), Some(1));
        assert_eq!(Elevation::Elevated.exit_code(), None);
    }

    #[test]
    fn args_with_spaces_are_quoted() {
        let args = vec!["chart".to_string(), "--config".to_string(), "C:\\my dir\\config.cfg".to_string()];
        assert_eq!(join_args(&args), "chart --config \"C:\\my dir\\config.cfg\"");
    }
}
