use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    pub fn to_pixel(self) -> image::Rgb<u8> {
        image::Rgb([self.0, self.1, self.2])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected three comma-separated integers in 0..=255, got '{0}'")]
pub struct ParseRgbError(pub String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    /// Parses `r,g,b`; whitespace around each component is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ParseRgbError(s.to_string()));
        }

        let mut channels = [0u8; 3];
        for (slot, part) in channels.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| ParseRgbError(s.to_string()))?;
        }

        Ok(Self(channels[0], channels[1], channels[2]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

/// Colours for one stylized frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub edge: Rgb,
    pub dark: Rgb,
    pub bright: Rgb,
    pub grid: Rgb,
    pub frame: Rgb,
}

impl Palette {
    /// Built-in palette used whenever the host runs in dark mode.
    pub const DARK: Palette = Palette {
        edge: Rgb::new(116, 138, 236),
        dark: Rgb::new(93, 109, 182),
        bright: Rgb::new(25, 25, 25),
        grid: Rgb::new(50, 50, 50),
        frame: Rgb::new(50, 50, 50),
    };

    /// Dark mode always uses [`Palette::DARK`]; light mode uses the configured colours.
    pub fn for_theme(theme: Theme, configured: &Palette) -> Palette {
        match theme {
            Theme::Dark => Self::DARK,
            Theme::Light => *configured,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::DARK
    }
}
