use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Цвет в формате `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Неверный цвет '{0}': ожидается формат #rrggbb")]
pub struct ParseRgbError(String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.is_ascii())
            .ok_or_else(|| ParseRgbError(s.to_string()))?;

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseRgbError(s.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Именованная полоса скорости с включительной верхней границей
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorBand {
    name: String,
    max_wpm: u32,
    color: Rgb,
}

impl ColorBand {
    pub fn new(name: impl Into<String>, max_wpm: u32, color: Rgb) -> Self {
        Self {
            name: name.into(),
            max_wpm,
            color,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Rgb {
        self.color
    }
}

/// Упорядоченный набор полос.
///
/// Полосы не сортируются: побеждает первая в порядке объявления, чья граница
/// не меньше WPM. Если ни одна не подошла, используется последняя полоса.
#[derive(Debug, Clone)]
pub struct ColorBands {
    bands: Vec<ColorBand>,
}

impl ColorBands {
    /// Возвращает `None` для пустого набора
    pub fn new(bands: Vec<ColorBand>) -> Option<Self> {
        if bands.is_empty() {
            None
        } else {
            Some(Self { bands })
        }
    }

    pub fn color_for(&self, wpm: u32) -> &ColorBand {
        self.bands
            .iter()
            .find(|band| wpm <= band.max_wpm)
            .unwrap_or_else(|| self.catch_all())
    }

    fn catch_all(&self) -> &ColorBand {
        // Непустота гарантирована конструктором
        &self.bands[self.bands.len() - 1]
    }
}
