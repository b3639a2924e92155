use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::services::color_bands::{ColorBand, Rgb};

/// Допустимый темп эмуляции набора, символов в секунду
pub const DRY_RUN_CPS_RANGE: RangeInclusive<f64> = 0.01..=1000.0;

/// Верхняя граница истории WPM (сутки выборок раз в секунду)
pub const MAX_HISTORY_LEN: usize = 86_400;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub counting: CountingConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub dry_run: DryRunConfig,
    #[serde(default = "default_bands")]
    pub bands: Vec<BandConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub device_path: String,
    /// Считать ли аппаратный автоповтор (value = 2) нажатием
    pub count_autorepeat: bool,
}

/// Режим подсчёта, фиксируется при старте процесса
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountingMode {
    /// Каждый печатный символ, пробел и Enter
    #[default]
    Keystrokes,
    /// Только завершённые слова (пробел/Enter после непустого буфера)
    Words,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CountingConfig {
    pub mode: CountingMode,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SamplingConfig {
    pub sample_interval_ms: u64,
    pub history_len: usize,
    /// Три окна измерения: первое используется для цвета и истории
    pub windows_secs: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Ширина спарклайна в символах
    pub sparkline_width: usize,
    /// Высота области графика, по которой масштабируются точки
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DryRunConfig {
    pub text: String,
    pub chars_per_second: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BandConfig {
    pub name: String,
    pub max_wpm: u32,
    pub color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            input: InputConfig::default(),
            counting: CountingConfig::default(),
            sampling: SamplingConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            render: RenderConfig::default(),
            dry_run: DryRunConfig::default(),
            bands: default_bands(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: "auto".to_string(),
            count_autorepeat: true,
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            history_len: 60,
            windows_secs: vec![15.0, 30.0, 60.0],
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("keys.log"),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sparkline_width: 60,
            height: 60,
        }
    }
}

impl Default for DryRunConfig {
    fn default() -> Self {
        Self {
            text: "the quick brown fox jumps over the lazy dog\n".to_string(),
            chars_per_second: 5.0,
        }
    }
}

fn default_bands() -> Vec<BandConfig> {
    [
        ("slow", 30, "#ff4d4f"),
        ("avg", 60, "#ffb020"),
        ("good", 90, "#00c853"),
        ("best", 9999, "#00bcd4"),
    ]
    .into_iter()
    .map(|(name, max_wpm, color)| BandConfig {
        name: name.to_string(),
        max_wpm,
        color: color.to_string(),
    })
    .collect()
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("WPM_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.apply_env_toggles(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Короткие переключатели окружения: `WPM_WORDS=1` и `WPM_LOG_KEYS=1`
    pub fn apply_env_toggles<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup("WPM_WORDS").as_deref() == Some("1") {
            self.counting.mode = CountingMode::Words;
        }
        if lookup("WPM_LOG_KEYS").as_deref() == Some("1") {
            self.diagnostics.enabled = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "pretty" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек выборки
        if self.sampling.sample_interval_ms == 0 {
            anyhow::bail!("sample_interval_ms должно быть больше 0");
        }

        if self.sampling.history_len == 0 || self.sampling.history_len > MAX_HISTORY_LEN {
            anyhow::bail!(
                "history_len должно быть от 1 до {}, получено {}",
                MAX_HISTORY_LEN,
                self.sampling.history_len
            );
        }

        if self.sampling.windows_secs.len() != 3 {
            anyhow::bail!(
                "windows_secs должно содержать ровно 3 окна, получено {}",
                self.sampling.windows_secs.len()
            );
        }

        for window in &self.sampling.windows_secs {
            if !window.is_finite() || *window <= 0.0 {
                anyhow::bail!("Неверное окно измерения: {}", window);
            }
        }

        if self.render.sparkline_width == 0 || self.render.height < 2 {
            anyhow::bail!("Неверные размеры области отрисовки");
        }

        if !DRY_RUN_CPS_RANGE.contains(&self.dry_run.chars_per_second) {
            anyhow::bail!(
                "dry_run.chars_per_second должно быть в диапазоне {}..={}, получено {}",
                DRY_RUN_CPS_RANGE.start(),
                DRY_RUN_CPS_RANGE.end(),
                self.dry_run.chars_per_second
            );
        }

        // Валидация цветовых полос
        self.color_bands()?;

        Ok(())
    }

    /// Цветовые полосы в порядке объявления
    pub fn color_bands(&self) -> Result<Vec<ColorBand>> {
        if self.bands.is_empty() {
            anyhow::bail!("Нужна хотя бы одна цветовая полоса");
        }

        self.bands
            .iter()
            .enumerate()
            .map(|(i, band)| {
                if band.name.is_empty() {
                    anyhow::bail!("Пустое имя цветовой полосы #{}", i + 1);
                }
                let color: Rgb = band
                    .color
                    .parse()
                    .with_context(|| format!("Полоса '{}'", band.name))?;
                Ok(ColorBand::new(band.name.clone(), band.max_wpm, color))
            })
            .collect()
    }

    /// Наибольшее окно измерения, определяет горизонт хранения событий
    pub fn max_window_secs(&self) -> f64 {
        self.sampling
            .windows_secs
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }
}
