use crate::config::DiagnosticsConfig;
use crate::error::Result;
use crate::events::SymbolicKey;
use once_cell::sync::Lazy;
use std::fs::{self, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Начало отсчёта монотонных отметок в диагностическом журнале
static CLOCK_ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// Секунды от начала отсчёта процесса
pub fn monotonic_secs(instant: Instant) -> f64 {
    instant.saturating_duration_since(*CLOCK_ORIGIN).as_secs_f64()
}

/// Диагностический журнал сырых событий (только добавление).
///
/// Ошибки записи никогда не выходят наружу: журнал не должен влиять на подсчёт.
pub struct DiagnosticSink {
    writer: LineWriter<Box<dyn Write + Send>>,
}

impl DiagnosticSink {
    /// Журнал из конфигурации; при ошибке открытия работаем без него
    pub fn from_config(config: &DiagnosticsConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        match Self::create(&config.path) {
            Ok(sink) => Some(sink),
            Err(e) => {
                warn!("Диагностический журнал отключён: {}", e);
                None
            }
        }
    }

    /// Открыть журнал, удалив содержимое предыдущего запуска
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Lazy::force(&CLOCK_ORIGIN);
        let path = path.as_ref();

        if path.exists() {
            if let Err(e) = fs::remove_file(path) {
                debug!("Не удалось удалить старый журнал {:?}: {}", path, e);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!("Диагностический журнал клавиш: {}", path.display());

        Ok(Self::from_writer(Box::new(file)))
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Lazy::force(&CLOCK_ORIGIN);
        Self {
            writer: LineWriter::new(writer),
        }
    }

    pub fn write_event(&mut self, timestamp: Instant, character: Option<char>, key: &SymbolicKey) {
        let line = format_line(timestamp, character, key);
        if let Err(e) = writeln!(self.writer, "{}", line) {
            debug!("Ошибка записи в диагностический журнал: {}", e);
        }
    }
}

fn format_line(timestamp: Instant, character: Option<char>, key: &SymbolicKey) -> String {
    let ch = match character {
        Some(ch) => format!("{:?}", ch),
        None => "None".to_string(),
    };
    format!("{:.6}\tch={}\tkey={}", monotonic_secs(timestamp), ch, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::KeyCode;

    #[test]
    fn test_line_format() {
        let now = Instant::now();
        let line = format_line(now, Some('a'), &SymbolicKey::Other(KeyCode::new(30)));
        let fields: Vec<&str> = line.split('\t').collect();

        assert_eq!(fields.len(), 3);
        let (_, micros) = fields[0].split_once('.').unwrap();
        assert_eq!(micros.len(), 6);
        assert_eq!(fields[1], "ch='a'");
        assert_eq!(fields[2], "key=KEY_30");

        let line = format_line(now, None, &SymbolicKey::Space);
        assert!(line.ends_with("\tch=None\tkey=Key.space"));
    }

    #[test]
    fn test_writes_one_line_per_event_and_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.log");
        std::fs::write(&path, "old run\n").unwrap();

        let mut sink = DiagnosticSink::create(&path).unwrap();
        sink.write_event(Instant::now(), Some('h'), &SymbolicKey::Other(KeyCode::new(35)));
        sink.write_event(Instant::now(), None, &SymbolicKey::Enter);
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ch='h'"));
        assert!(lines[1].contains("key=Key.enter"));
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = DiagnosticSink::create(dir.path().join("missing").join("keys.log"));
        assert!(result.is_err());
    }

    #[test]
    fn test_write_to_read_only_handle_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.log");
        std::fs::write(&path, "").unwrap();

        let read_only = fs::File::open(&path).unwrap();
        let mut sink = DiagnosticSink::from_writer(Box::new(read_only));
        sink.write_event(Instant::now(), Some('a'), &SymbolicKey::Other(KeyCode::new(30)));
        sink.write_event(Instant::now(), None, &SymbolicKey::Space);
        drop(sink);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_from_config_falls_back_to_no_sink() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DiagnosticsConfig {
            enabled: false,
            path: dir.path().join("keys.log"),
        };
        assert!(DiagnosticSink::from_config(&config).is_none());

        config.enabled = true;
        assert!(DiagnosticSink::from_config(&config).is_some());

        config.path = dir.path().join("missing").join("keys.log");
        assert!(DiagnosticSink::from_config(&config).is_none());
    }
}
