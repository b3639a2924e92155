use parking_lot::Mutex;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Запас сверх наибольшего окна, в течение которого события не удаляются
pub const RETENTION_MARGIN: Duration = Duration::from_secs(5);
/// Нижняя граница горизонта хранения
pub const MIN_RETENTION: Duration = Duration::from_secs(70);

/// Буфер текущего слова (только для режима слов)
pub type WordBuffer = SmallVec<[char; 32]>;

#[derive(Debug, Default)]
struct RecorderState {
    /// Отметки времени в порядке добавления, самые старые впереди
    log: VecDeque<Instant>,
    word: WordBuffer,
}

impl RecorderState {
    fn prune(&mut self, cutoff: Option<Instant>) {
        if let Some(cutoff) = cutoff {
            while self.log.front().is_some_and(|&t| t < cutoff) {
                self.log.pop_front();
            }
        }
    }
}

/// Потокобезопасный журнал счётных событий.
///
/// Журнал событий и буфер слова защищены одним мьютексом: слушатель клавиатуры
/// пишет, таймер выборки читает и обрезает. Под замком не выполняется ни
/// ввод-вывод, ни отрисовка.
#[derive(Debug)]
pub struct EventRecorder {
    state: Mutex<RecorderState>,
    retention: Duration,
}

impl EventRecorder {
    /// Горизонт хранения: `max(70 s, max_window + 5 s)`.
    ///
    /// Любой запрос обрезает журнал не ближе этого горизонта, поэтому запрос
    /// короткого окна не может удалить данные, нужные длинному окну в том же тике.
    pub fn new(max_window_secs: f64) -> Self {
        let max_window = secs_to_duration(max_window_secs).unwrap_or_default();
        Self {
            state: Mutex::new(RecorderState::default()),
            retention: MIN_RETENTION.max(max_window + RETENTION_MARGIN),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn record(&self, timestamp: Instant) {
        self.state.lock().log.push_back(timestamp);
    }

    pub fn count_in_window(&self, window_secs: f64) -> usize {
        self.count_in_window_at(window_secs, Instant::now())
    }

    /// Подсчёт событий в `[now - window, now]` с предварительной обрезкой журнала
    pub fn count_in_window_at(&self, window_secs: f64, now: Instant) -> usize {
        let window = secs_to_duration(window_secs);
        let horizon = match window {
            Some(window) => self.retention.max(window + RETENTION_MARGIN),
            None => self.retention,
        };

        let mut state = self.state.lock();
        state.prune(now.checked_sub(horizon));

        let Some(window) = window.filter(|w| !w.is_zero()) else {
            return 0;
        };

        match now.checked_sub(window) {
            // Журнал отсортирован: считаем с конца до первой старой отметки
            Some(start) => state.log.iter().rev().take_while(|&&t| t >= start).count(),
            None => state.log.len(),
        }
    }

    /// Добавить символ к текущему слову
    pub fn push_char(&self, ch: char) {
        self.state.lock().word.push(ch);
    }

    /// Завершить слово: если буфер не пуст, записать отметку и очистить буфер.
    /// Возвращает `true`, если отметка записана.
    pub fn complete_word(&self, timestamp: Instant) -> bool {
        let mut state = self.state.lock();
        if state.word.is_empty() {
            return false;
        }
        state.word.clear();
        state.log.push_back(timestamp);
        true
    }

    #[cfg(test)]
    pub fn current_word(&self) -> String {
        self.state.lock().word.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().log.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn secs_to_duration(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs >= 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}
