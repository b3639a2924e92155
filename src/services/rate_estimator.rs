use crate::services::color_bands::{ColorBand, ColorBands};
use crate::services::event_recorder::EventRecorder;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Символов в одном «слове» (стандартная конвенция, не зависит от режима)
pub const CHARS_PER_WORD: f64 = 5.0;

/// Кольцевой буфер последних значений WPM для спарклайна
#[derive(Debug, Clone)]
pub struct WpmHistory {
    samples: VecDeque<u32>,
    capacity: usize,
}

impl WpmHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, wpm: u32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(wpm);
    }

    /// От старых к новым
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[allow(dead_code)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Результат одного тика выборки
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub wpm15: u32,
    pub wpm30: u32,
    pub wpm60: u32,
    pub band: ColorBand,
}

/// Перевод количества событий в WPM для заданного окна
pub fn wpm_from_count(count: usize, window_secs: f64) -> u32 {
    if !window_secs.is_finite() || window_secs <= 0.0 {
        return 0;
    }
    let words = count as f64 / CHARS_PER_WORD;
    let minutes = window_secs / 60.0;
    // `as` усекает к нулю и насыщается на границах u32
    (words / minutes) as u32
}

/// Оценщик скорости набора.
///
/// Принадлежит таймеру выборки; с потоком слушателя разделяет только
/// `EventRecorder`. История WPM синхронизации не требует.
pub struct RateEstimator {
    recorder: Arc<EventRecorder>,
    windows: [f64; 3],
    bands: ColorBands,
    history: WpmHistory,
}

impl RateEstimator {
    pub fn new(
        recorder: Arc<EventRecorder>,
        windows: [f64; 3],
        bands: ColorBands,
        history_len: usize,
    ) -> Self {
        Self {
            recorder,
            windows,
            bands,
            history: WpmHistory::new(history_len),
        }
    }

    #[allow(dead_code)]
    pub fn wpm(&self, window_secs: f64) -> u32 {
        self.wpm_at(window_secs, Instant::now())
    }

    pub fn wpm_at(&self, window_secs: f64, now: Instant) -> u32 {
        if !window_secs.is_finite() || window_secs <= 0.0 {
            return 0;
        }
        wpm_from_count(self.recorder.count_in_window_at(window_secs, now), window_secs)
    }

    pub fn color_for(&self, wpm: u32) -> &ColorBand {
        self.bands.color_for(wpm)
    }

    pub fn sample_tick(&mut self) -> Sample {
        self.sample_tick_at(Instant::now())
    }

    /// Все три окна считаются от одного и того же `now`
    pub fn sample_tick_at(&mut self, now: Instant) -> Sample {
        let [w15, w30, w60] = self.windows;
        let wpm15 = self.wpm_at(w15, now);
        let wpm30 = self.wpm_at(w30, now);
        let wpm60 = self.wpm_at(w60, now);

        self.history.push(wpm15);

        Sample {
            wpm15,
            wpm30,
            wpm60,
            band: self.color_for(wpm15).clone(),
        }
    }

    pub fn history(&self) -> &WpmHistory {
        &self.history
    }

    pub fn windows(&self) -> [f64; 3] {
        self.windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::color_bands::Rgb;
    use std::time::Duration;

    fn bands() -> ColorBands {
        ColorBands::new(vec![
            ColorBand::new("slow", 30, Rgb { r: 0xff, g: 0x4d, b: 0x4f }),
            ColorBand::new("avg", 60, Rgb { r: 0xff, g: 0xb0, b: 0x20 }),
            ColorBand::new("good", 90, Rgb { r: 0x00, g: 0xc8, b: 0x53 }),
            ColorBand::new("best", 9999, Rgb { r: 0x00, g: 0xbc, b: 0xd4 }),
        ])
        .unwrap()
    }

    fn estimator(history_len: usize) -> (Arc<EventRecorder>, RateEstimator) {
        let recorder = Arc::new(EventRecorder::new(60.0));
        let estimator = RateEstimator::new(
            Arc::clone(&recorder),
            [15.0, 30.0, 60.0],
            bands(),
            history_len,
        );
        (recorder, estimator)
    }

    #[test]
    fn test_three_events_in_fifteen_seconds() {
        let (recorder, estimator) = estimator(60);
        let base = Instant::now();
        let now = base + Duration::from_secs(20);
        for offset in [14.9, 10.0, 1.0] {
            recorder.record(now - Duration::from_secs_f64(offset));
        }

        // 3 / 5 = 0.6 слова за 0.25 минуты
        assert_eq!(estimator.wpm_at(15.0, now), 2);
    }

    #[test]
    fn test_wpm_from_count() {
        assert_eq!(wpm_from_count(0, 15.0), 0);
        assert_eq!(wpm_from_count(25, 60.0), 5);
        assert_eq!(wpm_from_count(50, 15.0), 40);
        assert_eq!(wpm_from_count(10, 0.0), 0);
        assert_eq!(wpm_from_count(10, -1.0), 0);
    }

    #[test]
    fn test_wpm_monotonic_in_count() {
        let mut previous = 0;
        for count in 0..500 {
            let wpm = wpm_from_count(count, 30.0);
            assert!(wpm >= previous);
            previous = wpm;
        }
    }

    #[test]
    fn test_non_positive_window_is_zero() {
        let (recorder, estimator) = estimator(60);
        let now = Instant::now();
        recorder.record(now);
        assert_eq!(estimator.wpm_at(0.0, now), 0);
        assert_eq!(estimator.wpm_at(-15.0, now), 0);
    }

    #[test]
    fn test_sample_tick_pushes_fifteen_second_value() {
        let (recorder, mut estimator) = estimator(60);
        let base = Instant::now();
        // 100 событий за последние 10 s: 20 слов
        for i in 0..100 {
            recorder.record(base + Duration::from_millis(i * 100));
        }
        let now = base + Duration::from_secs(10);

        let sample = estimator.sample_tick_at(now);
        assert_eq!(sample.wpm15, 80);
        assert_eq!(sample.wpm30, 40);
        assert_eq!(sample.wpm60, 20);
        assert_eq!(sample.band.name(), "good");
        assert_eq!(estimator.history().to_vec(), vec![80]);
    }

    #[test]
    fn test_color_for_catch_all() {
        let (_, estimator) = estimator(60);
        assert_eq!(estimator.color_for(30).name(), "slow");
        assert_eq!(estimator.color_for(31).name(), "avg");
        assert_eq!(estimator.color_for(10000).name(), "best");
    }

    #[test]
    fn test_history_capacity() {
        let mut history = WpmHistory::new(5);
        for wpm in 0..8 {
            history.push(wpm);
        }
        assert_eq!(history.len(), 5);
        assert_eq!(history.to_vec(), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_history_bounded_through_ticks() {
        let (_, mut estimator) = estimator(3);
        let now = Instant::now();
        for _ in 0..10 {
            estimator.sample_tick_at(now);
        }
        assert_eq!(estimator.history().len(), 3);
        assert_eq!(estimator.history().capacity(), 3);
    }
}
