use crate::config::Config;
use crate::error::Result;
use crate::wpm_error;
use crate::events::{KeyEvent, SymbolicKey};
use crate::services::input_classifier::InputClassifier;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use super::r#trait::{dispatch, wait_for_shutdown, KeyboardListenerTrait};

/// Эмуляция набора: по кругу «печатает» текст из конфигурации
pub struct DryRunKeyboardListener {
    classifier: InputClassifier,
    script: Vec<char>,
    keystroke_interval: Duration,
}

impl DryRunKeyboardListener {
    pub fn new(config: Arc<Config>, classifier: InputClassifier) -> Result<Self> {
        info!("Инициализация DryRunKeyboardListener");

        let script: Vec<char> = config.dry_run.text.chars().collect();
        if script.is_empty() {
            return Err(wpm_error!(config, "Пустой текст для dry-run режима"));
        }

        // Интервал тикера tokio должен быть конечным и ненулевым
        let cps = config.dry_run.chars_per_second;
        let keystroke_interval = Duration::try_from_secs_f64(1.0 / cps)
            .ok()
            .filter(|interval| !interval.is_zero())
            .ok_or_else(|| wpm_error!(config, "Недопустимый темп dry-run: {} символов/с", cps))?;

        Ok(Self {
            classifier,
            script,
            keystroke_interval,
        })
    }

    async fn run_impl(mut self, mut shutdown: tokio::sync::watch::Receiver<bool>) -> Result<()> {
        info!(
            "Dry-run режим - эмуляция {} нажатий по кругу, интервал {}мс",
            self.script.len(),
            self.keystroke_interval.as_millis()
        );

        let mut ticker = interval(self.keystroke_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut position = 0;
        let mut recorded_total = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let event = key_event_for(self.script[position]);
                    if dispatch(&mut self.classifier, &event).is_some_and(|e| e.recorded.is_some()) {
                        recorded_total += 1;
                    }
                    position = (position + 1) % self.script.len();
                    if position == 0 {
                        debug!("Dry-run текст воспроизведён полностью, начинаем заново");
                    }
                }
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        info!("DryRunKeyboardListener остановлен, записано отметок: {}", recorded_total);
        Ok(())
    }
}

/// Пробел и перевод строки становятся клавишами Space/Enter, остальное символами
fn key_event_for(ch: char) -> KeyEvent {
    match ch {
        ' ' => KeyEvent::key_press(SymbolicKey::Space),
        '\n' => KeyEvent::key_press(SymbolicKey::Enter),
        ch => KeyEvent::char_press(ch),
    }
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for DryRunKeyboardListener {
    async fn run(self: Box<Self>, shutdown: tokio::sync::watch::Receiver<bool>) -> Result<()> {
        (*self).run_impl(shutdown).await
    }
}
