use crate::config::Config;
use crate::error::Result;
use crate::{debug_if_enabled, wpm_error};
use crate::events::{KeyCode, KeyEvent, KeyState};
use crate::services::input_classifier::InputClassifier;
use crate::utils::DeviceFinder;
use evdev::{Device, EventStream, EventType};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::key_mapping::KeyMapper;
use super::modifier_state::ModifierState;
use super::r#trait::{dispatch, wait_for_shutdown, KeyboardListenerTrait};

/// После стольких ошибок чтения подряд устройство считается потерянным
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 50;

pub struct RealKeyboardListener {
    classifier: InputClassifier,
    stream: EventStream,
    device_name: String,
    modifier_state: ModifierState,
    recorded_total: u64,
}

impl RealKeyboardListener {
    pub fn new(config: Arc<Config>, classifier: InputClassifier) -> Result<Self> {
        info!("Инициализация RealKeyboardListener");

        let device_path = DeviceFinder::find_keyboard_device(&config.input.device_path)?;

        let device = Device::open(&device_path).map_err(|e| {
            wpm_error!(
                device_not_found,
                "Не удалось открыть устройство {:?}: {}",
                device_path,
                e
            )
        })?;

        // Устройство не захватывается: события продолжают доходить до приложений
        let device_name = device.name().unwrap_or("Unknown").to_string();
        Self::log_device(&device);

        let stream = device.into_event_stream().map_err(|e| {
            wpm_error!(
                service_unavailable,
                "Не удалось создать поток событий для {:?}: {}",
                device_path,
                e
            )
        })?;

        Ok(Self {
            classifier,
            stream,
            device_name,
            modifier_state: ModifierState::new(),
            recorded_total: 0,
        })
    }

    async fn run_impl(mut self, mut shutdown: tokio::sync::watch::Receiver<bool>) -> Result<()> {
        info!(
            "RealKeyboardListener запущен на '{}', режим подсчёта: {:?}",
            self.device_name,
            self.classifier.mode()
        );

        let mut consecutive_errors = 0u32;

        loop {
            tokio::select! {
                event = self.stream.next_event() => match event {
                    Ok(event) => {
                        consecutive_errors = 0;
                        self.handle_event(event);
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        error!("Ошибка чтения событий: {}", e);
                        if consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                            return Err(wpm_error!(
                                service_unavailable,
                                "Устройство '{}' перестало отвечать: {}",
                                self.device_name,
                                e
                            ));
                        }
                        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    }
                },
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        info!(
            "RealKeyboardListener остановлен, записано отметок: {}",
            self.recorded_total
        );
        Ok(())
    }

    fn handle_event(&mut self, event: evdev::InputEvent) {
        if event.event_type() != EventType::KEY {
            return;
        }

        let Some(key_event) = translate_key(
            &mut self.modifier_state,
            event.code(),
            event.value(),
        ) else {
            debug_if_enabled!("Пропуск события: code={} value={}", event.code(), event.value());
            return;
        };

        debug_if_enabled!("Событие клавиши [{}]: {}", self.device_name, key_event);
        if dispatch(&mut self.classifier, &key_event).is_some_and(|e| e.recorded.is_some()) {
            self.recorded_total += 1;
        }
    }

    fn log_device(device: &Device) {
        info!("Устройство: {}", device.name().unwrap_or("Unknown"));
        info!("Физический путь: {:?}", device.physical_path());
        info!("Уникальный ID: {:?}", device.unique_name());
    }
}

/// Перевод сырого evdev-события клавиши в `KeyEvent`.
///
/// Обновляет состояние модификаторов. Возвращает `None` для отпусканий и
/// неизвестных значений; автоповтор передаётся дальше как `KeyState::Repeat`.
pub(super) fn translate_key(
    modifier_state: &mut ModifierState,
    code: u16,
    value: i32,
) -> Option<KeyEvent> {
    let Some(state) = KeyState::from_evdev_value(value) else {
        debug!("Неизвестное значение события: {}", value);
        return None;
    };

    match state {
        KeyState::Pressed => modifier_state.update_key(evdev::KeyCode::new(code), true),
        KeyState::Released => {
            modifier_state.update_key(evdev::KeyCode::new(code), false);
            return None;
        }
        KeyState::Repeat => {}
    }

    let modifiers = modifier_state.to_modifiers();
    // Ctrl+символ даёт управляющий код, а не печатный символ
    let character = if modifiers.ctrl || modifiers.super_key {
        None
    } else {
        let shift = if KeyMapper::is_letter(code) {
            modifier_state.letter_shift()
        } else {
            modifier_state.shift()
        };
        KeyMapper::get_char(code, shift)
    };

    Some(KeyEvent {
        key_code: KeyCode(code),
        state,
        modifiers,
        character,
        key: KeyMapper::get_symbolic_key(code),
        timestamp: Instant::now(),
    })
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for RealKeyboardListener {
    async fn run(self: Box<Self>, shutdown: tokio::sync::watch::Receiver<bool>) -> Result<()> {
        (*self).run_impl(shutdown).await
    }
}

impl Drop for RealKeyboardListener {
    fn drop(&mut self) {
        info!("Освобождение устройства '{}'", self.device_name);
    }
}
