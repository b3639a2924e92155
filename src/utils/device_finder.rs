use crate::error::{Result, WpmError};
use crate::wpm_error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Минимум поддерживаемых клавиш у настоящей клавиатуры
const MIN_KEY_COUNT: usize = 20;

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти клавиатурное устройство: явный путь или автопоиск (`"auto"`)
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                WpmError::device_not_found(format!("Указанное устройство не найдено: {:?}", path))
            };
        }

        Self::auto_find_keyboard()
    }

    fn auto_find_keyboard() -> Result<PathBuf> {
        info!("Начинаем автопоиск клавиатурного устройства...");

        if let Ok(device) = Self::find_by_id() {
            info!("Найдено устройство по ID: {:?}", device);
            return Ok(device);
        }

        if let Ok(device) = Self::find_by_event_devices() {
            info!("Найдено устройство среди event устройств: {:?}", device);
            return Ok(device);
        }

        WpmError::device_not_found(
            "Не удалось найти подходящее клавиатурное устройство. \
             Убедитесь, что пользователь добавлен в группу 'input'",
        )
    }

    fn find_by_id() -> Result<PathBuf> {
        let by_id_dir = Path::new("/dev/input/by-id");

        if !by_id_dir.exists() {
            debug!("Директория /dev/input/by-id не существует");
            return WpmError::device_not_found("Директория by-id не найдена");
        }

        let entries = fs::read_dir(by_id_dir).map_err(|e| {
            wpm_error!(permission, "Нет доступа к /dev/input/by-id: {}", e)
        })?;

        let mut keyboards = Vec::new();

        for entry in entries {
            let path = entry?.path();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();

            let Some(priority) = by_id_priority(&name) else {
                continue;
            };

            if !Self::is_device_accessible(&path) {
                warn!("Устройство {:?} недоступно", path);
                continue;
            }

            if Self::is_keyboard_device(&path) {
                info!("Добавлена клавиатура: {} (приоритет: {})", name, priority);
                keyboards.push((path, priority));
            } else {
                debug!("Устройство не прошло проверку как клавиатура: {}", name);
            }
        }

        // Сортируем по приоритету и возвращаем лучшее
        keyboards.sort_by(|a, b| b.1.cmp(&a.1));

        keyboards
            .into_iter()
            .next()
            .map(|(path, _)| path)
            .ok_or_else(|| wpm_error!(device_not_found, "Клавиатурное устройство не найдено в by-id"))
    }

    fn find_by_event_devices() -> Result<PathBuf> {
        let input_dir = Path::new("/dev/input");

        let entries = fs::read_dir(input_dir)
            .map_err(|e| wpm_error!(permission, "Нет доступа к /dev/input: {}", e))?;

        let mut event_devices = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("event"))
            {
                event_devices.push(path);
            }
        }

        event_devices.sort_by_key(|path| event_number(path));

        for device_path in event_devices {
            debug!("Проверяем устройство: {:?}", device_path);

            if Self::is_device_accessible(&device_path) && Self::is_keyboard_device(&device_path) {
                return Ok(device_path);
            }
        }

        WpmError::device_not_found("Не найдено доступное клавиатурное устройство среди event устройств")
    }

    fn is_keyboard_device(device_path: &Path) -> bool {
        let device = match evdev::Device::open(device_path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Не удалось открыть устройство {:?}: {}", device_path, e);
                return false;
            }
        };

        let device_name = device.name().unwrap_or("Unknown").to_lowercase();
        if is_pointer_name(&device_name) {
            debug!("Исключаем устройство как мышь/тачпад: {:?} ({})", device_path, device_name);
            return false;
        }

        // Для подсчёта WPM нужны буквы, пробел и Enter
        let has_keys = device.supported_keys().is_some_and(|keys| {
            keys.contains(evdev::KeyCode::KEY_A)
                && keys.contains(evdev::KeyCode::KEY_SPACE)
                && keys.contains(evdev::KeyCode::KEY_ENTER)
                && keys.iter().count() > MIN_KEY_COUNT
        });

        if has_keys {
            info!("Устройство {:?} подходит как клавиатура", device_path);
        } else {
            debug!("Устройство {:?} не подходит как клавиатура (имя: {})", device_path, device_name);
        }

        has_keys
    }

    fn is_device_accessible(device_path: &Path) -> bool {
        match fs::File::open(device_path) {
            Ok(_) => true,
            Err(e) => {
                debug!("Устройство {:?} недоступно: {}", device_path, e);
                false
            }
        }
    }
}

/// Приоритет записи из /dev/input/by-id; `None` для не-клавиатур
fn by_id_priority(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    if !(lower.contains("kbd") || lower.contains("keyboard")) || !lower.contains("event") {
        return None;
    }
    if is_pointer_name(&lower) {
        debug!("Исключаем как мышь: {}", name);
        return None;
    }

    Some(if name.ends_with("event-kbd") {
        100
    } else if lower.contains("keyboard") {
        50
    } else {
        10
    })
}

fn is_pointer_name(lower_name: &str) -> bool {
    ["mouse", "deathadder", "touchpad", "trackpoint"]
        .iter()
        .any(|marker| lower_name.contains(marker))
}

/// Номер из имени `eventN` для естественной сортировки
fn event_number(path: &Path) -> u32 {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix("event"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_keyboard_device_with_specific_path() {
        // Тест с несуществующим путем
        let result = DeviceFinder::find_keyboard_device("/non/existent/path");
        assert!(matches!(result, Err(WpmError::DeviceNotFound(_))));
    }

    #[test]
    fn test_find_keyboard_device_with_existing_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(DeviceFinder::find_keyboard_device(path).unwrap(), file.path());
    }

    #[test]
    fn test_by_id_priority() {
        assert_eq!(by_id_priority("usb-Logitech_USB_Keyboard-event-kbd"), Some(100));
        assert_eq!(by_id_priority("usb-Some_Keyboard-if01-event-joystick"), Some(50));
        assert_eq!(by_id_priority("usb-Razer_DeathAdder-event-kbd"), None);
        assert_eq!(by_id_priority("usb-Logitech_USB_Receiver-event-mouse"), None);
    }

    #[test]
    fn test_event_number_sorting() {
        let mut paths: Vec<PathBuf> = ["event10", "event2", "event1"]
            .iter()
            .map(|n| PathBuf::from("/dev/input").join(n))
            .collect();
        paths.sort_by_key(|path| event_number(path));

        assert_eq!(paths[0], PathBuf::from("/dev/input/event1"));
        assert_eq!(paths[2], PathBuf::from("/dev/input/event10"));
    }
}
