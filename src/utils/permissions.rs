use crate::error::Result;
use crate::wpm_error;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const INPUT_DIR: &str = "/dev/input";

/// Проверить права доступа к необходимым ресурсам
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    check_input_devices_access(Path::new(INPUT_DIR))?;
    check_not_root(std::env::var("USER").ok().as_deref());

    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_input_devices_access(input_dir: &Path) -> Result<()> {
    if !input_dir.exists() {
        return Err(wpm_error!(
            permission,
            "Директория {} не существует",
            input_dir.display()
        ));
    }

    match fs::read_dir(input_dir) {
        Ok(_) => {
            info!("Доступ к {} подтвержден", input_dir.display());
            Ok(())
        }
        Err(e) => Err(wpm_error!(
            permission,
            "Нет доступа к {}: {}. Добавьте пользователя в группу 'input'",
            input_dir.display(),
            e
        )),
    }
}

/// Чтение клавиатуры не требует root, только группу `input`
fn check_not_root(user: Option<&str>) -> bool {
    match user {
        Some("root") => {
            warn!("⚠️  Приложение запущено от имени root!");
            warn!("   Для чтения клавиатуры достаточно группы 'input':");
            for command in get_setup_commands() {
                warn!("   {}", command);
            }
            false
        }
        Some(user) => {
            info!("Приложение запущено от имени пользователя: {}", user);
            true
        }
        None => {
            warn!("Не удалось определить пользователя");
            true
        }
    }
}

/// Получить рекомендуемые команды для настройки прав доступа
pub fn get_setup_commands() -> Vec<&'static str> {
    vec![
        "sudo usermod -a -G input $USER",
        "(затем перезайдите в систему)",
    ]
}
