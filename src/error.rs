use thiserror::Error;

#[derive(Error, Debug)]
pub enum WpmError {
    #[error("Ошибка конфигурации: {0}")]
    Config(String),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),
}

impl WpmError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(WpmError::DeviceNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, WpmError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! wpm_error {
    (config, $($arg:tt)*) => {
        $crate::error::WpmError::Config(format!($($arg)*))
    };
    (device_not_found, $($arg:tt)*) => {
        $crate::error::WpmError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::WpmError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::WpmError::ServiceUnavailable(format!($($arg)*))
    };
}
