use crate::config::Config;
use crate::error::Result;
use crate::events::KeyEvent;
use crate::services::input_classifier::{CountableEvent, InputClassifier};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::error;

/// Trait for keyboard listeners that can run in different modes
#[async_trait::async_trait]
pub trait KeyboardListenerTrait {
    /// Run the keyboard listener until `shutdown` flips to `true`
    async fn run(self: Box<Self>, shutdown: watch::Receiver<bool>) -> Result<()>;
}

/// Factory function to create an appropriate keyboard listener based on the dry_run flag
pub fn create_keyboard_listener(
    config: Arc<Config>,
    classifier: InputClassifier,
    dry_run: bool,
) -> Result<Box<dyn KeyboardListenerTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_keyboard_listener::DryRunKeyboardListener::new(
            config,
            classifier,
        )?))
    } else {
        Ok(Box::new(super::keyboard_listener::RealKeyboardListener::new(
            config,
            classifier,
        )?))
    }
}

/// Передать событие классификатору, не давая панике остановить слушателя
pub(super) fn dispatch(classifier: &mut InputClassifier, event: &KeyEvent) -> Option<CountableEvent> {
    match catch_unwind(AssertUnwindSafe(|| classifier.classify(event))) {
        Ok(result) => result,
        Err(_) => {
            error!("Паника при классификации события {}, событие пропущено", event);
            None
        }
    }
}

/// Ожидание сигнала остановки; закрытый канал тоже означает остановку
pub(super) async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
