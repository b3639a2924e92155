use crate::debug_if_enabled;
use crate::error::Result;
use crate::services::rate_estimator::{RateEstimator, Sample};
use crate::services::renderer::{Frame, Renderer};
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

/// Периодический драйвер: раз в `sample_interval` снимает выборку и передаёт её рендереру
pub struct OverlayDriver {
    estimator: RateEstimator,
    renderer: Box<dyn Renderer>,
    sample_interval: Duration,
}

impl OverlayDriver {
    pub fn new(
        estimator: RateEstimator,
        renderer: Box<dyn Renderer>,
        sample_interval: Duration,
    ) -> Self {
        Self {
            estimator,
            renderer,
            sample_interval,
        }
    }

    /// Один тик: выборка, история, отрисовка
    pub fn tick(&mut self) -> Sample {
        let sample = self.estimator.sample_tick();
        let history = self.estimator.history().to_vec();

        self.renderer.render(&Frame {
            sample: &sample,
            history: &history,
            windows: self.estimator.windows(),
        });

        debug_if_enabled!(
            "Выборка: {}/{}/{} WPM, полоса {} ({}), история {}",
            sample.wpm15,
            sample.wpm30,
            sample.wpm60,
            sample.band.name(),
            sample.band.color(),
            self.estimator.history().len()
        );
        sample
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "OverlayDriver запущен, интервал выборки {}мс",
            self.sample_interval.as_millis()
        );

        let mut ticker = interval(self.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("OverlayDriver остановлен");
        Ok(())
    }
}
