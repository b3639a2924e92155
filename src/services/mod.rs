pub mod color_bands;
pub mod diagnostic_sink;
pub mod event_recorder;
pub mod input_classifier;
pub mod keyboard_listener;
pub mod overlay_driver;
pub mod rate_estimator;
pub mod renderer;

pub use color_bands::ColorBands;
pub use diagnostic_sink::DiagnosticSink;
pub use event_recorder::EventRecorder;
pub use input_classifier::InputClassifier;
pub use keyboard_listener::create_keyboard_listener;
pub use overlay_driver::OverlayDriver;
pub use rate_estimator::RateEstimator;
pub use renderer::TerminalRenderer;
