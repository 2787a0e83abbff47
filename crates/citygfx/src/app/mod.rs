mod input;
mod loop_runner;
mod metrics;
mod renderer;

pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig};
pub use metrics::{FrameMetricsSnapshot, MetricsHandle};
pub use renderer::Renderer;
