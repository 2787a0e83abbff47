use std::process::ExitCode;

use tracing::error;

mod app;
mod scenario;

fn main() -> ExitCode {
    match app::build_app(std::env::args_os()) {
        Ok(wiring) => app::run(wiring),
        Err(err) => {
            error!(error = %err, "scenario_failed");
            ExitCode::FAILURE
        }
    }
}
