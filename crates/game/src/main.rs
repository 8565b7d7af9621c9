use std::process::ExitCode;

use tracing::error;

mod app;

fn main() -> ExitCode {
    match app::bootstrap::build_app() {
        Ok(app) => app::loop_runner::run(app),
        Err(message) => {
            error!(error = message.as_str(), "startup_failed");
            ExitCode::FAILURE
        }
    }
}
