//! Desktop Ball entry point
//!
//! Loads settings and hands control to the native overlay window.

use std::process::ExitCode;

use desktop_ball::Settings;
use desktop_ball::platform::native;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Desktop Ball starting...");

    let settings = Settings::load();
    log::debug!("Settings: {settings:?}");

    match native::run(settings) {
        Ok(()) => {
            log::info!("Desktop Ball stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
