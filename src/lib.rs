pub mod app;
pub mod asset;
pub mod audio;
pub mod error;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use error::Error;

use app::App;
use settings::Settings;
use winit::event_loop::EventLoop;

fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

/// Boots the demo and runs it until the window closes or a fatal error
/// surfaces. All startup errors are unrecoverable by design.
pub fn run() -> Result<(), Error> {
    init_logging();

    log::info!("starting meadow");

    let event_loop = EventLoop::new()
        .map_err(|e| Error::Initialization(format!("event loop creation failed: {e}")))?;
    let mut app = App::new(Settings::load());

    event_loop
        .run_app(&mut app)
        .map_err(|e| Error::Initialization(format!("event loop failed: {e}")))?;

    log::info!("shutdown complete");
    Ok(())
}
