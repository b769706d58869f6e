use clap::Parser;
use tokio::signal;

use oncodetect::app_state::{AppConfig, AppState};
use oncodetect::server::startup;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    let app_state = AppState::new(&config)?;

    actix_web::rt::System::new().block_on(async move {
        tokio::select! {
            res = startup(config, app_state) => {
                res.map_err(anyhow::Error::from)
            }
            _ = signal::ctrl_c() => {
                println!("Received Ctrl+C, shutting down");
                Ok(())
            }
        }
    })
}
