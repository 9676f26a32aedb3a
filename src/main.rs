mod app;
mod bubble;
mod chat;
mod companion;
mod config;
mod input;
mod messages;
mod pet;
mod platform;
mod props;
mod render;
mod schedule;
mod sim;
mod store;
mod tray;
mod ui;

fn main() {
    env_logger::init();
    log::info!("deskpet starting up");

    if let Err(e) = app::run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
