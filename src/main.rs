use board_view::{AppConfig, Role};

fn main() -> board_view::Result<()> {
    // Info level unless RUST_LOG says otherwise
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    log::info!("Starting as {}", config.role.label());

    match config.role {
        Role::Server => board_view::run_server_headless(&config),
        Role::Client | Role::Host => board_view::run_app(&config),
    }
}
