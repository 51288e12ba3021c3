use anyhow::{Context, Result};
use colored::*;
use std::net::SocketAddr;
use tandem::server::{RelayConfig, RelayService};
use tokio::net::TcpListener;
use tracing::info;

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "TANDEM_BIND", default_value = "0.0.0.0:8081")]
    bind: SocketAddr,

    /// WebSocket endpoint path.
    #[arg(long, env = "TANDEM_WS_PATH", default_value = "/ws")]
    ws_path: String,

    /// Diagnostics endpoint path.
    #[arg(long, env = "TANDEM_ROOMS_PATH", default_value = "/rooms")]
    rooms_path: String,

    /// Text sent in the welcome envelope.
    #[arg(long, env = "TANDEM_WELCOME")]
    welcome: Option<String>,

    /// Longest accepted room identifier.
    #[arg(long, env = "TANDEM_MAX_ROOM_ID_LEN", default_value_t = 128)]
    max_room_id_len: usize,
}

impl ServeArgs {
    fn into_config(self) -> RelayConfig {
        let mut config = RelayConfig {
            bind: self.bind,
            ws_path: self.ws_path,
            rooms_path: self.rooms_path,
            max_room_id_len: self.max_room_id_len,
            ..RelayConfig::default()
        };
        if let Some(welcome) = self.welcome {
            config.welcome_message = welcome;
        }
        config
    }
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.into_config();
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    let addr = listener.local_addr()?;

    print_banner(addr, &config);

    let service = RelayService::new(config);
    tandem::server::serve(listener, service, crate::shutdown_signal()).await?;

    info!("Relay stopped");
    println!("{}", "Relay stopped.".yellow());
    Ok(())
}

fn print_banner(addr: SocketAddr, config: &RelayConfig) {
    println!("{}", "Tandem signaling relay".green().bold());
    println!("   WebSocket:   {}", format!("ws://{}{}?room=<id>", addr, config.ws_path).cyan());
    println!("   Rooms:       {}", format!("http://{}{}", addr, config.rooms_path).cyan());
    println!("   {}", "Press Ctrl-C to stop".dimmed());
}
