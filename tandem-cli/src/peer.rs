use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tandem::RoomId;
use tandem::client::{
    ClientConfig, ClientEvent, ClientStatus, DEFAULT_RELAY_URL, PeerClient, RetryPolicy, Role,
    WebRtcPeerFactory, WsConnector,
};
use tracing::info;

#[derive(Clone, Copy, ValueEnum)]
pub enum PeerRole {
    /// Camera side; sends the offer.
    Phone,
    /// Viewer side; answers.
    Desktop,
}

impl From<PeerRole> for Role {
    fn from(role: PeerRole) -> Self {
        match role {
            PeerRole::Phone => Role::Offerer,
            PeerRole::Desktop => Role::Answerer,
        }
    }
}

#[derive(clap::Args)]
pub struct PeerArgs {
    /// Relay WebSocket endpoint.
    #[arg(long, env = "TANDEM_RELAY_URL", default_value = DEFAULT_RELAY_URL)]
    relay: String,

    /// Room to join.
    #[arg(long, env = "TANDEM_ROOM", default_value = RoomId::DEFAULT)]
    room: String,

    #[arg(long, value_enum, default_value = "desktop")]
    role: PeerRole,

    /// STUN/TURN url; repeat for several. Defaults to public STUN servers.
    #[arg(long = "ice-server")]
    ice_servers: Vec<String>,

    /// Seconds between reconnect attempts.
    #[arg(long, default_value_t = 3)]
    retry_delay: u64,

    /// Reconnect attempts before giving up.
    #[arg(long, default_value_t = 5)]
    max_retries: u32,
}

impl PeerArgs {
    fn into_config(self) -> ClientConfig {
        let mut config = ClientConfig::new(self.relay, RoomId::from_param(Some(&self.room)), self.role.into());
        config.retry = RetryPolicy::fixed(Duration::from_secs(self.retry_delay), self.max_retries);
        if !self.ice_servers.is_empty() {
            config.ice_servers = self.ice_servers;
        }
        config
    }
}

pub async fn run(args: PeerArgs) -> Result<()> {
    let config = args.into_config();
    println!(
        "{} {} in room {} via {}",
        "Tandem peer".green().bold(),
        config.role.to_string().bold(),
        config.room.as_str().cyan(),
        config.relay_url.cyan()
    );

    let factory = Arc::new(WebRtcPeerFactory::new(config.ice_servers.clone()));
    let (client, mut events) = PeerClient::spawn(config, Arc::new(WsConnector), factory);

    let shutdown = crate::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Ctrl-C received");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                let done = matches!(event, ClientEvent::GaveUp);
                print_event(&event);
                if done {
                    break;
                }
            }
        }
    }

    client.close().await;
    println!("{}", "Peer stopped.".yellow());
    Ok(())
}

fn print_event(event: &ClientEvent) {
    match event {
        ClientEvent::Joined(room) => println!("{} {}", "joined".green(), room),
        ClientEvent::RelayLost { abnormal } => {
            let how = if *abnormal { "unexpectedly" } else { "cleanly" };
            println!("{} {}", "relay closed".yellow(), how);
        }
        ClientEvent::SessionState { session, state } => {
            println!("{} {} {}", "session".cyan(), session, state)
        }
        ClientEvent::Status(status) => {
            let label = status.to_string();
            let label = match status {
                ClientStatus::Connected => label.green().bold(),
                ClientStatus::Pending => label.normal(),
                ClientStatus::Failed => label.red().bold(),
                ClientStatus::Fallback => label.yellow().bold(),
            };
            println!("{} {}", "status".cyan(), label);
        }
        ClientEvent::Fallback => println!("{}", "falling back to local source".yellow().bold()),
        ClientEvent::GaveUp => println!("{}", "giving up on relay".red().bold()),
        ClientEvent::RemoteTrack(kind) => println!("{} {}", "remote track".green(), kind),
        ClientEvent::Error(message) => println!("{} {}", "error".red(), message),
    }
}
