mod beacon;
mod config;
mod server;

use anyhow::{Context, Result};
use clap::Parser;

use config::{
    pad_name, ServerConfig, DEFAULT_PORT, DEFAULT_RINK_CORNER, DEFAULT_RINK_LENGTH, DEFAULT_RINK_WIDTH, DEFAULT_TEAM_SIZE,
};
use server::GameServer;

#[derive(Parser)]
#[command(name = "hqm-server")]
#[command(about = "Authoritative HQM game server")]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value = "HQM Rust Server")]
    name: String,

    #[arg(long, help = "Advertise this server on the public server list")]
    public: bool,

    #[arg(long, default_value_t = DEFAULT_TEAM_SIZE)]
    team_size: u8,

    #[arg(long, default_value_t = DEFAULT_RINK_WIDTH)]
    rink_width: f32,

    #[arg(long, default_value_t = DEFAULT_RINK_LENGTH)]
    rink_length: f32,

    #[arg(long, default_value_t = DEFAULT_RINK_CORNER)]
    rink_corner: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        bind: args.bind,
        port: args.port,
        name: pad_name(args.name.as_bytes()),
        public: args.public,
        team_size: args.team_size,
        rink_width: args.rink_width,
        rink_length: args.rink_length,
        rink_corner: args.rink_corner,
    };

    let mut server = GameServer::new(config).context("failed to bind UDP socket")?;
    log::info!("listening on {}", server.local_addr()?);
    server.run();

    Ok(())
}
