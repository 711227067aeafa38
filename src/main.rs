#![deny(clippy::all, clippy::pedantic)]

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod command_handler;
pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod info;
pub mod lavalink_events;
pub mod radio;
pub mod state;
pub mod station;

#[tokio::main]
#[tracing::instrument]
async fn main() -> anyhow::Result<()> {
    print_banner();
    crate::gateway::initialize_and_run_bot().await
}

const BANNER: &str = r"
                           _
  ___  _ __   __ _  __ _  | | ___   _
 / _ \| '_ \ / _` |/ _` | | |/ / | | |
| (_) | | | | (_| | (_| | |   <| |_| |
 \___/|_| |_|\__, |\__,_| |_|\_\\__,_|
             |___/

Ongaku - K-Pop & J-Pop radio for your voice channel
";

fn print_banner() {
    let git_hash = env!("GIT_HASH");
    let build_time = env!("BUILD_TIME");
    let version = env!("APP_VERSION");

    println!("{BANNER}");
    println!("  Version   : {version}");
    println!("  Commit    : {git_hash}");
    println!("  Built at  : {build_time}");
    println!("--------------------------------------------------------------\n");
}
