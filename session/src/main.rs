use clap::Parser;
use log::{info, warn};
use session::game::TwoSlotState;
use session::input::{parse_intent, Intent};
use session::network::Session;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Display name for this participant
    #[arg(short, long)]
    name: String,

    /// Connection timeout in seconds
    #[arg(long, default_value = "10")]
    connect_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to relay: {}", args.server);
    info!("Controls: up/down/left/right to move, red/green/yellow/blue to recolor, quit to leave");

    let mut session = Session::connect(
        &args.server,
        &args.name,
        Duration::from_secs(args.connect_timeout),
    )
    .await?;

    let mut state = TwoSlotState::new();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            more = session.process_next(&mut state) => {
                if !more? {
                    break;
                }
            },

            line = stdin.next_line() => {
                let Some(text) = line? else {
                    session.send_intent(Intent::Disconnect).await?;
                    break;
                };

                match parse_intent(text.trim()) {
                    Some(Intent::Disconnect) => {
                        session.send_intent(Intent::Disconnect).await?;
                        break;
                    }
                    Some(intent) => {
                        if !session.send_intent(intent).await? {
                            warn!("Not spawned yet, input ignored");
                        }
                    }
                    None => warn!("Unknown input {:?}", text.trim()),
                }
            },
        }
    }

    Ok(())
}
