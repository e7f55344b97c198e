use anyhow::Result;
use tokio::io::BufReader;
use tracing::info;
use iqx_doorbus::init;

/// The main entry point of the door provider
///
/// Every argument names the location of one door. Without arguments the usage is printed and the
/// process exits with a failure status before anything is constructed.
#[tokio::main]
async fn main() {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "iqx-doorbus".to_string());
    let locations: Vec<String> = args.collect();

    if locations.is_empty() {
        eprintln!("Usage: {} location1 [location2 [... [locationN] ...]]", program);
        std::process::exit(1);
    }

    if let Err(e) = run(&locations).await {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}


/// The core logic of the door provider
///
/// 1. Loads settings, initializes logging and connects to the bus
/// 2. Creates and publishes one door per location
/// 3. Runs the interactive command loop on stdin/stdout until `q` or end of input
/// 4. Takes every door still on the bus off it again
async fn run(locations: &[String]) -> Result<()> {
    let mut app = init::initialize(locations).await?;

    app.dispatcher
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("Shutting down, removing doors from the bus...");
    app.dispatcher.registry().retract_all().await;
    Ok(())
}
