//! Headless host for the pairing server
//!
//! Runs the tick loop a game or visualization would normally drive, logging
//! connection state and touch activity instead of rendering it. Useful for
//! trying out a phone pairing without any graphical frontend.

use clap::Parser;
use log::{debug, info};
use std::thread;
use std::time::Duration;
use touchlink::TouchInput;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Port to listen on for the phone connection
    #[clap(short, long, default_value = "50000")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value = "60")]
    tick_rate: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut input = TouchInput::new(args.port)?;
    match input.url() {
        Some(url) => println!("Open {} on your phone to pair", url),
        None => println!(
            "No network interface found; open http://<this-host>:{}/ on your phone",
            args.port
        ),
    }

    let tick = Duration::from_secs_f32(1.0 / args.tick_rate as f32);
    let mut was_connected = false;

    loop {
        input.update();

        if input.connected() != was_connected {
            was_connected = input.connected();
            info!(
                "Phone {}",
                if was_connected {
                    "connected"
                } else {
                    "disconnected"
                }
            );
        }

        if input.resized() {
            let (width, height) = input.screen_size();
            info!("Phone screen is now {}x{}", width, height);
        }
        for &id in input.started_touches() {
            info!("Touch {} started", id);
        }
        for &id in input.moved_touches() {
            debug!("Touch {} moved", id);
        }
        for &id in input.ended_touches() {
            info!("Touch {} ended", id);
        }
        for &id in input.canceled_touches() {
            info!("Touch {} canceled", id);
        }

        thread::sleep(tick);
    }
}
