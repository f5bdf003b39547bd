//! Compose the message described by a parameter file, send it through
//! the in-memory transport and print its MIME serialization.
//!
//! The parameter file and its sidecar files are left untouched.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example compose -- ./email.txt
//! ```

use std::env;

use paramail::{Composer, MemoryTransport};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("Usage: compose <param-file>");
        std::process::exit(1);
    };

    let composer = Composer::new();
    let transport = MemoryTransport::new();

    let config = composer.parse(&path).unwrap();

    println!("================================");
    println!("CONFIGURATION");
    println!("================================");
    println!();
    println!("{config}");
    println!();

    let msg = composer.send(&config, &transport).await.unwrap();

    println!("================================");
    println!("ASSEMBLED MESSAGE ({} part(s), {} skipped)", msg.parts.len(), msg.skipped.len());
    println!("================================");
    println!();

    for sent in transport.sent() {
        println!("{}", String::from_utf8_lossy(&sent.raw));
    }
}
