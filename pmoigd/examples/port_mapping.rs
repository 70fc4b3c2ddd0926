//! Ajoute ou supprime une redirection de port sur toutes les passerelles.
//!
//! ```text
//! cargo run -p pmoigd --example port_mapping add tcp 6881 6881 [lease_secs]
//! cargo run -p pmoigd --example port_mapping delete tcp 6881
//! ```

use std::env;

use anyhow::{Context, Result, anyhow};
use pmoigd::{Discoverer, IgdOptions, Protocol};

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage:\n  {0} add <tcp|udp> <external_port> <internal_port> [lease_secs]\n  {0} delete <tcp|udp> <external_port>",
        program
    );
    std::process::exit(1);
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        usage(&args[0]);
    }

    let protocol: Protocol = args[2].parse().map_err(|e: String| anyhow!(e))?;
    let external_port: u16 = args[3]
        .parse()
        .with_context(|| format!("Invalid external port: {}", args[3]))?;

    let gateways = Discoverer::new(IgdOptions::default()).discover();
    if gateways.is_empty() {
        return Err(anyhow!("No Internet Gateway Device found"));
    }

    match args[1].as_str() {
        "add" => {
            let internal_port: u16 = match args.get(4) {
                Some(port) => port
                    .parse()
                    .with_context(|| format!("Invalid internal port: {}", port))?,
                None => usage(&args[0]),
            };
            let lease_secs: u32 = match args.get(5) {
                Some(lease) => lease
                    .parse()
                    .with_context(|| format!("Invalid lease: {}", lease))?,
                None => 0,
            };

            for igd in &gateways {
                igd.add_port_mapping(protocol, external_port, internal_port, "pmoigd", lease_secs)
                    .with_context(|| format!("AddPortMapping on {}", igd.friendly_identifier()))?;
                println!(
                    "{}: {} {} -> {}:{}",
                    igd.friendly_identifier(),
                    protocol,
                    external_port,
                    igd.local_ip(),
                    internal_port
                );
            }
        }
        "delete" => {
            for igd in &gateways {
                igd.delete_port_mapping(protocol, external_port)
                    .with_context(|| format!("DeletePortMapping on {}", igd.friendly_identifier()))?;
                println!("{}: {} {} removed", igd.friendly_identifier(), protocol, external_port);
            }
        }
        _ => usage(&args[0]),
    }

    Ok(())
}
