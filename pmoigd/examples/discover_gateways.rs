//! Liste les passerelles IGD du réseau local et leur adresse externe.
//!
//! ```text
//! cargo run -p pmoigd --example discover_gateways [local_address]
//! ```

use std::env;

use anyhow::Result;
use pmoconfig::get_config;
use pmoigd::{Discoverer, IgdOptions, init_logging};

fn main() -> Result<()> {
    let config = get_config();
    init_logging(&config);

    let mut options = IgdOptions::from_config(&config);
    if let Some(local_address) = env::args().nth(1) {
        options = options.with_local_address(Some(local_address));
    }

    let gateways = Discoverer::new(options).discover();
    if gateways.is_empty() {
        println!("No Internet Gateway Device found");
        return Ok(());
    }

    for igd in &gateways {
        println!("{} [{}]", igd.friendly_identifier(), igd.uuid());
        println!("  description: {}", igd.url());
        println!("  local address: {}", igd.local_ip());

        for service in igd.services() {
            println!("  * [{}] {}", service.id(), service.control_url());
            match service.get_external_ip_address() {
                Ok(Some(ip)) => println!("      external IP: {}", ip),
                Ok(None) => println!("      external IP: (none)"),
                Err(e) => println!("      external IP: error: {}", e),
            }
        }
    }

    Ok(())
}
