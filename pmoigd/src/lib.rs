//! # pmoigd - control point UPnP pour passerelles Internet (IGD)
//!
//! Découverte SSDP des `InternetGatewayDevice` v1/v2, résolution de leurs
//! services WAN (`WANIPConnection`, `WANPPPConnection`) et actions SOAP de
//! redirection de ports et d'adresse externe.
//!
//! ```rust,no_run
//! use pmoigd::{Discoverer, IgdOptions, Protocol};
//!
//! let gateways = Discoverer::new(IgdOptions::default()).discover();
//! for igd in &gateways {
//!     println!("{} -> {:?}", igd.friendly_identifier(), igd.get_external_ip_address());
//!     igd.add_port_mapping(Protocol::Tcp, 6881, 6881, "pmoigd", 3600)?;
//! }
//! # Ok::<(), pmoigd::IgdError>(())
//! ```

mod http;

pub mod config_ext;
pub mod description;
pub mod discovery;
pub mod errors;
pub mod igd;
pub mod local_address;
pub mod logs;
pub mod options;
pub mod soap;
pub mod ssdp;

pub use crate::config_ext::IgdConfigExt;
pub use crate::description::{DescriptionError, IgdVersion};
pub use crate::discovery::{Discoverer, discover};
pub use crate::errors::IgdError;
pub use crate::igd::{Igd, IgdService, Protocol};
pub use crate::local_address::resolve_local_address;
pub use crate::logs::{init_logging, init_logging_with_level};
pub use crate::options::IgdOptions;
pub use crate::soap::SoapClient;
