use thiserror::Error;

use crate::description::DescriptionError;
use crate::soap::SoapParseError;
use crate::ssdp::SsdpError;

#[derive(Error, Debug)]
pub enum IgdError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("URL {0} has no host")]
    MissingHost(String),
    #[error(transparent)]
    Ssdp(#[from] SsdpError),
    #[error(transparent)]
    Description(#[from] DescriptionError),
    #[error("Failed to build SOAP request: {0}")]
    SoapBuild(#[from] xmltree::Error),
    #[error(transparent)]
    SoapParse(#[from] SoapParseError),
    /// The gateway answered a control action with an HTTP status >= 400.
    /// `body` holds the raw response (usually a SOAP fault) for inspection.
    #[error("{action}: {status}")]
    Action {
        action: String,
        status: String,
        body: String,
    },
}

impl IgdError {
    pub fn invalid_url(url: &str, err: url::ParseError) -> Self {
        IgdError::InvalidUrl(url.to_string(), err)
    }

    pub fn action(action: &str, status: String, body: String) -> Self {
        IgdError::Action {
            action: action.to_string(),
            status,
            body,
        }
    }

    /// True for errors reported by the gateway itself rather than by the transport.
    pub fn is_remote_action(&self) -> bool {
        matches!(self, IgdError::Action { .. })
    }
}
