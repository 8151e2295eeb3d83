//! Venue-side errors

use courier_core::DispatchError;
use thiserror::Error;

/// Failures reported by a venue implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VenueError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected by venue: {0}")]
    Rejected(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unparseable venue response: {0}")]
    Parse(String),
}

/// All venue failures collapse into the `Venue` dispatch error; the
/// report only needs the reason text.
impl From<VenueError> for DispatchError {
    fn from(err: VenueError) -> Self {
        DispatchError::Venue(err.to_string())
    }
}

pub type VenueResult<T> = Result<T, VenueError>;
