use thiserror::Error;

use orderdesk_core::MutationRequest;
use orderdesk_core::Order;
use orderdesk_core::Role;

use crate::contracts::MutationResponse;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("undecodable response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Collaborator-provided mutation endpoints and board listing. Calls block; the
/// host runs them off the event loop.
pub trait OrderTransport: Send + Sync {
    fn send(&self, request: &MutationRequest) -> Result<MutationResponse, TransportError>;

    fn fetch_board(&self, role: Role) -> Result<Vec<Order>, TransportError>;
}
