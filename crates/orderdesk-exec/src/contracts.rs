use serde::Deserialize;
use serde::Serialize;

use orderdesk_core::MutationRequest;
use orderdesk_core::Order;
use orderdesk_core::RequestOutcome;

use crate::transport::TransportError;

pub const BOARD_PATH: &str = "/api/orders";

/// HTTP method and path of the endpoint serving `request`.
pub fn endpoint(request: &MutationRequest) -> (&'static str, String) {
    let path = match request {
        MutationRequest::SetStatus { order_id, .. } => format!("/factory/orders/{order_id}/status"),
        MutationRequest::AssignOperator { order_id, .. } => {
            format!("/factory/orders/{order_id}/operator")
        }
        MutationRequest::MarkSeen { order_id } => format!("/factory/orders/{order_id}/seen"),
        MutationRequest::MarkRead { order_id } => format!("/sales/orders/{order_id}/read"),
    };
    ("POST", path)
}

/// Body of every mutation response. Only `success` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

impl MutationResponse {
    pub fn accepted(order: Option<Order>) -> Self {
        Self {
            success: true,
            error: None,
            order,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            order: None,
        }
    }

    pub fn from_json(body: &str) -> Result<Self, TransportError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn outcome(&self) -> RequestOutcome {
        if self.success {
            RequestOutcome::Accepted
        } else {
            RequestOutcome::Rejected {
                reason: self.error.clone(),
            }
        }
    }
}

/// Maps a transport round trip onto what the reducer needs to know.
pub fn outcome_of(result: Result<MutationResponse, TransportError>) -> RequestOutcome {
    match result {
        Ok(response) => response.outcome(),
        Err(err) => RequestOutcome::Failed {
            error: err.to_string(),
        },
    }
}

/// The board listing served at [`BOARD_PATH`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardListing {
    pub orders: Vec<Order>,
    #[serde(default)]
    pub total: usize,
}

impl BoardListing {
    pub fn new(orders: Vec<Order>) -> Self {
        let total = orders.len();
        Self { orders, total }
    }

    pub fn from_json(body: &str) -> Result<Self, TransportError> {
        Ok(serde_json::from_str(body)?)
    }
}
