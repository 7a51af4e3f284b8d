use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::state::OperatorId;
use super::state::OrderId;
use super::state::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestTicket(pub u64);

impl fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// The row control a request locks while it is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlField {
    Status,
    Operator,
    Acknowledge,
}

/// One outbound mutation. Each maps to exactly one endpoint and one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum MutationRequest {
    SetStatus {
        order_id: OrderId,
        status: OrderStatus,
    },
    AssignOperator {
        order_id: OrderId,
        operator_id: Option<OperatorId>,
    },
    MarkSeen {
        order_id: OrderId,
    },
    MarkRead {
        order_id: OrderId,
    },
}

impl MutationRequest {
    pub fn order_id(&self) -> OrderId {
        match self {
            Self::SetStatus { order_id, .. }
            | Self::AssignOperator { order_id, .. }
            | Self::MarkSeen { order_id }
            | Self::MarkRead { order_id } => *order_id,
        }
    }

    pub fn field(&self) -> ControlField {
        match self {
            Self::SetStatus { .. } => ControlField::Status,
            Self::AssignOperator { .. } => ControlField::Operator,
            Self::MarkSeen { .. } | Self::MarkRead { .. } => ControlField::Acknowledge,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SetStatus { .. } => "set-status",
            Self::AssignOperator { .. } => "assign-operator",
            Self::MarkSeen { .. } => "mark-seen",
            Self::MarkRead { .. } => "mark-read",
        }
    }
}

/// A control's value before the user touched it; restored on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlValue {
    Status(OrderStatus),
    Operator(Option<OperatorId>),
    Acknowledge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub ticket: RequestTicket,
    pub request: MutationRequest,
    pub previous: ControlValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RequestOutcome {
    Accepted,
    /// The server answered with `success: false`.
    Rejected {
        #[serde(default)]
        reason: Option<String>,
    },
    /// No usable answer: unreachable endpoint or undecodable response.
    Failed {
        error: String,
    },
}

/// Requests awaiting a response, keyed by ticket. At most one request per
/// order and control is in flight at a time.
#[derive(Debug, Clone)]
pub struct InFlightRequests {
    next_ticket: u64,
    pending: BTreeMap<RequestTicket, PendingRequest>,
}

impl Default for InFlightRequests {
    fn default() -> Self {
        Self {
            next_ticket: 1,
            pending: BTreeMap::new(),
        }
    }
}

impl InFlightRequests {
    /// Registers a request and hands out its ticket, or `None` when the same
    /// order and control already has one outstanding.
    pub fn begin(&mut self, request: MutationRequest, previous: ControlValue) -> Option<RequestTicket> {
        if self.is_in_flight(request.order_id(), request.field()) {
            return None;
        }
        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.insert(
            ticket,
            PendingRequest {
                ticket,
                request,
                previous,
            },
        );
        Some(ticket)
    }

    pub fn settle(&mut self, ticket: RequestTicket) -> Option<PendingRequest> {
        self.pending.remove(&ticket)
    }

    pub fn is_in_flight(&self, order_id: OrderId, field: ControlField) -> bool {
        self.pending
            .values()
            .any(|pending| pending.request.order_id() == order_id && pending.request.field() == field)
    }

    /// Forgets every outstanding request. Tickets keep counting up so a late
    /// response from before the clear never matches a new request.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingRequest> {
        self.pending.values()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn set_status(id: u64, status: OrderStatus) -> MutationRequest {
        MutationRequest::SetStatus {
            order_id: OrderId(id),
            status,
        }
    }

    #[test]
    fn duplicate_submission_for_same_control_is_refused() {
        let mut requests = InFlightRequests::default();
        let first = requests.begin(
            set_status(1, OrderStatus::Completed),
            ControlValue::Status(OrderStatus::Pending),
        );
        let second = requests.begin(
            set_status(1, OrderStatus::Cancelled),
            ControlValue::Status(OrderStatus::Pending),
        );
        let other_field = requests.begin(
            MutationRequest::MarkSeen { order_id: OrderId(1) },
            ControlValue::Acknowledge,
        );

        assert_eq!(first, Some(RequestTicket(1)));
        assert_eq!(second, None);
        assert_eq!(other_field, Some(RequestTicket(2)));
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn settling_frees_the_control() {
        let mut requests = InFlightRequests::default();
        let ticket = requests
            .begin(
                set_status(4, OrderStatus::Completed),
                ControlValue::Status(OrderStatus::Pending),
            )
            .expect("ticket");

        let pending = requests.settle(ticket).expect("pending");
        assert_eq!(pending.previous, ControlValue::Status(OrderStatus::Pending));
        assert!(!requests.is_in_flight(OrderId(4), ControlField::Status));
        assert!(requests.settle(ticket).is_none());
    }

    #[test]
    fn tickets_survive_clear() {
        let mut requests = InFlightRequests::default();
        requests.begin(set_status(1, OrderStatus::Completed), ControlValue::Status(OrderStatus::Pending));
        requests.clear();

        let ticket = requests.begin(
            set_status(1, OrderStatus::Completed),
            ControlValue::Status(OrderStatus::Pending),
        );
        assert_eq!(ticket, Some(RequestTicket(2)));
    }

    #[test]
    fn requests_serialize_with_a_tag() {
        let json = serde_json::to_value(MutationRequest::AssignOperator {
            order_id: OrderId(9),
            operator_id: None,
        })
        .expect("encode");
        assert_eq!(
            json,
            serde_json::json!({"request": "assign_operator", "order_id": 9, "operator_id": null})
        );
    }
}
