use serde::Deserialize;
use serde::Serialize;

use super::dispatch::RequestOutcome;
use super::dispatch::RequestTicket;
use super::events::PushEvent;
use super::state::ClientId;
use super::state::OperatorId;
use super::state::Order;
use super::state::OrderId;
use super::state::OrderStatus;
use super::state::RouteKey;
use super::state::ToastId;

#[derive(Debug, Clone, PartialEq)]
pub enum DeskAction {
    Push(PushEvent),
    User(UserAction),
    Runtime(RuntimeAction),
}

impl From<PushEvent> for DeskAction {
    fn from(event: PushEvent) -> Self {
        Self::Push(event)
    }
}

impl From<UserAction> for DeskAction {
    fn from(action: UserAction) -> Self {
        Self::User(action)
    }
}

impl From<RuntimeAction> for DeskAction {
    fn from(action: RuntimeAction) -> Self {
        Self::Runtime(action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    SetStatus {
        order_id: OrderId,
        status: OrderStatus,
    },
    AssignOperator {
        order_id: OrderId,
        #[serde(default)]
        operator_id: Option<OperatorId>,
    },
    /// Factory: mark a sales modification as seen. Sales: mark factory notes read.
    AcknowledgeSeen {
        order_id: OrderId,
    },
    SetStatusFilter {
        #[serde(default)]
        status: Option<OrderStatus>,
    },
    SetClientFilter {
        #[serde(default)]
        client_id: Option<ClientId>,
    },
    SetOperatorFilter {
        #[serde(default)]
        operator_id: Option<OperatorId>,
    },
    SetRouteFilter {
        #[serde(default)]
        route: Option<RouteKey>,
    },
    ClearFilters,
    DismissToast {
        toast_id: ToastId,
    },
    ClearLog,
}

impl UserAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SetStatus { .. } => "set_status",
            Self::AssignOperator { .. } => "assign_operator",
            Self::AcknowledgeSeen { .. } => "acknowledge_seen",
            Self::SetStatusFilter { .. } => "set_status_filter",
            Self::SetClientFilter { .. } => "set_client_filter",
            Self::SetOperatorFilter { .. } => "set_operator_filter",
            Self::SetRouteFilter { .. } => "set_route_filter",
            Self::ClearFilters => "clear_filters",
            Self::DismissToast { .. } => "dismiss_toast",
            Self::ClearLog => "clear_log",
        }
    }
}

/// Transient timers. Each one is independent and never cancelled; when it
/// fires it acts on whatever is on the board at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    ClearHighlight(OrderId),
    DismissToast(ToastId),
    Reload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeAction {
    Connected,
    Disconnected,
    RequestSettled {
        ticket: RequestTicket,
        outcome: RequestOutcome,
    },
    TimerFired(TimerKind),
    BoardLoaded(Vec<Order>),
    BoardLoadFailed(String),
}
