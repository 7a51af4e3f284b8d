use pretty_assertions::assert_eq;

pub(super) use super::reduce;
pub(super) use super::DeskEffect;
pub(super) use crate::actions::DeskAction;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::TimerKind;
pub(super) use crate::actions::UserAction;
pub(super) use crate::config::DeskConfig;
pub(super) use crate::dispatch::ControlField;
pub(super) use crate::dispatch::MutationRequest;
pub(super) use crate::dispatch::RequestOutcome;
pub(super) use crate::dispatch::RequestTicket;
pub(super) use crate::events::PushEvent;
pub(super) use crate::filter::FilterOutcome;
pub(super) use crate::state::ClientId;
pub(super) use crate::state::ConnectionStatus;
pub(super) use crate::state::DeskState;
pub(super) use crate::state::LogLevel;
pub(super) use crate::state::LogSource;
pub(super) use crate::state::OperatorId;
pub(super) use crate::state::Order;
pub(super) use crate::state::OrderId;
pub(super) use crate::state::OrderStatus;
pub(super) use crate::state::Role;
pub(super) use crate::state::RouteKey;
pub(super) use crate::state::ToastLevel;

mod log_buffer;
mod sales_events;

fn config(role: Role) -> DeskConfig {
    DeskConfig {
        role,
        ..DeskConfig::default()
    }
}

fn order(id: u64, client: u64, route: Option<&str>, status: OrderStatus) -> Order {
    Order {
        id: OrderId(id),
        client_id: ClientId(client),
        client_name: Some(format!("Client {client}")),
        route: route.map(RouteKey::new),
        product_name: format!("Product {id}"),
        quantity: 10.0,
        unit: Some("kg".to_string()),
        status,
        operator_id: None,
        operator_name: None,
        factory_notes: None,
        seller_notes: None,
        modified: false,
        seen_by_factory: true,
        seen_by_seller: true,
        awaiting_reply: false,
        archived: false,
        created_at: None,
        updated_at: None,
        completed_at: None,
    }
}

fn desk(role: Role, orders: Vec<Order>) -> DeskState {
    DeskState::with_orders(&config(role), orders)
}

/// Two routes, three clients, five orders.
fn sample_board() -> Vec<Order> {
    vec![
        order(1, 1, Some("North"), OrderStatus::Pending),
        order(2, 1, Some("North"), OrderStatus::Completed),
        order(3, 2, Some("North"), OrderStatus::Pending),
        order(4, 3, Some("South"), OrderStatus::Cancelled),
        order(5, 3, Some("South"), OrderStatus::Pending),
    ]
}

fn push(state: &mut DeskState, event: PushEvent) -> Vec<DeskEffect> {
    reduce(state, DeskAction::Push(event))
}

fn user(state: &mut DeskState, action: UserAction) -> Vec<DeskEffect> {
    reduce(state, DeskAction::User(action))
}

fn runtime(state: &mut DeskState, action: RuntimeAction) -> Vec<DeskEffect> {
    reduce(state, DeskAction::Runtime(action))
}

fn settle(state: &mut DeskState, ticket: RequestTicket, outcome: RequestOutcome) -> Vec<DeskEffect> {
    runtime(state, RuntimeAction::RequestSettled { ticket, outcome })
}

fn sent_request(effects: &[DeskEffect]) -> (RequestTicket, MutationRequest) {
    effects
        .iter()
        .find_map(|effect| match effect {
            DeskEffect::SendRequest { ticket, request } => Some((*ticket, request.clone())),
            _ => None,
        })
        .expect("a request was sent")
}

fn scheduled(effects: &[DeskEffect]) -> Vec<TimerKind> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            DeskEffect::ScheduleTimer { timer, .. } => Some(*timer),
            _ => None,
        })
        .collect()
}

fn latest_toast(state: &DeskState) -> (ToastLevel, String) {
    let toast = state.toasts.latest().expect("a toast");
    (toast.level, toast.message.clone())
}

fn unacknowledged_rows(state: &DeskState) -> Vec<u64> {
    state
        .board
        .rows()
        .filter(|row| row.unacknowledged)
        .map(|row| row.order_id.0)
        .collect()
}

#[test]
fn initial_board_counts_every_row() {
    let state = desk(Role::Factory, sample_board());

    assert_eq!(state.board.len(), 5);
    assert_eq!(state.stats.pending, 3);
    assert_eq!(state.stats.completed, 1);
    assert_eq!(state.stats.cancelled, 1);
    assert_eq!(state.stats.unacknowledged, 0);
    assert_eq!(state.connection, ConnectionStatus::Connecting);
}
