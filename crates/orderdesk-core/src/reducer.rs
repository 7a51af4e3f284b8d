use std::time::Duration;

use super::actions::DeskAction;
use super::actions::RuntimeAction;
use super::actions::TimerKind;
use super::actions::UserAction;
use super::dispatch::ControlField;
use super::dispatch::ControlValue;
use super::dispatch::MutationRequest;
use super::dispatch::PendingRequest;
use super::dispatch::RequestOutcome;
use super::dispatch::RequestTicket;
use super::error::DeskError;
use super::events::PushEvent;
use super::filter::FilterChange;
use super::reconcile::apply_operator;
use super::reconcile::apply_order;
use super::reconcile::clear_unacknowledged;
use super::reconcile::highlight;
use super::reconcile::mark_unacknowledged;
use super::reconcile::row_from_order;
use super::state::ConnectionStatus;
use super::state::DeskState;
use super::state::LogEntry;
use super::state::LogLevel;
use super::state::LogSource;
use super::state::Order;
use super::state::OrderId;
use super::state::Role;
use super::state::ToastLevel;
use super::state::CONNECTION_LOST_BANNER;
use super::view::client_label;
use super::view::OrderRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskEffect {
    RequestFrame,
    PlaySound,
    ScheduleTimer {
        after: Duration,
        timer: TimerKind,
    },
    SendRequest {
        ticket: RequestTicket,
        request: MutationRequest,
    },
    ReloadBoard,
}

pub fn reduce(state: &mut DeskState, action: DeskAction) -> Vec<DeskEffect> {
    match action {
        DeskAction::Push(event) => match state.role {
            Role::Factory => reduce_factory_event(state, event),
            Role::Sales => reduce_sales_event(state, event),
        },
        DeskAction::User(user) => reduce_user(state, user),
        DeskAction::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

fn reduce_factory_event(state: &mut DeskState, event: PushEvent) -> Vec<DeskEffect> {
    match event {
        PushEvent::NewOrder { order } => {
            let mut effects = vec![DeskEffect::PlaySound];
            record(
                state,
                LogLevel::Info,
                Some(order.id),
                format!("new order #{} ({})", order.id, order.product_name),
            );
            toast(
                state,
                ToastLevel::Success,
                format!("New order! #{} - {}", order.id, order.product_name),
                &mut effects,
            );
            effects.push(DeskEffect::ScheduleTimer {
                after: state.timing.reload_delay(),
                timer: TimerKind::Reload,
            });
            effects.push(DeskEffect::RequestFrame);
            effects
        }
        PushEvent::OrderModified { order } => {
            state.operators.learn(&order);
            if !state.board.contains(order.id) {
                return reload_for_missing_row(state, order.id, "order_modified");
            }
            let mut effects = Vec::new();
            patch_row(state, &order, |row| {
                mark_unacknowledged(row);
                highlight(row);
            });
            state.refresh_view();
            record(
                state,
                LogLevel::Warn,
                Some(order.id),
                format!("order #{} modified by sales", order.id),
            );
            effects.push(highlight_timer(state, order.id));
            effects.push(DeskEffect::PlaySound);
            toast(
                state,
                ToastLevel::Warning,
                format!("Order #{} was modified by sales", order.id),
                &mut effects,
            );
            effects.push(DeskEffect::RequestFrame);
            effects
        }
        PushEvent::OrderUpdated { order } => {
            // Echo of a factory-side change; the payload carries the server's
            // view of the modification flag.
            state.operators.learn(&order);
            if !state.board.contains(order.id) {
                tracing::debug!(order_id = %order.id, "order_updated for order not on board");
                return Vec::new();
            }
            let modified = order.modified;
            patch_row(state, &order, |row| {
                if modified && !row.unacknowledged {
                    mark_unacknowledged(row);
                } else if !modified && row.unacknowledged {
                    clear_unacknowledged(row);
                }
            });
            state.refresh_view();
            record(
                state,
                LogLevel::Debug,
                Some(order.id),
                format!("order #{} now {}", order.id, order.status),
            );
            vec![DeskEffect::RequestFrame]
        }
        PushEvent::OrderSeenByFactory { order_id } => {
            let Some(row) = state.board.row_mut(order_id) else {
                tracing::debug!(%order_id, "seen acknowledgement for order not on board");
                return Vec::new();
            };
            clear_unacknowledged(row);
            state.refresh_view();
            record(
                state,
                LogLevel::Info,
                Some(order_id),
                format!("order #{order_id} acknowledged"),
            );
            vec![DeskEffect::RequestFrame]
        }
        other => reduce_shared_event(state, other),
    }
}

fn reduce_sales_event(state: &mut DeskState, event: PushEvent) -> Vec<DeskEffect> {
    match event {
        PushEvent::NewOrder { order } | PushEvent::OrderModified { order } => {
            state.operators.learn(&order);
            if order.archived {
                return Vec::new();
            }
            if state.board.contains(order.id) {
                let unacknowledged = order.unacknowledged_for(Role::Sales);
                patch_row(state, &order, |row| set_unacknowledged(row, unacknowledged));
            } else {
                let row = row_from_order(Role::Sales, &order, &state.display, &state.operators);
                state.board.insert_row(row, client_label(&order));
            }
            state.refresh_view();
            record(
                state,
                LogLevel::Info,
                Some(order.id),
                format!("order #{} placed on board", order.id),
            );
            vec![DeskEffect::RequestFrame]
        }
        PushEvent::OrderUpdated { order } => {
            state.operators.learn(&order);
            if !state.board.contains(order.id) {
                tracing::debug!(order_id = %order.id, "order_updated for order not on board");
                return Vec::new();
            }
            let unacknowledged = order.unacknowledged_for(Role::Sales);
            patch_row(state, &order, |row| {
                set_unacknowledged(row, unacknowledged);
                highlight(row);
            });
            state.refresh_view();
            record(
                state,
                LogLevel::Info,
                Some(order.id),
                format!("order #{} updated by factory: {}", order.id, order.status),
            );
            let mut effects = vec![highlight_timer(state, order.id), DeskEffect::PlaySound];
            toast(
                state,
                ToastLevel::Info,
                format!("Order #{} updated by the factory", order.id),
                &mut effects,
            );
            effects.push(DeskEffect::RequestFrame);
            effects
        }
        PushEvent::OrderSeenByFactory { order_id } => {
            if !state.board.contains(order_id) {
                return Vec::new();
            }
            record(
                state,
                LogLevel::Info,
                Some(order_id),
                format!("factory has seen order #{order_id}"),
            );
            let mut effects = Vec::new();
            toast(
                state,
                ToastLevel::Info,
                format!("The factory has seen order #{order_id}"),
                &mut effects,
            );
            effects.push(DeskEffect::RequestFrame);
            effects
        }
        other => reduce_shared_event(state, other),
    }
}

fn reduce_shared_event(state: &mut DeskState, event: PushEvent) -> Vec<DeskEffect> {
    match event {
        PushEvent::OrderDeleted { order_id, .. } => {
            if state.board.remove_row(order_id).is_none() {
                tracing::debug!(%order_id, "order_deleted for order not on board");
                return Vec::new();
            }
            state.refresh_view();
            record(
                state,
                LogLevel::Info,
                Some(order_id),
                format!("order #{order_id} deleted"),
            );
            let mut effects = Vec::new();
            toast(
                state,
                ToastLevel::Info,
                format!("Order #{order_id} deleted"),
                &mut effects,
            );
            effects.push(DeskEffect::RequestFrame);
            effects
        }
        PushEvent::OrderAssigned { order } => {
            state.operators.learn(&order);
            let Some(row) = state.board.row_mut(order.id) else {
                tracing::debug!(order_id = %order.id, "order_assigned for order not on board");
                return Vec::new();
            };
            apply_operator(row, &order, &state.operators);
            state.refresh_view();
            let label = state.operators.label(order.operator_id);
            record(
                state,
                LogLevel::Info,
                Some(order.id),
                format!("order #{} assigned to {label}", order.id),
            );
            vec![DeskEffect::RequestFrame]
        }
        PushEvent::WeekClosed {
            week,
            archived_count,
            message,
        } => {
            let message = message
                .unwrap_or_else(|| format!("{week} closed: {archived_count} orders archived"));
            record(state, LogLevel::Info, None, message.clone());
            let mut effects = Vec::new();
            toast(state, ToastLevel::Info, message, &mut effects);
            effects.push(DeskEffect::ScheduleTimer {
                after: state.timing.reload_delay(),
                timer: TimerKind::Reload,
            });
            effects.push(DeskEffect::RequestFrame);
            effects
        }
        PushEvent::NewOrder { .. }
        | PushEvent::OrderModified { .. }
        | PushEvent::OrderUpdated { .. }
        | PushEvent::OrderSeenByFactory { .. } => Vec::new(),
    }
}

fn reduce_user(state: &mut DeskState, action: UserAction) -> Vec<DeskEffect> {
    match action {
        UserAction::SetStatus { order_id, status } => {
            if state.role != Role::Factory {
                return not_available(state, "set_status");
            }
            let Some(row) = state.board.row(order_id) else {
                return missing_target(state, order_id, "set_status");
            };
            let previous = row.status_control.value;
            if previous == status {
                return Vec::new();
            }
            let request = MutationRequest::SetStatus { order_id, status };
            let Some(ticket) = begin_request(state, request.clone(), ControlValue::Status(previous))
            else {
                return Vec::new();
            };
            if let Some(row) = state.board.row_mut(order_id) {
                row.status_control.value = status;
                row.status_control.enabled = false;
            }
            record_user(state, order_id, format!("set order #{order_id} to {status}"));
            vec![
                DeskEffect::SendRequest { ticket, request },
                DeskEffect::RequestFrame,
            ]
        }
        UserAction::AssignOperator {
            order_id,
            operator_id,
        } => {
            if state.role != Role::Factory {
                return not_available(state, "assign_operator");
            }
            let Some(row) = state.board.row(order_id) else {
                return missing_target(state, order_id, "assign_operator");
            };
            let previous = row.operator_control.value;
            if previous == operator_id {
                return Vec::new();
            }
            let request = MutationRequest::AssignOperator {
                order_id,
                operator_id,
            };
            let Some(ticket) =
                begin_request(state, request.clone(), ControlValue::Operator(previous))
            else {
                return Vec::new();
            };
            if let Some(row) = state.board.row_mut(order_id) {
                row.operator_control.value = operator_id;
                row.operator_control.enabled = false;
            }
            let label = state.operators.label(operator_id);
            record_user(state, order_id, format!("assign order #{order_id} to {label}"));
            vec![
                DeskEffect::SendRequest { ticket, request },
                DeskEffect::RequestFrame,
            ]
        }
        UserAction::AcknowledgeSeen { order_id } => {
            let Some(row) = state.board.row(order_id) else {
                return missing_target(state, order_id, "acknowledge_seen");
            };
            if !row.can_acknowledge() {
                tracing::debug!(%order_id, "nothing to acknowledge");
                return Vec::new();
            }
            let request = match state.role {
                Role::Factory => MutationRequest::MarkSeen { order_id },
                Role::Sales => MutationRequest::MarkRead { order_id },
            };
            let Some(ticket) = begin_request(state, request.clone(), ControlValue::Acknowledge)
            else {
                return Vec::new();
            };
            if let Some(row) = state.board.row_mut(order_id) {
                row.acknowledge_enabled = false;
            }
            record_user(state, order_id, format!("{} order #{order_id}", request.label()));
            vec![
                DeskEffect::SendRequest { ticket, request },
                DeskEffect::RequestFrame,
            ]
        }
        UserAction::SetStatusFilter { status } => {
            apply_filter(state, FilterChange::Status(status))
        }
        UserAction::SetClientFilter { client_id } => {
            apply_filter(state, FilterChange::Client(client_id))
        }
        UserAction::SetOperatorFilter { operator_id } => {
            apply_filter(state, FilterChange::Operator(operator_id))
        }
        UserAction::SetRouteFilter { route } => apply_filter(state, FilterChange::Route(route)),
        UserAction::ClearFilters => apply_filter(state, FilterChange::ClearAll),
        UserAction::DismissToast { toast_id } => {
            if state.toasts.dismiss(toast_id) {
                vec![DeskEffect::RequestFrame]
            } else {
                Vec::new()
            }
        }
        UserAction::ClearLog => {
            state.log.clear();
            vec![DeskEffect::RequestFrame]
        }
    }
}

fn reduce_runtime(state: &mut DeskState, action: RuntimeAction) -> Vec<DeskEffect> {
    match action {
        RuntimeAction::Connected => {
            state.connection = ConnectionStatus::Connected;
            state.banner = None;
            record(state, LogLevel::Info, None, "connected");
            vec![DeskEffect::RequestFrame]
        }
        RuntimeAction::Disconnected => {
            state.connection = ConnectionStatus::Disconnected;
            state.banner = Some(CONNECTION_LOST_BANNER.to_string());
            record(state, LogLevel::Warn, None, "connection lost");
            let mut effects = Vec::new();
            toast(state, ToastLevel::Warning, CONNECTION_LOST_BANNER, &mut effects);
            effects.push(DeskEffect::RequestFrame);
            effects
        }
        RuntimeAction::RequestSettled { ticket, outcome } => settle_request(state, ticket, outcome),
        RuntimeAction::TimerFired(TimerKind::ClearHighlight(order_id)) => {
            match state.board.row_mut(order_id) {
                Some(row) if row.highlighted => {
                    row.highlighted = false;
                    vec![DeskEffect::RequestFrame]
                }
                _ => Vec::new(),
            }
        }
        RuntimeAction::TimerFired(TimerKind::DismissToast(toast_id)) => {
            if state.toasts.dismiss(toast_id) {
                vec![DeskEffect::RequestFrame]
            } else {
                Vec::new()
            }
        }
        RuntimeAction::TimerFired(TimerKind::Reload) => vec![DeskEffect::ReloadBoard],
        RuntimeAction::BoardLoaded(orders) => {
            let count = orders.len();
            state.load_board(orders);
            state.log.append(LogEntry::new(
                LogLevel::Info,
                LogSource::Board,
                format!(
                    "board loaded: {count} orders, {} on view",
                    state.on_view.visible_rows
                ),
            ));
            vec![DeskEffect::RequestFrame]
        }
        RuntimeAction::BoardLoadFailed(error) => {
            tracing::warn!(%error, "board reload failed");
            state.log.append(LogEntry::new(
                LogLevel::Error,
                LogSource::Board,
                format!("board reload failed: {error}"),
            ));
            let mut effects = Vec::new();
            toast(state, ToastLevel::Danger, "Could not reload orders", &mut effects);
            effects.push(DeskEffect::RequestFrame);
            effects
        }
    }
}

fn settle_request(
    state: &mut DeskState,
    ticket: RequestTicket,
    outcome: RequestOutcome,
) -> Vec<DeskEffect> {
    let Some(pending) = state.requests.settle(ticket) else {
        tracing::debug!(%ticket, "settlement for unknown request");
        return Vec::new();
    };
    let PendingRequest {
        request, previous, ..
    } = pending;
    let order_id = request.order_id();

    let Some(row) = state.board.row_mut(order_id) else {
        state.log.append(
            LogEntry::new(
                LogLevel::Info,
                LogSource::Request,
                format!("{} settled after order #{order_id} left the board", request.label()),
            )
            .for_order(order_id),
        );
        return Vec::new();
    };

    match request.field() {
        ControlField::Status => row.status_control.enabled = true,
        ControlField::Operator => row.operator_control.enabled = true,
        ControlField::Acknowledge => row.acknowledge_enabled = row.can_acknowledge(),
    }

    let mut effects = Vec::new();
    match outcome {
        RequestOutcome::Accepted => {
            let message = match &request {
                MutationRequest::SetStatus { status, .. } => {
                    row.status = *status;
                    row.status_control.value = *status;
                    format!("Status updated to: {status}")
                }
                MutationRequest::AssignOperator { operator_id, .. } => {
                    row.operator = *operator_id;
                    row.operator_label = state.operators.label(*operator_id);
                    row.operator_control.value = *operator_id;
                    "Operator assigned".to_string()
                }
                MutationRequest::MarkSeen { .. } => {
                    clear_unacknowledged(row);
                    format!("Order #{order_id} marked as seen")
                }
                MutationRequest::MarkRead { .. } => {
                    clear_unacknowledged(row);
                    row.awaiting_reply = false;
                    format!("Order #{order_id} marked as read")
                }
            };
            state.refresh_view();
            state.log.append(
                LogEntry::new(
                    LogLevel::Info,
                    LogSource::Request,
                    format!("{} accepted", request.label()),
                )
                .for_order(order_id),
            );
            toast(state, ToastLevel::Success, message, &mut effects);
        }
        RequestOutcome::Rejected { reason } => {
            revert_control(row, previous);
            let detail = reason.unwrap_or_else(|| "rejected".to_string());
            state.log.append(
                LogEntry::new(
                    LogLevel::Warn,
                    LogSource::Request,
                    format!("{} rejected: {detail}", request.label()),
                )
                .for_order(order_id),
            );
            toast(
                state,
                ToastLevel::Danger,
                format!("Could not {} order #{order_id}: {detail}", request.label()),
                &mut effects,
            );
        }
        RequestOutcome::Failed { error } => {
            revert_control(row, previous);
            tracing::warn!(%order_id, request = request.label(), %error, "mutation request failed");
            state.log.append(
                LogEntry::new(
                    LogLevel::Error,
                    LogSource::Request,
                    format!("{} failed: {error}", request.label()),
                )
                .for_order(order_id),
            );
            toast(state, ToastLevel::Danger, "Connection error", &mut effects);
        }
    }
    effects.push(DeskEffect::RequestFrame);
    effects
}

fn revert_control(row: &mut OrderRow, previous: ControlValue) {
    match previous {
        ControlValue::Status(status) => row.status_control.value = status,
        ControlValue::Operator(operator) => row.operator_control.value = operator,
        ControlValue::Acknowledge => {}
    }
}

fn begin_request(
    state: &mut DeskState,
    request: MutationRequest,
    previous: ControlValue,
) -> Option<RequestTicket> {
    let order_id = request.order_id();
    let label = request.label();
    let ticket = state.requests.begin(request, previous);
    if ticket.is_none() {
        tracing::debug!(%order_id, request = label, "request already in flight");
    }
    ticket
}

fn apply_filter(state: &mut DeskState, change: FilterChange) -> Vec<DeskEffect> {
    state.filters.set(change);
    state.refresh_view();
    tracing::debug!(
        rows = state.on_view.visible_rows,
        clients = state.on_view.visible_clients,
        routes = state.on_view.visible_routes,
        "filters applied"
    );
    vec![DeskEffect::RequestFrame]
}

fn patch_row<F>(state: &mut DeskState, order: &Order, mark: F)
where
    F: FnOnce(&mut OrderRow),
{
    let role = state.role;
    if let Some(row) = state.board.row_mut(order.id) {
        apply_order(row, role, order, &state.display, &state.operators);
        mark(row);
    }
}

fn set_unacknowledged(row: &mut OrderRow, unacknowledged: bool) {
    if unacknowledged {
        mark_unacknowledged(row);
    } else {
        row.unacknowledged = false;
        row.acknowledge_enabled = false;
    }
}

fn highlight_timer(state: &DeskState, order_id: OrderId) -> DeskEffect {
    DeskEffect::ScheduleTimer {
        after: state.timing.highlight(),
        timer: TimerKind::ClearHighlight(order_id),
    }
}

fn reload_for_missing_row(state: &mut DeskState, order_id: OrderId, event: &str) -> Vec<DeskEffect> {
    tracing::warn!(%order_id, event, "order not on board, reloading");
    record(
        state,
        LogLevel::Warn,
        Some(order_id),
        format!("{event} for order #{order_id} not on board, reloading"),
    );
    vec![DeskEffect::ReloadBoard]
}

fn missing_target(state: &mut DeskState, order_id: OrderId, action: &str) -> Vec<DeskEffect> {
    let err = DeskError::MissingRow(order_id);
    tracing::warn!(%err, action, "ignored user action");
    state.log.append(
        LogEntry::new(LogLevel::Warn, LogSource::User, format!("{action}: {err}"))
            .for_order(order_id),
    );
    Vec::new()
}

fn not_available(state: &mut DeskState, action: &'static str) -> Vec<DeskEffect> {
    let err = DeskError::ActionNotAvailable {
        role: state.role,
        action,
    };
    tracing::warn!(%err, "ignored user action");
    state
        .log
        .append(LogEntry::new(LogLevel::Warn, LogSource::User, err.to_string()));
    Vec::new()
}

fn toast(
    state: &mut DeskState,
    level: ToastLevel,
    message: impl Into<String>,
    effects: &mut Vec<DeskEffect>,
) {
    let id = state.toasts.push(level, message);
    effects.push(DeskEffect::ScheduleTimer {
        after: state.timing.toast(),
        timer: TimerKind::DismissToast(id),
    });
}

fn record(state: &mut DeskState, level: LogLevel, order_id: Option<OrderId>, message: impl Into<String>) {
    let mut entry = LogEntry::new(level, LogSource::Push, message);
    entry.order_id = order_id;
    state.log.append(entry);
}

fn record_user(state: &mut DeskState, order_id: OrderId, message: String) {
    state
        .log
        .append(LogEntry::new(LogLevel::Info, LogSource::User, message).for_order(order_id));
}

#[cfg(test)]
mod tests;
