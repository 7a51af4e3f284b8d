//! Applies one order's current state to its row.
//!
//! Everything here is a plain patch: applying the same order twice leaves the
//! row exactly as applying it once. Whether a change counts as unacknowledged
//! is decided by the caller, which knows which event delivered it.

use super::config::DisplayConfig;
use super::state::OperatorDirectory;
use super::state::Order;
use super::state::Role;
use super::view::OperatorControl;
use super::view::OrderRow;
use super::view::StatusControl;

/// Cuts `text` to the configured number of characters, appending the
/// continuation marker only when something was cut.
pub fn annotation_excerpt(text: &str, display: &DisplayConfig) -> String {
    let text = text.trim();
    if text.chars().count() <= display.annotation_limit {
        return text.to_string();
    }
    let mut excerpt: String = text.chars().take(display.annotation_limit).collect();
    excerpt.push_str(&display.continuation);
    excerpt
}

pub fn row_from_order(
    role: Role,
    order: &Order,
    display: &DisplayConfig,
    operators: &OperatorDirectory,
) -> OrderRow {
    let editable = role == Role::Factory;
    let unacknowledged = order.unacknowledged_for(role);
    OrderRow {
        order_id: order.id,
        client_id: order.client_id,
        route: order.route.clone(),
        product_name: order.product_name.clone(),
        quantity: order.quantity,
        unit: order.unit.clone(),
        status: order.status,
        operator: order.operator_id,
        operator_label: operators.label(order.operator_id),
        annotation: order
            .annotation_for(role)
            .map(|text| annotation_excerpt(text, display)),
        unacknowledged,
        awaiting_reply: order.awaiting_reply,
        highlighted: false,
        visible: true,
        status_control: StatusControl {
            value: order.status,
            enabled: editable,
        },
        operator_control: OperatorControl {
            value: order.operator_id,
            enabled: editable,
        },
        acknowledge_enabled: unacknowledged,
    }
}

/// Patches content, status, operator, annotation and the awaiting-reply flag.
///
/// A control whose request is in flight is disabled; its value is left alone
/// so a push event cannot overwrite what the user just picked.
pub fn apply_order(
    row: &mut OrderRow,
    role: Role,
    order: &Order,
    display: &DisplayConfig,
    operators: &OperatorDirectory,
) {
    row.product_name = order.product_name.clone();
    row.quantity = order.quantity;
    row.unit = order.unit.clone();

    row.status = order.status;
    if row.status_control.enabled {
        row.status_control.value = order.status;
    }

    apply_operator(row, order, operators);

    if let Some(text) = order.annotation_for(role) {
        row.annotation = Some(annotation_excerpt(text, display));
    }
    row.awaiting_reply = order.awaiting_reply;
}

pub fn apply_operator(row: &mut OrderRow, order: &Order, operators: &OperatorDirectory) {
    row.operator = order.operator_id;
    row.operator_label = operators.label(order.operator_id);
    if row.operator_control.enabled {
        row.operator_control.value = order.operator_id;
    }
}

pub fn mark_unacknowledged(row: &mut OrderRow) {
    row.unacknowledged = true;
    row.acknowledge_enabled = true;
}

/// Drops the unacknowledged marker, its affordance and any highlight.
pub fn clear_unacknowledged(row: &mut OrderRow) {
    row.unacknowledged = false;
    row.acknowledge_enabled = false;
    row.highlighted = false;
}

pub fn highlight(row: &mut OrderRow) {
    row.highlighted = true;
}
