use super::*;
use pretty_assertions::assert_eq;

fn answered(mut order: Order, notes: &str) -> Order {
    order.factory_notes = Some(notes.to_string());
    order.seen_by_seller = false;
    order
}

#[test]
fn new_order_constructs_row_and_group() {
    let mut state = desk(Role::Sales, sample_board());

    let effects = push(
        &mut state,
        PushEvent::NewOrder {
            order: order(9, 4, Some("East"), OrderStatus::Pending),
        },
    );

    assert_eq!(effects, vec![DeskEffect::RequestFrame]);
    assert!(state.board.contains(OrderId(9)));
    let client = state.board.client(ClientId(4)).expect("new client group");
    assert_eq!(client.name, "Client 4");
    assert_eq!(client.badges[0].text, "1 order(s)");
    assert_eq!(state.stats.pending, 4);
}

#[test]
fn replayed_new_order_keeps_one_row() {
    let mut state = desk(Role::Sales, sample_board());
    let event = PushEvent::NewOrder {
        order: order(9, 4, Some("East"), OrderStatus::Pending),
    };

    push(&mut state, event.clone());
    push(&mut state, event);

    assert_eq!(state.board.len(), 6);
    assert_eq!(state.board.rows().filter(|row| row.order_id == OrderId(9)).count(), 1);
}

#[test]
fn own_modification_patches_existing_row() {
    let mut state = desk(Role::Sales, sample_board());
    let mut changed = order(4, 3, Some("South"), OrderStatus::Cancelled);
    changed.product_name = "Product 4 (large)".to_string();

    push(&mut state, PushEvent::OrderModified { order: changed });

    let row = state.board.row(OrderId(4)).expect("row");
    assert_eq!(row.product_name, "Product 4 (large)");
    assert!(!row.unacknowledged);
}

#[test]
fn factory_update_marks_unread_notes() {
    let mut state = desk(Role::Sales, sample_board());
    let notes = "Short on raw material, can ship half on Monday and the rest later";
    let mut updated = answered(order(1, 1, Some("North"), OrderStatus::Completed), notes);
    updated.operator_id = Some(OperatorId(2));
    updated.operator_name = Some("Pablo".to_string());

    let effects = push(&mut state, PushEvent::OrderUpdated { order: updated });

    let row = state.board.row(OrderId(1)).expect("row");
    assert_eq!(row.status, OrderStatus::Completed);
    assert_eq!(row.operator_label, "Pablo");
    assert_eq!(
        row.annotation.as_deref(),
        Some("Short on raw material, can ship half on Monday and...")
    );
    assert!(row.unacknowledged);
    assert!(row.highlighted);
    assert!(effects.contains(&DeskEffect::PlaySound));
    assert_eq!(state.stats.unacknowledged, 1);

    let client = state.board.client(ClientId(1)).expect("client");
    let texts: Vec<&str> = client.badges.iter().map(|badge| badge.text.as_str()).collect();
    assert_eq!(texts, vec!["2 order(s)", "New"]);
}

#[test]
fn update_for_missing_row_is_ignored() {
    let mut state = desk(Role::Sales, sample_board());
    let before = state.board.clone();

    let effects = push(
        &mut state,
        PushEvent::OrderUpdated {
            order: order(77, 1, Some("North"), OrderStatus::Completed),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.board, before);
}

#[test]
fn unassigned_operator_reads_unassigned() {
    let mut state = desk(Role::Sales, sample_board());

    push(
        &mut state,
        PushEvent::OrderUpdated {
            order: order(2, 1, Some("North"), OrderStatus::Completed),
        },
    );

    let row = state.board.row(OrderId(2)).expect("row");
    assert_eq!(row.operator_label, "Unassigned");
}

#[test]
fn factory_seen_notice_is_a_toast_only() {
    let mut state = desk(Role::Sales, sample_board());
    let before = state.board.clone();

    push(
        &mut state,
        PushEvent::OrderSeenByFactory {
            order_id: OrderId(5),
        },
    );

    assert_eq!(state.board, before);
    assert_eq!(
        latest_toast(&state),
        (
            ToastLevel::Info,
            "The factory has seen order #5".to_string()
        )
    );
}

#[test]
fn sales_route_headers_carry_no_badges() {
    let mut state = desk(Role::Sales, sample_board());
    push(
        &mut state,
        PushEvent::OrderUpdated {
            order: answered(order(4, 3, Some("South"), OrderStatus::Cancelled), "Out of stock"),
        },
    );

    assert!(state.board.routes.iter().all(|route| route.badges.is_empty()));
}
