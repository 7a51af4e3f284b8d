use super::*;
use pretty_assertions::assert_eq;

fn deleted(id: u64) -> PushEvent {
    PushEvent::OrderDeleted {
        order_id: OrderId(id),
        client_id: None,
    }
}

#[test]
fn log_seq_is_monotonic() {
    let mut state = desk(Role::Factory, sample_board());
    push(&mut state, deleted(1));
    push(&mut state, deleted(2));
    push(&mut state, deleted(3));

    let seqs: Vec<u64> = state.log.iter().map(|entry| entry.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
}

#[test]
fn log_capacity_eviction_is_fifo() {
    let mut small = config(Role::Factory);
    small.display.log_capacity = 3;
    let mut state = DeskState::with_orders(&small, sample_board());

    for id in 1..=5 {
        push(&mut state, deleted(id));
    }

    let seqs: Vec<u64> = state.log.iter().map(|entry| entry.seq).collect();
    assert_eq!(seqs, vec![3, 4, 5]);
}

#[test]
fn clear_log_resets_sequence_to_one() {
    let mut state = desk(Role::Factory, sample_board());
    push(&mut state, deleted(1));
    push(&mut state, deleted(2));

    user(&mut state, UserAction::ClearLog);
    push(&mut state, deleted(3));

    let seqs: Vec<u64> = state.log.iter().map(|entry| entry.seq).collect();
    assert_eq!(seqs, vec![1]);
}

#[test]
fn entries_name_their_order_and_source() {
    let mut state = desk(Role::Factory, sample_board());
    push(&mut state, deleted(4));
    runtime(&mut state, RuntimeAction::BoardLoaded(sample_board()));

    let entries: Vec<(LogSource, Option<OrderId>)> = state
        .log
        .iter()
        .map(|entry| (entry.source, entry.order_id))
        .collect();
    assert_eq!(
        entries,
        vec![
            (LogSource::Push, Some(OrderId(4))),
            (LogSource::Board, None)
        ]
    );
}
