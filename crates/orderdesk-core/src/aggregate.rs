//! Badge and stat-card counts.
//!
//! Counts are always recomputed from a snapshot of the rows currently on the
//! board; nothing is incremented or decremented in place. Two tallies are kept:
//! `all` counts every row regardless of filters and feeds the stat cards, while
//! `visible` counts only rows the filters leave shown.

use std::collections::BTreeMap;

use serde::Serialize;

use super::state::ClientId;
use super::state::OrderId;
use super::state::OrderStatus;
use super::state::Role;
use super::state::RouteKey;
use super::view::BoardView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFacts {
    pub order_id: OrderId,
    pub client_id: ClientId,
    pub route: Option<RouteKey>,
    pub status: OrderStatus,
    pub unacknowledged: bool,
    pub awaiting_reply: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub unacknowledged: usize,
    pub awaiting_reply: usize,
}

impl Tally {
    fn add(&mut self, facts: &RowFacts) {
        self.total += 1;
        match facts.status {
            OrderStatus::Pending => self.pending += 1,
            OrderStatus::Completed => self.completed += 1,
            OrderStatus::Cancelled => self.cancelled += 1,
        }
        if facts.unacknowledged {
            self.unacknowledged += 1;
        }
        if facts.awaiting_reply {
            self.awaiting_reply += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregates {
    pub all: Tally,
    pub visible: Tally,
    /// Keyed by route as well: a client moved between routes has one group per
    /// route, each counted over its own rows.
    pub clients: BTreeMap<(Option<RouteKey>, ClientId), Tally>,
    pub routes: BTreeMap<Option<RouteKey>, Tally>,
}

/// Counts a row snapshot. Group tallies cover every member row; only
/// `Aggregates::visible` looks at visibility.
pub fn recount(rows: &[RowFacts]) -> Aggregates {
    let mut aggregates = Aggregates::default();
    for facts in rows {
        aggregates.all.add(facts);
        if facts.visible {
            aggregates.visible.add(facts);
        }
        aggregates
            .clients
            .entry((facts.route.clone(), facts.client_id))
            .or_default()
            .add(facts);
        aggregates
            .routes
            .entry(facts.route.clone())
            .or_default()
            .add(facts);
    }
    aggregates
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    Total,
    Pending,
    Unacknowledged,
    AwaitingReply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub kind: BadgeKind,
    pub count: usize,
    pub text: String,
}

impl Badge {
    fn new(kind: BadgeKind, count: usize, text: String) -> Self {
        Self { kind, count, text }
    }
}

/// Badges for a client accordion header. The total badge is always present; the
/// others exist only while their count is non-zero.
pub fn client_badges(role: Role, tally: &Tally) -> Vec<Badge> {
    let mut badges = vec![Badge::new(
        BadgeKind::Total,
        tally.total,
        format!("{} order(s)", tally.total),
    )];
    match role {
        Role::Factory => {
            push_counted(&mut badges, BadgeKind::Pending, tally.pending, "pending");
            push_counted(&mut badges, BadgeKind::Unacknowledged, tally.unacknowledged, "modified");
            push_counted(&mut badges, BadgeKind::AwaitingReply, tally.awaiting_reply, "awaiting");
        }
        Role::Sales => {
            if tally.unacknowledged > 0 {
                badges.push(Badge::new(
                    BadgeKind::Unacknowledged,
                    tally.unacknowledged,
                    "New".to_string(),
                ));
            }
        }
    }
    badges
}

/// Badges for a route accordion header; none is shown at zero.
pub fn route_badges(role: Role, tally: &Tally) -> Vec<Badge> {
    let mut badges = Vec::new();
    if role == Role::Factory {
        push_counted(&mut badges, BadgeKind::Unacknowledged, tally.unacknowledged, "modified");
        push_counted(&mut badges, BadgeKind::Pending, tally.pending, "pending");
        push_counted(&mut badges, BadgeKind::AwaitingReply, tally.awaiting_reply, "awaiting");
    }
    badges
}

fn push_counted(badges: &mut Vec<Badge>, kind: BadgeKind, count: usize, noun: &str) {
    if count == 0 {
        return;
    }
    badges.push(Badge::new(kind, count, format!("{count} {noun}")));
}

/// The four numbers across the top of the dashboard. Always computed from every
/// row on the board, never from the filtered subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatCards {
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Factory: modifications awaiting acknowledgement. Sales: unread factory notes.
    pub unacknowledged: usize,
}

impl From<&Tally> for StatCards {
    fn from(tally: &Tally) -> Self {
        Self {
            pending: tally.pending,
            completed: tally.completed,
            cancelled: tally.cancelled,
            unacknowledged: tally.unacknowledged,
        }
    }
}

impl StatCards {
    pub fn labelled(&self, role: Role) -> [(&'static str, usize); 4] {
        let unacknowledged = match role {
            Role::Factory => "Modified",
            Role::Sales => "Notifications",
        };
        [
            ("Pending", self.pending),
            ("Completed", self.completed),
            ("Cancelled", self.cancelled),
            (unacknowledged, self.unacknowledged),
        ]
    }
}

/// Recounts the board and writes every group's badges. Returns the counts so the
/// caller can refresh the stat cards. Running it twice without a change in
/// between leaves the board identical.
pub fn recalculate(board: &mut BoardView, role: Role) -> Aggregates {
    let aggregates = recount(&board.facts());
    let empty = Tally::default();
    for route in &mut board.routes {
        let tally = aggregates.routes.get(&route.route).unwrap_or(&empty);
        route.badges = route_badges(role, tally);
        for client in &mut route.clients {
            let tally = aggregates
                .clients
                .get(&(route.route.clone(), client.client_id))
                .unwrap_or(&empty);
            client.badges = client_badges(role, tally);
        }
    }
    aggregates
}
