use serde::Deserialize;
use serde::Serialize;

use super::state::ClientId;
use super::state::OperatorId;
use super::state::OrderStatus;
use super::state::RouteKey;
use super::view::BoardView;
use super::view::OrderRow;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub status: Option<OrderStatus>,
    pub client: Option<ClientId>,
    pub operator: Option<OperatorId>,
    pub route: Option<RouteKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Status(Option<OrderStatus>),
    Client(Option<ClientId>),
    Operator(Option<OperatorId>),
    Route(Option<RouteKey>),
    ClearAll,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterOutcome {
    pub visible_rows: usize,
    pub visible_clients: usize,
    pub visible_routes: usize,
}

/// Owns the four equality filters and decides which rows and groups are shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterEngine {
    state: FilterState,
}

impl FilterEngine {
    pub fn new(state: FilterState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != FilterState::default()
    }

    pub fn set(&mut self, change: FilterChange) {
        match change {
            FilterChange::Status(status) => self.state.status = status,
            FilterChange::Client(client) => self.state.client = client,
            FilterChange::Operator(operator) => self.state.operator = operator,
            FilterChange::Route(route) => self.state.route = route,
            FilterChange::ClearAll => self.state = FilterState::default(),
        }
    }

    /// Sets visibility on every row and group. Route and client filters act on
    /// whole groups and hide everything inside a non-matching group; status and
    /// operator filters act per row. A group stays visible only while something
    /// inside it is visible.
    pub fn apply(&self, board: &mut BoardView) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for route in &mut board.routes {
            let route_matches = self
                .state
                .route
                .as_ref()
                .map_or(true, |wanted| route.route.as_ref() == Some(wanted));

            let mut route_visible = false;
            for client in &mut route.clients {
                let client_matches = route_matches
                    && self
                        .state
                        .client
                        .map_or(true, |wanted| client.client_id == wanted);

                let mut client_visible = false;
                for row in &mut client.rows {
                    row.visible = client_matches && self.row_matches(row);
                    if row.visible {
                        client_visible = true;
                        outcome.visible_rows += 1;
                    }
                }
                client.visible = client_visible;
                if client_visible {
                    route_visible = true;
                    outcome.visible_clients += 1;
                }
            }
            route.visible = route_visible;
            if route_visible {
                outcome.visible_routes += 1;
            }
        }
        outcome
    }

    fn row_matches(&self, row: &OrderRow) -> bool {
        let status_ok = self.state.status.map_or(true, |wanted| row.status == wanted);
        let operator_ok = self
            .state
            .operator
            .map_or(true, |wanted| row.operator == Some(wanted));
        status_ok && operator_ok
    }
}
