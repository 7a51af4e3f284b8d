use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::aggregate::Badge;
use super::aggregate::RowFacts;
use super::config::DisplayConfig;
use super::reconcile::row_from_order;
use super::state::ClientId;
use super::state::OperatorDirectory;
use super::state::OperatorId;
use super::state::Order;
use super::state::OrderId;
use super::state::OrderStatus;
use super::state::Role;
use super::state::RouteKey;

pub const UNROUTED_LABEL: &str = "No route";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusControl {
    pub value: OrderStatus,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatorControl {
    pub value: Option<OperatorId>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
    pub order_id: OrderId,
    pub client_id: ClientId,
    pub route: Option<RouteKey>,
    pub product_name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub status: OrderStatus,
    pub operator: Option<OperatorId>,
    pub operator_label: String,
    pub annotation: Option<String>,
    pub unacknowledged: bool,
    pub awaiting_reply: bool,
    pub highlighted: bool,
    pub visible: bool,
    pub status_control: StatusControl,
    pub operator_control: OperatorControl,
    pub acknowledge_enabled: bool,
}

impl OrderRow {
    pub fn markers(&self) -> Vec<&'static str> {
        let mut markers = vec![self.status.marker()];
        if self.unacknowledged {
            markers.push("unacknowledged");
        }
        if self.awaiting_reply {
            markers.push("awaiting-reply");
        }
        if self.highlighted {
            markers.push("highlight");
        }
        if !self.visible {
            markers.push("hidden");
        }
        markers
    }

    pub fn can_acknowledge(&self) -> bool {
        self.unacknowledged
    }

    pub fn facts(&self) -> RowFacts {
        RowFacts {
            order_id: self.order_id,
            client_id: self.client_id,
            route: self.route.clone(),
            status: self.status,
            unacknowledged: self.unacknowledged,
            awaiting_reply: self.awaiting_reply,
            visible: self.visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientGroup {
    pub client_id: ClientId,
    pub name: String,
    pub rows: Vec<OrderRow>,
    pub visible: bool,
    pub badges: Vec<Badge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGroup {
    pub route: Option<RouteKey>,
    pub clients: Vec<ClientGroup>,
    pub visible: bool,
    pub badges: Vec<Badge>,
}

impl RouteGroup {
    pub fn label(&self) -> &str {
        self.route.as_ref().map_or(UNROUTED_LABEL, RouteKey::as_str)
    }

    pub fn rows(&self) -> impl Iterator<Item = &OrderRow> {
        self.clients.iter().flat_map(|client| client.rows.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowSlot {
    route: usize,
    client: usize,
    row: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardView {
    pub routes: Vec<RouteGroup>,
    #[serde(skip)]
    index: HashMap<OrderId, RowSlot>,
}

impl BoardView {
    // Archived orders are skipped; unrouted clients sort last.
    pub fn from_orders(
        role: Role,
        orders: Vec<Order>,
        display: &DisplayConfig,
        operators: &OperatorDirectory,
    ) -> Self {
        let mut board = Self::default();
        for order in orders.into_iter().filter(|order| !order.archived) {
            let name = client_label(&order);
            let row = row_from_order(role, &order, display, operators);
            board.place(row, name);
        }
        board.reindex();
        board
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    pub fn row(&self, order_id: OrderId) -> Option<&OrderRow> {
        let slot = self.index.get(&order_id)?;
        self.routes
            .get(slot.route)?
            .clients
            .get(slot.client)?
            .rows
            .get(slot.row)
    }

    pub fn row_mut(&mut self, order_id: OrderId) -> Option<&mut OrderRow> {
        let slot = *self.index.get(&order_id)?;
        self.routes
            .get_mut(slot.route)?
            .clients
            .get_mut(slot.client)?
            .rows
            .get_mut(slot.row)
    }

    pub fn rows(&self) -> impl Iterator<Item = &OrderRow> {
        self.routes.iter().flat_map(RouteGroup::rows)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn client(&self, client_id: ClientId) -> Option<&ClientGroup> {
        self.client_groups(client_id).next()
    }

    pub fn client_groups(&self, client_id: ClientId) -> impl Iterator<Item = &ClientGroup> {
        self.routes
            .iter()
            .flat_map(|route| route.clients.iter())
            .filter(move |client| client.client_id == client_id)
    }

    pub fn route(&self, route: Option<&RouteKey>) -> Option<&RouteGroup> {
        self.routes.iter().find(|group| group.route.as_ref() == route)
    }

    pub fn facts(&self) -> Vec<RowFacts> {
        self.rows().map(OrderRow::facts).collect()
    }

    pub fn insert_row(&mut self, row: OrderRow, client_name: String) {
        if self.contains(row.order_id) {
            self.remove_row(row.order_id);
        }
        self.place(row, client_name);
        self.reindex();
    }

    pub fn remove_row(&mut self, order_id: OrderId) -> Option<OrderRow> {
        let slot = *self.index.get(&order_id)?;
        let route = self.routes.get_mut(slot.route)?;
        let client = route.clients.get_mut(slot.client)?;
        let removed = client.rows.remove(slot.row);
        if client.rows.is_empty() {
            route.clients.remove(slot.client);
        }
        if route.clients.is_empty() {
            self.routes.remove(slot.route);
        }
        self.reindex();
        Some(removed)
    }

    fn place(&mut self, row: OrderRow, client_name: String) {
        let route_idx = match self
            .routes
            .binary_search_by(|group| route_order(group.route.as_ref(), row.route.as_ref()))
        {
            Ok(idx) => idx,
            Err(idx) => {
                self.routes.insert(
                    idx,
                    RouteGroup {
                        route: row.route.clone(),
                        clients: Vec::new(),
                        visible: true,
                        badges: Vec::new(),
                    },
                );
                idx
            }
        };

        let clients = &mut self.routes[route_idx].clients;
        let client_idx = match clients.iter().position(|c| c.client_id == row.client_id) {
            Some(idx) => idx,
            None => {
                let idx = clients
                    .iter()
                    .position(|c| (c.name.as_str(), c.client_id) > (client_name.as_str(), row.client_id))
                    .unwrap_or(clients.len());
                clients.insert(
                    idx,
                    ClientGroup {
                        client_id: row.client_id,
                        name: client_name,
                        rows: Vec::new(),
                        visible: true,
                        badges: Vec::new(),
                    },
                );
                idx
            }
        };
        clients[client_idx].rows.push(row);
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (route_idx, route) in self.routes.iter().enumerate() {
            for (client_idx, client) in route.clients.iter().enumerate() {
                for (row_idx, row) in client.rows.iter().enumerate() {
                    self.index.insert(
                        row.order_id,
                        RowSlot {
                            route: route_idx,
                            client: client_idx,
                            row: row_idx,
                        },
                    );
                }
            }
        }
    }
}

pub fn client_label(order: &Order) -> String {
    order
        .client_name
        .clone()
        .unwrap_or_else(|| format!("Client #{}", order.client_id))
}

fn route_order(a: Option<&RouteKey>, b: Option<&RouteKey>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn order(id: u64, client: u64, name: &str, route: Option<&str>) -> Order {
        Order {
            id: OrderId(id),
            client_id: ClientId(client),
            client_name: Some(name.to_string()),
            route: route.map(RouteKey::new),
            product_name: format!("product-{id}"),
            quantity: 1.0,
            unit: None,
            status: OrderStatus::Pending,
            operator_id: None,
            operator_name: None,
            factory_notes: None,
            seller_notes: None,
            modified: false,
            seen_by_factory: false,
            seen_by_seller: false,
            awaiting_reply: false,
            archived: false,
            created_at: None,
            updated_at: None,
            completed_at: None,
        }
    }

    fn board(orders: Vec<Order>) -> BoardView {
        BoardView::from_orders(
            Role::Factory,
            orders,
            &DisplayConfig::default(),
            &OperatorDirectory::default(),
        )
    }

    #[test]
    fn groups_are_ordered_with_unrouted_last() {
        let board = board(vec![
            order(1, 10, "Zeta", Some("Route 2")),
            order(2, 11, "Alpha", None),
            order(3, 12, "Beta", Some("Route 1")),
            order(4, 13, "Acme", Some("Route 2")),
        ]);

        let routes: Vec<&str> = board.routes.iter().map(RouteGroup::label).collect();
        assert_eq!(routes, vec!["Route 1", "Route 2", UNROUTED_LABEL]);

        let route_two: Vec<&str> = board.routes[1]
            .clients
            .iter()
            .map(|client| client.name.as_str())
            .collect();
        assert_eq!(route_two, vec!["Acme", "Zeta"]);
    }

    #[test]
    fn archived_orders_are_not_rendered() {
        let mut archived = order(2, 10, "Acme", Some("Route 1"));
        archived.archived = true;
        let board = board(vec![order(1, 10, "Acme", Some("Route 1")), archived]);

        assert_eq!(board.len(), 1);
        assert!(!board.contains(OrderId(2)));
    }

    #[test]
    fn removing_last_row_prunes_groups_and_reindexes() {
        let mut board = board(vec![
            order(1, 10, "Acme", Some("Route 1")),
            order(2, 11, "Beta", Some("Route 2")),
            order(3, 11, "Beta", Some("Route 2")),
        ]);

        let removed = board.remove_row(OrderId(1)).expect("row present");
        assert_eq!(removed.order_id, OrderId(1));
        assert_eq!(board.routes.len(), 1);
        assert!(board.client(ClientId(10)).is_none());

        // Slots shifted; lookups must still resolve to the right rows.
        assert_eq!(board.row(OrderId(3)).map(|r| r.order_id), Some(OrderId(3)));
        assert!(board.remove_row(OrderId(1)).is_none());
    }

    #[test]
    fn insert_replaces_existing_row_for_same_order() {
        let mut board = board(vec![order(1, 10, "Acme", Some("Route 1"))]);
        let mut row = board.row(OrderId(1)).cloned().expect("row");
        row.product_name = "renamed".to_string();

        board.insert_row(row, "Acme".to_string());

        assert_eq!(board.len(), 1);
        assert_eq!(board.rows().count(), 1);
        assert_eq!(
            board.row(OrderId(1)).map(|r| r.product_name.as_str()),
            Some("renamed")
        );
    }
}
