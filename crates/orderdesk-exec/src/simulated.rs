//! In-memory order backend with the server-side mutation semantics and push
//! broadcasts of the real dashboard server.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use chrono::NaiveDateTime;
use chrono::Utc;
use tokio::sync::mpsc;

use orderdesk_core::MutationRequest;
use orderdesk_core::OperatorId;
use orderdesk_core::Order;
use orderdesk_core::OrderId;
use orderdesk_core::OrderStatus;
use orderdesk_core::PushEvent;
use orderdesk_core::Role;

use crate::contracts::MutationResponse;
use crate::transport::OrderTransport;
use crate::transport::TransportError;

#[derive(Debug, Default)]
struct Backend {
    orders: BTreeMap<OrderId, Order>,
    operators: BTreeMap<OperatorId, String>,
    subscribers: Vec<mpsc::UnboundedSender<PushEvent>>,
    offline: bool,
}

impl Backend {
    fn broadcast(&mut self, event: PushEvent) {
        tracing::debug!(event = event.name(), order_id = ?event.order_id(), "broadcast");
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn reachable(&self) -> Result<(), TransportError> {
        if self.offline {
            return Err(TransportError::Unreachable(
                "simulated backend is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SimulatedTransport {
    backend: Mutex<Backend>,
}

impl SimulatedTransport {
    pub fn new(orders: Vec<Order>) -> Self {
        let mut backend = Backend::default();
        for order in orders {
            if let (Some(id), Some(name)) = (order.operator_id, order.operator_name.as_ref()) {
                backend.operators.insert(id, name.clone());
            }
            backend.orders.insert(order.id, order);
        }
        Self {
            backend: Mutex::new(backend),
        }
    }

    pub fn with_operator(self, id: OperatorId, name: impl Into<String>) -> Self {
        self.lock().operators.insert(id, name.into());
        self
    }

    /// Receives every push event broadcast from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PushEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.lock().orders.get(&order_id).cloned()
    }

    /// A seller places an order.
    pub fn create_order(&self, order: Order) {
        let mut backend = self.lock();
        backend.orders.insert(order.id, order.clone());
        backend.broadcast(PushEvent::NewOrder { order });
    }

    /// A seller edits an order; the factory has to acknowledge it.
    pub fn modify_order<F>(&self, order_id: OrderId, edit: F) -> bool
    where
        F: FnOnce(&mut Order),
    {
        let mut backend = self.lock();
        let Some(order) = backend.orders.get_mut(&order_id) else {
            return false;
        };
        edit(order);
        order.modified = true;
        order.seen_by_factory = false;
        order.updated_at = Some(now());
        let order = order.clone();
        backend.broadcast(PushEvent::OrderModified { order });
        true
    }

    /// The factory writes an observation the seller has not read yet.
    pub fn annotate(&self, order_id: OrderId, notes: impl Into<String>) -> bool {
        let mut backend = self.lock();
        let Some(order) = backend.orders.get_mut(&order_id) else {
            return false;
        };
        order.factory_notes = Some(notes.into());
        order.seen_by_seller = false;
        order.updated_at = Some(now());
        let order = order.clone();
        backend.broadcast(PushEvent::OrderUpdated { order });
        true
    }

    pub fn delete_order(&self, order_id: OrderId) -> bool {
        let mut backend = self.lock();
        let Some(order) = backend.orders.remove(&order_id) else {
            return false;
        };
        backend.broadcast(PushEvent::OrderDeleted {
            order_id,
            client_id: Some(order.client_id),
        });
        true
    }

    /// Archives every active order and announces the closed week.
    pub fn close_week(&self, week: impl Into<String>) -> usize {
        let week = week.into();
        let mut backend = self.lock();
        let mut archived_count = 0;
        for order in backend.orders.values_mut().filter(|order| !order.archived) {
            order.archived = true;
            archived_count += 1;
        }
        backend.broadcast(PushEvent::WeekClosed {
            message: Some(format!("{week} closed. {archived_count} orders archived.")),
            week,
            archived_count,
        });
        archived_count
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OrderTransport for SimulatedTransport {
    fn send(&self, request: &MutationRequest) -> Result<MutationResponse, TransportError> {
        let mut backend = self.lock();
        backend.reachable()?;

        let order_id = request.order_id();
        let operator_name = match request {
            MutationRequest::AssignOperator {
                operator_id: Some(id),
                ..
            } => match backend.operators.get(id) {
                Some(name) => Some(name.clone()),
                None => return Ok(MutationResponse::rejected("Invalid operator")),
            },
            _ => None,
        };
        let Some(order) = backend.orders.get_mut(&order_id) else {
            return Ok(MutationResponse::rejected("Order not found"));
        };

        let event = match request {
            MutationRequest::SetStatus { status, .. } => {
                order.status = *status;
                if *status == OrderStatus::Completed && order.completed_at.is_none() {
                    order.completed_at = Some(now());
                }
                if order.modified {
                    order.modified = false;
                    order.seen_by_factory = true;
                }
                order.updated_at = Some(now());
                Some(PushEvent::OrderUpdated {
                    order: order.clone(),
                })
            }
            MutationRequest::AssignOperator { operator_id, .. } => {
                order.operator_id = *operator_id;
                order.operator_name = operator_name;
                order.updated_at = Some(now());
                Some(PushEvent::OrderAssigned {
                    order: order.clone(),
                })
            }
            MutationRequest::MarkSeen { .. } => {
                order.modified = false;
                order.seen_by_factory = true;
                Some(PushEvent::OrderSeenByFactory { order_id })
            }
            MutationRequest::MarkRead { .. } => {
                order.seen_by_seller = true;
                order.awaiting_reply = false;
                None
            }
        };
        let order = order.clone();
        if let Some(event) = event {
            backend.broadcast(event);
        }
        Ok(MutationResponse::accepted(Some(order)))
    }

    fn fetch_board(&self, role: Role) -> Result<Vec<Order>, TransportError> {
        let backend = self.lock();
        backend.reachable()?;
        let orders: Vec<Order> = backend
            .orders
            .values()
            .filter(|order| !order.archived)
            .cloned()
            .collect();
        tracing::debug!(role = %role, count = orders.len(), "board listing served");
        Ok(orders)
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use orderdesk_core::ClientId;
    use orderdesk_core::RequestOutcome;

    fn order(id: u64) -> Order {
        Order {
            id: OrderId(id),
            client_id: ClientId(1),
            client_name: Some("Acme".to_string()),
            route: None,
            product_name: "Rivets".to_string(),
            quantity: 100.0,
            unit: None,
            status: OrderStatus::Pending,
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

    #[test]
    fn completing_stamps_time_and_acknowledges_modification() {
        let transport = SimulatedTransport::new(vec![order(1)]);
        let mut events = transport.subscribe();
        transport.modify_order(OrderId(1), |order| order.quantity = 150.0);

        let response = transport
            .send(&MutationRequest::SetStatus {
                order_id: OrderId(1),
                status: OrderStatus::Completed,
            })
            .expect("send");

        assert!(response.success);
        let stored = transport.order(OrderId(1)).expect("order");
        assert!(stored.completed_at.is_some());
        assert!(!stored.modified);
        assert!(stored.seen_by_factory);
        assert!(matches!(events.try_recv(), Ok(PushEvent::OrderModified { .. })));
        assert!(matches!(events.try_recv(), Ok(PushEvent::OrderUpdated { .. })));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let transport =
            SimulatedTransport::new(vec![order(1)]).with_operator(OperatorId(2), "Marta");

        let rejected = transport
            .send(&MutationRequest::AssignOperator {
                order_id: OrderId(1),
                operator_id: Some(OperatorId(9)),
            })
            .expect("send");
        assert_eq!(
            rejected.outcome(),
            RequestOutcome::Rejected {
                reason: Some("Invalid operator".to_string())
            }
        );

        let accepted = transport
            .send(&MutationRequest::AssignOperator {
                order_id: OrderId(1),
                operator_id: Some(OperatorId(2)),
            })
            .expect("send");
        let order = accepted.order.expect("order echoed");
        assert_eq!(order.operator_name.as_deref(), Some("Marta"));
    }

    #[test]
    fn mark_read_is_not_broadcast() {
        let transport = SimulatedTransport::new(vec![order(1)]);
        let mut events = transport.subscribe();
        transport.annotate(OrderId(1), "Ready Monday");
        assert!(matches!(events.try_recv(), Ok(PushEvent::OrderUpdated { .. })));

        transport
            .send(&MutationRequest::MarkRead { order_id: OrderId(1) })
            .expect("send");

        assert!(events.try_recv().is_err());
        assert!(transport.order(OrderId(1)).expect("order").seen_by_seller);
    }

    #[test]
    fn offline_backend_is_unreachable() {
        let transport = SimulatedTransport::new(vec![order(1)]);
        transport.set_offline(true);

        let err = transport
            .send(&MutationRequest::MarkSeen { order_id: OrderId(1) })
            .expect_err("offline");
        assert!(matches!(err, TransportError::Unreachable(_)));
        assert!(transport.fetch_board(Role::Factory).is_err());
    }

    #[test]
    fn closing_week_empties_the_listing() {
        let transport = SimulatedTransport::new(vec![order(1), order(2)]);

        assert_eq!(transport.close_week("Week 2025-W03"), 2);
        assert!(transport.fetch_board(Role::Sales).expect("listing").is_empty());
    }

    #[test]
    fn missing_order_is_rejected() {
        let transport = SimulatedTransport::new(Vec::new());
        let response = transport
            .send(&MutationRequest::MarkSeen { order_id: OrderId(5) })
            .expect("send");
        assert_eq!(response.error.as_deref(), Some("Order not found"));
    }
}
