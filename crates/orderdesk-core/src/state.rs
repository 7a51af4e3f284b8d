use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use super::aggregate::Aggregates;
use super::aggregate::StatCards;
use super::config::DeskConfig;
use super::config::DisplayConfig;
use super::config::TimingConfig;
use super::dispatch::InFlightRequests;
use super::error::DeskError;
use super::filter::FilterEngine;
use super::filter::FilterOutcome;
use super::view::BoardView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(pub u64);

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteKey(pub String);

impl RouteKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Factory,
    Sales,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::Factory => "factory",
            Self::Sales => "sales",
        }
    }

    pub fn counterpart(self) -> Self {
        match self {
            Self::Factory => Self::Sales,
            Self::Sales => Self::Factory,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "factory" => Ok(Self::Factory),
            "sales" => Ok(Self::Sales),
            other => Err(DeskError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [Self::Pending, Self::Completed, Self::Cancelled];

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Self::Pending => "state-pending",
            Self::Completed => "state-completed",
            Self::Cancelled => "state-cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DeskError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_id: ClientId,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub route: Option<RouteKey>,
    pub product_name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub operator_id: Option<OperatorId>,
    #[serde(default)]
    pub operator_name: Option<String>,
    #[serde(default)]
    pub factory_notes: Option<String>,
    #[serde(default)]
    pub seller_notes: Option<String>,
    #[serde(default)]
    pub modified: bool,
    #[serde(default)]
    pub seen_by_factory: bool,
    #[serde(default)]
    pub seen_by_seller: bool,
    #[serde(default)]
    pub awaiting_reply: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub created_at: Option<chrono::NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<chrono::NaiveDateTime>,
    #[serde(default)]
    pub completed_at: Option<chrono::NaiveDateTime>,
}

impl Order {
    // Factory reads the seller's notes, sales the factory's.
    pub fn annotation_for(&self, role: Role) -> Option<&str> {
        let note = match role {
            Role::Factory => self.seller_notes.as_deref(),
            Role::Sales => self.factory_notes.as_deref(),
        };
        note.filter(|text| !text.trim().is_empty())
    }

    pub fn unacknowledged_for(&self, role: Role) -> bool {
        match role {
            Role::Factory => self.modified,
            Role::Sales => self.annotation_for(Role::Sales).is_some() && !self.seen_by_seller,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorDirectory {
    names: BTreeMap<OperatorId, String>,
}

impl OperatorDirectory {
    pub fn learn(&mut self, order: &Order) {
        if let (Some(id), Some(name)) = (order.operator_id, order.operator_name.as_ref()) {
            self.names.insert(id, name.clone());
        }
    }

    pub fn label(&self, operator: Option<OperatorId>) -> String {
        match operator {
            None => UNASSIGNED_LABEL.to_string(),
            Some(id) => self
                .names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("Operator #{id}")),
        }
    }
}

pub const UNASSIGNED_LABEL: &str = "Unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl ToastLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: ToastId,
    pub level: ToastLevel,
    pub message: String,
    pub ts_ms: i64,
}

#[derive(Debug, Clone)]
pub struct ToastTray {
    next_id: u64,
    toasts: Vec<Toast>,
}

impl Default for ToastTray {
    fn default() -> Self {
        Self {
            next_id: 1,
            toasts: Vec::new(),
        }
    }
}

impl ToastTray {
    pub fn push(&mut self, level: ToastLevel, message: impl Into<String>) -> ToastId {
        let id = ToastId(self.next_id);
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            level,
            message: message.into(),
            ts_ms: chrono::Utc::now().timestamp_millis(),
        });
        id
    }

    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        self.toasts.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
        }
    }
}

pub const CONNECTION_LOST_BANNER: &str = "Connection lost. Reconnecting...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    Push,
    User,
    Request,
    Board,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub ts_ms: Option<i64>,
    pub source: LogSource,
    pub order_id: Option<OrderId>,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, source: LogSource, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            level,
            ts_ms: Some(chrono::Utc::now().timestamp_millis()),
            source,
            order_id: None,
            message: message.into(),
        }
    }

    pub fn for_order(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            next_seq: 1,
            buf: VecDeque::with_capacity(cap.max(1)),
        }
    }

    pub fn append(&mut self, mut entry: LogEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_seq = 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DeskState {
    pub role: Role,
    pub display: DisplayConfig,
    pub timing: TimingConfig,
    pub board: BoardView,
    pub operators: OperatorDirectory,
    pub filters: FilterEngine,
    pub aggregates: Aggregates,
    pub stats: StatCards,
    pub on_view: FilterOutcome,
    pub requests: InFlightRequests,
    pub toasts: ToastTray,
    pub connection: ConnectionStatus,
    pub banner: Option<String>,
    pub log: LogBuffer,
}

impl DeskState {
    pub fn new(config: &DeskConfig) -> Self {
        Self {
            role: config.role,
            display: config.display.clone(),
            timing: config.timing.clone(),
            board: BoardView::default(),
            operators: OperatorDirectory::default(),
            filters: FilterEngine::default(),
            aggregates: Aggregates::default(),
            stats: StatCards::default(),
            on_view: FilterOutcome::default(),
            requests: InFlightRequests::default(),
            toasts: ToastTray::default(),
            connection: ConnectionStatus::Connecting,
            banner: None,
            log: LogBuffer::new(config.display.log_capacity),
        }
    }

    pub fn with_orders(config: &DeskConfig, orders: Vec<Order>) -> Self {
        let mut state = Self::new(config);
        state.load_board(orders);
        state
    }

    pub(crate) fn load_board(&mut self, orders: Vec<Order>) {
        for order in &orders {
            self.operators.learn(order);
        }
        self.board = BoardView::from_orders(self.role, orders, &self.display, &self.operators);
        self.filters = FilterEngine::default();
        self.requests.clear();
        self.refresh_view();
    }

    pub fn refresh_view(&mut self) {
        self.on_view = self.filters.apply(&mut self.board);
        self.aggregates = super::aggregate::recalculate(&mut self.board, self.role);
        self.stats = StatCards::from(&self.aggregates.all);
    }
}
