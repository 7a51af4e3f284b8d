use std::fmt::Write as _;

use clap::ValueEnum;
use serde::Serialize;

use orderdesk_core::ConnectionStatus;
use orderdesk_core::DeskState;
use orderdesk_core::FilterOutcome;
use orderdesk_core::FilterState;
use orderdesk_core::LogEntry;
use orderdesk_core::OrderRow;
use orderdesk_core::Role;
use orderdesk_core::RouteGroup;
use orderdesk_core::Toast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub count: usize,
}

/// Serializable snapshot of what the dashboard shows.
#[derive(Debug, Serialize)]
pub struct BoardReport<'a> {
    pub role: Role,
    pub connection: ConnectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<&'a str>,
    pub filters: &'a FilterState,
    pub on_view: FilterOutcome,
    pub stats: Vec<StatCard>,
    pub routes: &'a [RouteGroup],
    pub toasts: Vec<&'a Toast>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<&'a LogEntry>,
}

impl<'a> BoardReport<'a> {
    pub fn new(state: &'a DeskState, include_log: bool) -> Self {
        Self {
            role: state.role,
            connection: state.connection,
            banner: state.banner.as_deref(),
            filters: state.filters.state(),
            on_view: state.on_view,
            stats: state
                .stats
                .labelled(state.role)
                .into_iter()
                .map(|(label, count)| StatCard { label, count })
                .collect(),
            routes: &state.board.routes,
            toasts: state.toasts.iter().collect(),
            log: if include_log {
                state.log.iter().collect()
            } else {
                Vec::new()
            },
        }
    }
}

pub fn render(state: &DeskState, format: OutputFormat, include_log: bool) -> anyhow::Result<String> {
    let report = BoardReport::new(state, include_log);
    Ok(match format {
        OutputFormat::Text => render_text(&report),
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Yaml => serde_yaml::to_string(&report)?,
    })
}

/// Plain-text board. Hidden rows and groups are left out.
pub fn render_text(report: &BoardReport<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "orderdesk - {} board ({})",
        report.role,
        report.connection.label().to_lowercase()
    );
    if let Some(banner) = report.banner {
        let _ = writeln!(out, "! {banner}");
    }
    let cards: Vec<String> = report
        .stats
        .iter()
        .map(|card| format!("{} {}", card.label, card.count))
        .collect();
    let _ = writeln!(out, "{}", cards.join(" | "));

    for route in report.routes.iter().filter(|route| route.visible) {
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}]{}", route.label(), badge_suffix(&route.badges));
        for client in route.clients.iter().filter(|client| client.visible) {
            let _ = writeln!(out, "  {}{}", client.name, badge_suffix(&client.badges));
            for row in client.rows.iter().filter(|row| row.visible) {
                let _ = writeln!(out, "    {}", row_line(row));
                if let Some(annotation) = &row.annotation {
                    let _ = writeln!(out, "      note: {annotation}");
                }
            }
        }
    }

    if !report.toasts.is_empty() {
        let _ = writeln!(out);
        for toast in &report.toasts {
            let _ = writeln!(out, "({}) {}", toast.level.label(), toast.message);
        }
    }

    if !report.log.is_empty() {
        let _ = writeln!(out);
        for entry in &report.log {
            let order = entry
                .order_id
                .map(|id| format!(" #{id}"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{:>4} {:<5}{} {}",
                entry.seq,
                entry.level.label(),
                order,
                entry.message
            );
        }
    }
    out
}

fn badge_suffix(badges: &[orderdesk_core::Badge]) -> String {
    if badges.is_empty() {
        return String::new();
    }
    let texts: Vec<&str> = badges.iter().map(|badge| badge.text.as_str()).collect();
    format!(" ({})", texts.join(", "))
}

fn row_line(row: &OrderRow) -> String {
    let unit = row.unit.as_deref().unwrap_or("");
    let mut line = format!(
        "#{} {} {} {} | {} | {}",
        row.order_id,
        row.product_name,
        row.quantity,
        unit,
        row.status,
        row.operator_label
    );
    let markers: Vec<&str> = row
        .markers()
        .into_iter()
        .filter(|marker| !marker.starts_with("state-"))
        .collect();
    if !markers.is_empty() {
        let _ = write!(line, " [{}]", markers.join(", "));
    }
    line
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use orderdesk_core::ClientId;
    use orderdesk_core::DeskConfig;
    use orderdesk_core::Order;
    use orderdesk_core::OrderId;
    use orderdesk_core::OrderStatus;
    use orderdesk_core::RouteKey;

    fn state() -> DeskState {
        let order = |id: u64, status: OrderStatus, modified: bool| Order {
            id: OrderId(id),
            client_id: ClientId(1),
            client_name: Some("Acme".to_string()),
            route: Some(RouteKey::new("North")),
            product_name: "Bolts".to_string(),
            quantity: 12.0,
            unit: Some("kg".to_string()),
            status,
            operator_id: None,
            operator_name: None,
            factory_notes: None,
            seller_notes: None,
            modified,
            seen_by_factory: !modified,
            seen_by_seller: true,
            awaiting_reply: false,
            archived: false,
            created_at: None,
            updated_at: None,
            completed_at: None,
        };
        DeskState::with_orders(
            &DeskConfig::default(),
            vec![
                order(1, OrderStatus::Pending, true),
                order(2, OrderStatus::Completed, false),
            ],
        )
    }

    #[test]
    fn text_report_lists_groups_badges_and_markers() {
        let text = render(&state(), OutputFormat::Text, false).expect("render");

        let expected = "\
orderdesk - factory board (connecting)
Pending 1 | Completed 1 | Cancelled 0 | Modified 1

[North] (1 modified, 1 pending)
  Acme (2 order(s), 1 pending, 1 modified)
    #1 Bolts 12 kg | pending | Unassigned [unacknowledged]
    #2 Bolts 12 kg | completed | Unassigned
";
        assert_eq!(text, expected);
    }

    #[test]
    fn json_report_carries_stat_cards() {
        let json = render(&state(), OutputFormat::Json, false).expect("render");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");

        assert_eq!(value["role"], "factory");
        assert_eq!(value["stats"][3]["label"], "Modified");
        assert_eq!(value["stats"][3]["count"], 1);
        assert_eq!(value["on_view"]["visible_rows"], 2);
        assert!(value.get("log").is_none());
    }

    #[test]
    fn yaml_report_renders() {
        let yaml = render(&state(), OutputFormat::Yaml, false).expect("render");
        assert!(yaml.contains("role: factory"));
    }
}
