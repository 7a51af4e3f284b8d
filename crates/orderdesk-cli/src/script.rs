use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;

use orderdesk_core::DeskAction;
use orderdesk_core::PushEvent;
use orderdesk_core::RuntimeAction;
use orderdesk_core::UserAction;

/// One line of a replay script.
///
/// `{"push": {"event": "order_modified", ...}}`, `{"user": {"action": "set_status", ...}}`,
/// `"disconnected"` or `"connected"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Push(PushEvent),
    User(UserAction),
    Connected,
    Disconnected,
}

impl From<ScriptStep> for DeskAction {
    fn from(step: ScriptStep) -> Self {
        match step {
            ScriptStep::Push(event) => DeskAction::Push(event),
            ScriptStep::User(action) => DeskAction::User(action),
            ScriptStep::Connected => DeskAction::Runtime(RuntimeAction::Connected),
            ScriptStep::Disconnected => DeskAction::Runtime(RuntimeAction::Disconnected),
        }
    }
}

/// Parses JSON lines. Blank lines and lines starting with `#` are skipped.
pub fn parse_script(content: &str) -> anyhow::Result<Vec<ScriptStep>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line).with_context(|| format!("script line {}", idx + 1))
        })
        .collect()
}

pub fn load_script(path: &Path) -> anyhow::Result<Vec<ScriptStep>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    parse_script(&content)
}
