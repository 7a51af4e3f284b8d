use thiserror::Error;

use super::state::OrderId;
use super::state::Role;

pub type Result<T> = std::result::Result<T, DeskError>;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown order status: {0}")]
    UnknownStatus(String),

    #[error("{action} is not available to the {role} role")]
    ActionNotAvailable { role: Role, action: &'static str },

    #[error("order #{0} is not on the board")]
    MissingRow(OrderId),
}
