pub mod actions;
pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod filter;
pub mod reconcile;
pub mod reducer;
pub mod state;
pub mod view;

pub use actions::*;
pub use aggregate::*;
pub use config::*;
pub use dispatch::*;
pub use error::*;
pub use events::*;
pub use filter::*;
pub use reducer::*;
pub use state::*;
pub use view::*;
