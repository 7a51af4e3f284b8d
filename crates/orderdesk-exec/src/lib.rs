pub mod contracts;
pub mod host;
pub mod simulated;
pub mod transport;

pub use contracts::*;
pub use host::*;
pub use simulated::*;
pub use transport::*;
