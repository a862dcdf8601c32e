pub mod connection;
pub mod loopback;
pub mod types;

pub use connection::{PeerProvider, ProviderConfig};
pub use loopback::{LoopbackProvider, Switchboard};
pub use types::{CallId, PeerId, ProviderEvent, ServerConfig};
