mod error;
mod remote;
mod transport;

pub use error::ClientError;
pub use remote::RemoteDatabase;
pub use transport::{LoopbackTransport, Transport, decode, encode};
