pub mod client;
pub mod session;

pub use client::{ClientError, RECV_BUFFER_SIZE, SessionClient};
pub use session::SessionError;
