mod client;
mod estimator;
mod handle;
mod server;

pub use client::ClientSession;
pub use estimator::ErrorEstimator;
pub use handle::{ControlMsg, SessionHandle};
pub use server::ServerSession;
