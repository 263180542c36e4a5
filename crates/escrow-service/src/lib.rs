pub mod adapters;
pub mod config;
pub mod error;
pub mod http;
pub mod intake;
pub mod logging;
pub mod queue;
pub mod router;
pub mod worker;
