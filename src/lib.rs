pub mod chat;
pub mod config;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod stream;
pub mod transport;

mod util;
