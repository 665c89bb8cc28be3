mod http_transport;

pub use http_transport::{ByteStream, HttpTransport};
