pub mod error;
pub mod request;
pub mod response;

pub use error::{ErrorKind, ProxyError};
pub use request::ProxyRequest;
pub use response::{ProxyResponse, ProxyResult};
