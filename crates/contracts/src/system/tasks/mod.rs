pub mod aggregate;
pub mod progress;
pub mod request;
pub mod response;
