pub mod client;
pub mod request;
pub mod response;

pub use client::*;
pub use request::*;
pub use response::*;
