#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate tracing;

pub mod app;
pub mod cli;
pub mod history;
pub mod http;
pub mod progress;
pub mod request;
pub mod response;
pub mod tls;
