pub mod client;
pub mod types;

pub use client::HttpService;
pub use types::{ExecuteCodeRequest, ExecuteQueryRequest, ExecutionResponse, SqlResponse};
