//! contractgen-runner: executes generated contract cases over HTTP

pub mod client;
pub mod runner;

pub use client::{ClientError, HttpClient, HttpResponse, ReqwestClient};
pub use runner::{ContractRunner, RunnerError};
