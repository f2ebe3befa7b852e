// Data models for the inbound API and the watsonx.ai wire format

pub mod api;
pub mod watsonx;
