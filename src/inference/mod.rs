//! Model adapters backed by a hosted inference endpoint.

mod hosted;

pub use hosted::HostedInference;
