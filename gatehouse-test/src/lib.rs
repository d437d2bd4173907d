//! Test tooling for exercising gatehouse policies.
//!
//! Provides an instrumented in-memory cache store with fault injection, a
//! counting echo upstream, and a single-request pipeline harness that drives
//! a policy the way the gateway chain would.

pub mod echo;
pub mod harness;
pub mod mock_store;

pub use echo::EchoConnector;
pub use harness::{GatewayError, TestGateway};
pub use mock_store::MockStore;
