//! BLE transport abstraction layer.
//!
//! Provides the trait and implementations the harness uses to reach the
//! device under test, enabling dependency injection and testing via mocks.

pub mod error;
pub mod gateway;
pub mod mock;
pub mod traits;

pub use error::TransportError;
pub use gateway::GatewayTransport;
pub use mock::MockTransport;
pub use traits::BleTransport;
