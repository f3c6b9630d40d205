// Output port connection state and reconnection policy

pub mod reconnect;
pub mod status;

pub use reconnect::ReconnectionStrategy;
pub use status::{AtomicDeviceStatus, DeviceStatus};
