pub mod bus;
pub mod component;
pub mod daisy;
pub mod error;
pub mod machine;

pub use bus::{Bus, InterruptLine, InterruptState};
pub use component::Component;
pub use daisy::{DaisyChain, DaisyDevices, InterruptSource};
pub use error::{ConfigError, MachineError};
pub use machine::Machine;
