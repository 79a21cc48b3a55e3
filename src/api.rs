pub mod cbs;
mod client;
pub mod energy_zero;

pub use self::client::new_agent;
