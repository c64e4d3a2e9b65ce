//! `HostResolver` implementations.

mod static_table;
mod system;

pub use static_table::StaticHostResolver;
pub use system::SystemHostResolver;
