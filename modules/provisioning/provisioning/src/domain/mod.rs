pub mod byon_node;
pub mod cloud_node;
pub mod host;
pub mod pool;
pub mod registry;
