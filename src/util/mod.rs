//! Small helpers shared across modules

pub mod id;

pub use id::new_item_id;
