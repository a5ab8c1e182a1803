pub mod events;

pub use events::StoreEvent;
