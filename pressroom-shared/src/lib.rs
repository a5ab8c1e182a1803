pub mod pii;
pub mod models;

pub use models::StoreEvent;
pub use pii::Masked;
