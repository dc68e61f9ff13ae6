pub mod property_repo;

pub use property_repo::{PgPropertyStore, PropertyRepo};
