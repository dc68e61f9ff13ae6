pub mod property;
pub mod seo;
