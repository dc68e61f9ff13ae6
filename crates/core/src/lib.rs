//! Campos domain library.
//!
//! Property model, form normalization, identifier and keyword generation,
//! image reconciliation and the property service, plus the collaborator
//! traits (store, image store, search notifier) the outer crates implement.

pub mod error;
pub mod form;
pub mod images;
pub mod keywords;
pub mod media;
pub mod notify;
pub mod property;
pub mod ref_code;
pub mod service;
pub mod site;
pub mod slug;
pub mod store;
pub mod types;
pub mod video_urls;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
