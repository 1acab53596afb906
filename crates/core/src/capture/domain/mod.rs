pub mod capture_state;
pub mod image_source;
pub mod image_store;
pub mod tag_session;
