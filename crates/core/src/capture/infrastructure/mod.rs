pub mod file_image_source;
pub mod slot_image_store;
pub mod unavailable_image_source;
