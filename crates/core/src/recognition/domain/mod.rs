pub mod response;
pub mod result_mapper;
pub mod visual_recognizer;
