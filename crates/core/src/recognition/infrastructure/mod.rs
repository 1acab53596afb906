pub mod recorded_recognizer;
pub mod watson_recognizer;
