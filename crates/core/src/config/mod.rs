pub mod service_config;
