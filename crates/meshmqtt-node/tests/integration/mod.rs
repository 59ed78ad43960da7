//! Integration tests for the relay daemon wiring

mod health_endpoint;
mod settings_file;
