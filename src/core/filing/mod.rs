pub mod file_transfer;
pub mod filing_config;
pub mod filing_models;
pub mod filing_ports;
pub mod folder_resolver;
pub mod important_folder;
pub mod record_processor;

pub use filing_config::FilingConfig;
pub use filing_ports::ServiceError;
pub use record_processor::RecordProcessor;
