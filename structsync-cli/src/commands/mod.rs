pub mod export;
pub mod import;
pub mod settings;
pub mod status;
