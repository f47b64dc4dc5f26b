pub mod manager;
pub mod paths;
pub mod settings;
