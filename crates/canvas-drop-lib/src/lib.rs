// canvas-drop-lib: Canvas upload client, mirrors, settings and CLI plumbing

pub mod canvas;
pub mod cli;
pub mod cloud;
pub mod commands;
pub mod config;
pub mod errors;
pub mod http_client;
pub mod logger;
pub mod media;
pub mod output;

#[cfg(test)]
pub(crate) mod test_support;
