pub mod config;
pub mod demo;
pub mod weigh;

use std::error::Error;
use std::fs;
use std::path::Path;

use puppi_core::serde::from_yaml_slice;
use puppi_producer::ProducerConfig;

/// Reads a YAML configuration, falling back to defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ProducerConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let bytes = fs::read(path)?;
            Ok(from_yaml_slice(&bytes).map_err(|err| Box::new(err) as Box<dyn Error>)?)
        }
        None => Ok(ProducerConfig::default()),
    }
}
