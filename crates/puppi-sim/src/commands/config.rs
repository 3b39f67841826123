use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use puppi_core::serde::to_yaml_string;
use puppi_producer::ProducerConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write the configuration here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ConfigArgs) -> Result<(), Box<dyn Error>> {
    let yaml = default_yaml()?;
    match &args.out {
        Some(path) => fs::write(path, yaml)?,
        None => print!("{yaml}"),
    }
    Ok(())
}

fn default_yaml() -> Result<String, Box<dyn Error>> {
    to_yaml_string(&ProducerConfig::default()).map_err(|err| Box::new(err) as Box<dyn Error>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::load_config;

    #[test]
    fn written_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("puppi.yaml");
        run(&ConfigArgs {
            out: Some(path.clone()),
        })
        .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("algo_id: 5"));
        assert_eq!(load_config(Some(&path)).unwrap(), ProducerConfig::default());
    }
}
