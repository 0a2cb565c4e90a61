//! Configuration loading from disk.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::config::schema::Configuration;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigBuildError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Builds the configuration object from its source.
pub trait ConfigurationFactory<C>: Send + Sync {
    /// `path` is the file named on the command line, if any.
    fn build(&self, path: Option<&Path>) -> Result<C, ConfigBuildError>;
}

/// Reads a TOML document. Without a path every field takes its default.
pub struct TomlConfigurationFactory<C> {
    _configuration: PhantomData<fn() -> C>,
}

impl<C> TomlConfigurationFactory<C> {
    pub fn new() -> Self {
        Self {
            _configuration: PhantomData,
        }
    }
}

impl<C> Default for TomlConfigurationFactory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Configuration> ConfigurationFactory<C> for TomlConfigurationFactory<C> {
    fn build(&self, path: Option<&Path>) -> Result<C, ConfigBuildError> {
        match path {
            Some(path) => load_config(path),
            None => parse_config(Path::new("<defaults>"), ""),
        }
    }
}

/// Load a configuration from a TOML file.
pub fn load_config<C: Configuration>(path: &Path) -> Result<C, ConfigBuildError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigBuildError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(path, &content)
}

fn parse_config<C: Configuration>(path: &Path, content: &str) -> Result<C, ConfigBuildError> {
    toml::from_str(content).map_err(|source| ConfigBuildError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DefaultConfiguration;
    use std::io::Write;

    #[test]
    fn missing_path_uses_defaults() {
        let config: DefaultConfiguration = TomlConfigurationFactory::new().build(None).unwrap();
        assert_eq!(config.server.application_connectors.len(), 1);
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let result: Result<DefaultConfiguration, _> =
            load_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigBuildError::Io { .. })));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\napplication_connectors = 3").unwrap();

        let result: Result<DefaultConfiguration, _> = load_config(file.path());
        let error = result.unwrap_err();
        assert!(matches!(error, ConfigBuildError::Parse { .. }));
        assert!(error.to_string().contains("unable to parse"));
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config: DefaultConfiguration = TomlConfigurationFactory::new()
            .build(Some(file.path()))
            .unwrap();
        assert_eq!(config.logging.level, "debug");
    }
}
