//! Command line configuration file.
use jackc::CompilerConf;
use log::LevelFilter;
use serde::Deserialize;
use std::{
    error::Error,
    fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Configuration file looked for in the working directory
/// when none is given on the command line.
pub const DEFAULT_CONF_PATH: &str = "jackc.yaml";

/// Settings read from the YAML configuration file.
///
/// ```yaml
/// emit_tree: true
/// output_dir: build/
/// log_level: debug
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConf {
    #[serde(flatten)]
    pub compiler: CompilerConf,
    /// Where to write output files. Defaults to next to each source file.
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl CliConf {
    /// Load the configuration from the given file, or from the default
    /// location if no file is given.
    ///
    /// A missing default file yields the default configuration. A file that
    /// was asked for explicitly must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONF_PATH), false),
        };

        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default())
            }
            Err(err) => return Err(ConfError::Io(path.to_path_buf(), err)),
        };

        let conf: Self = serde_yaml::from_reader(file)
            .map_err(|err| ConfError::Yaml(path.to_path_buf(), err))?;
        conf.level_filter()?;

        Ok(conf)
    }

    /// Log level from the configuration, if any.
    pub fn level_filter(&self) -> Result<Option<LevelFilter>, ConfError> {
        self.log_level
            .as_deref()
            .map(|level| {
                LevelFilter::from_str(level).map_err(|_| ConfError::LogLevel(level.to_string()))
            })
            .transpose()
    }
}

#[derive(Debug)]
pub enum ConfError {
    Io(PathBuf, io::Error),
    Yaml(PathBuf, serde_yaml::Error),
    LogLevel(String),
}

impl Error for ConfError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(_, err) => Some(err),
            Self::Yaml(_, err) => Some(err),
            Self::LogLevel(_) => None,
        }
    }
}

impl fmt::Display for ConfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(path, err) => write!(f, "failed to read config {}: {err}", path.display()),
            Self::Yaml(path, err) => write!(f, "malformed config {}: {err}", path.display()),
            Self::LogLevel(level) => write!(f, "unknown log level '{level}'"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_full() {
        let conf: CliConf =
            serde_yaml::from_str("emit_tree: true\noutput_dir: build\nlog_level: debug\n").unwrap();
        assert!(conf.compiler.emit_tree);
        assert_eq!(conf.output_dir, Some(PathBuf::from("build")));
        assert_eq!(conf.level_filter().unwrap(), Some(LevelFilter::Debug));
    }

    #[test]
    fn test_parse_partial() {
        let conf: CliConf = serde_yaml::from_str("output_dir: out\n").unwrap();
        assert!(!conf.compiler.emit_tree);
        assert_eq!(conf.level_filter().unwrap(), None);
    }

    #[test]
    fn test_bad_level() {
        let conf: CliConf = serde_yaml::from_str("log_level: loud\n").unwrap();
        assert!(matches!(conf.level_filter(), Err(ConfError::LogLevel(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let path = Path::new("definitely/not/here/jackc.yaml");
        assert!(matches!(CliConf::load(Some(path)), Err(ConfError::Io(_, _))));
    }
}
