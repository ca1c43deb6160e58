//! Service configuration (strict TOML parsing).
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working setup:
//!
//! ```toml
//! listen = "127.0.0.1:8081"
//! static_root = "."
//! forbidden_words = ["kerfuffle", "sharbert", "fornax"]
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::chirp::DEFAULT_FORBIDDEN_WORDS;
use crate::error::{Error, Result};

/// File the binary looks for in its working directory.
pub const DEFAULT_CONFIG_FILE: &str = "chirpy.toml";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub listen: SocketAddr,
    pub static_root: PathBuf,
    pub forbidden_words: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8081)),
            static_root: PathBuf::from("."),
            forbidden_words: DEFAULT_FORBIDDEN_WORDS.iter().map(|w| (*w).to_owned()).collect(),
        }
    }
}

impl Config {
    fn validate(&self) -> Result<()> {
        for word in &self.forbidden_words {
            if word.is_empty() || word.contains(' ') {
                return Err(Error::ConfigInvalid(format!(
                    "forbidden word {word:?} must be a single non-empty token"
                )));
            }
        }
        Ok(())
    }
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads `path` if it exists, defaults otherwise.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if path.exists() {
        load_from_file(path)
    } else {
        Ok(Config::default())
    }
}
