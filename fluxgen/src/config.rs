use std::{collections::HashMap, env, path::Path};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, eyre},
};
use log::debug;

pub const API_TOKEN_VAR: &str = "REPLICATE_API_TOKEN";
pub const API_BASE_VAR: &str = "REPLICATE_API_BASE";
pub const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Credentials and endpoint for the inference service.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: String,
    pub api_base: String,
}

impl Config {
    /// Reads `env_file` (if it exists) and the process environment. A variable set in the
    /// process wins over the file. Nothing is written back into the environment.
    pub fn load(env_file: &Path) -> Result<Self> {
        Self::load_with(env_file, |key| env::var(key).ok())
    }

    fn load_with(env_file: &Path, process_env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file_vars = read_env_file(env_file)?;
        Self::from_lookup(|key| process_env(key).or_else(|| file_vars.get(key).cloned()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_token = lookup(API_TOKEN_VAR)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                eyre!("{API_TOKEN_VAR} is not set, put it in the environment or in a .env file")
            })?;
        let api_base = lookup(API_BASE_VAR).unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            api_token,
            api_base,
        })
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter
            .map(|item| item.wrap_err_with(|| format!("Invalid line in {}", path.display())))
            .collect(),
        Err(e) if e.not_found() => {
            debug!("No env file at {}", path.display());
            Ok(HashMap::new())
        }
        Err(e) => Err(e).wrap_err_with(|| format!("Couldn't read {}", path.display())),
    }
}
