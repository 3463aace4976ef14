// src/config.rs
//! Runtime configuration read from the environment (after `.env` is loaded).

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATA_DIR: &str = "server/data";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub library_path: PathBuf,
    pub assets_dir: PathBuf,
    pub public_dir: Option<PathBuf>,
    pub storage_backend: StorageBackend,
    pub bcrypt_cost: u32,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build from an explicit variable map. Empty values count as unset.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).filter(|v| !v.trim().is_empty()).cloned();

        let host = match get("HOST") {
            Some(raw) => parse_value("HOST", raw)?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port = match get("PORT") {
            Some(raw) => parse_value("PORT", raw)?,
            None => DEFAULT_PORT,
        };

        let data_dir = PathBuf::from(get("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));
        let library_path = get("DRAWING_LIBRARY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("drawingLibrary.json"));
        let assets_dir = get("ASSETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("assets"));
        let public_dir = get("PUBLIC_DIR").map(PathBuf::from);

        let storage_backend = match get("STORAGE_BACKEND").as_deref() {
            None | Some("file") => StorageBackend::File,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                    reason: "expected 'file' or 'memory'".to_string(),
                })
            }
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => {
                let cost: u32 = parse_value("BCRYPT_COST", raw.clone())?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::Invalid {
                        name: "BCRYPT_COST",
                        value: raw,
                        reason: "must be between 4 and 31".to_string(),
                    });
                }
                cost
            }
            None => bcrypt::DEFAULT_COST,
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => parse_value("MAX_UPLOAD_BYTES", raw)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            host,
            port,
            data_dir,
            library_path,
            assets_dir,
            public_dir,
            storage_backend,
            bcrypt_cost,
            max_upload_bytes,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_value<T>(name: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value: raw,
    })
}
