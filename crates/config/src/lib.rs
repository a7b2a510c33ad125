//! Configuration management for slotscope
//!
//! This crate provides functionality for managing the slotscope configuration,
//! including loading, saving, updating, and deleting configuration settings.

/// Error types for the configuration module
pub mod error;

use crate::error::Error;
use clap::Parser;
use serde::{Deserialize, Serialize};
use slotscope_common::{
    constants::CHAIN_ID_ETHEREUM,
    utils::{
        env::{get_env, get_env_parsed},
        io::file::{delete_path, read_file, write_file},
    },
};
#[allow(deprecated)]
use std::env::home_dir;
use std::{collections::BTreeMap, path::PathBuf};
use tracing::{debug, error, info};

/// Command line arguments for the configuration command
/// Arguments of the `config` subcommand.
#[derive(Debug, Clone, Parser)]
#[clap(
    about = "Display and edit the current configuration",
    override_usage = "slotscope config [OPTIONS]"
)]
pub struct ConfigArgs {
    /// The target key to update.
    #[clap(required = false, default_value = "")]
    key: String,

    /// The value to set the key to.
    #[clap(required = false, default_value = "")]
    value: String,
}

/// The [`Configuration`] struct represents the configuration of slotscope. The server, the CLI and
/// the storage service all read from this configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Configuration {
    /// The URL of the Ethereum mainnet RPC endpoint, used for chain id 1 unless
    /// `chain_rpc_urls` names one
    pub rpc_url: String,

    /// RPC endpoints keyed by chain id
    pub chain_rpc_urls: BTreeMap<String, String>,

    /// The base URL of the contract metadata API. Empty disables metadata lookups.
    pub metadata_url: String,

    /// The address the HTTP server binds to
    pub bind: String,

    /// The port the HTTP server listens on
    pub port: u16,

    /// How long assembled storage responses stay cached, in seconds
    pub cache_ttl_secs: u64,

    /// The maximum number of slots read in one JSON-RPC batch
    pub batch_size: usize,

    /// The maximum number of batches in flight per request
    pub max_concurrency: usize,

    /// How many times a failed batch is attempted before its slots are reported as failed
    pub max_attempts: u32,

    /// The timeout applied to every upstream call, in seconds
    pub request_timeout_secs: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            rpc_url: "".to_string(),
            chain_rpc_urls: BTreeMap::new(),
            metadata_url: "".to_string(),
            bind: "127.0.0.1".to_string(),
            port: 3000,
            cache_ttl_secs: 300,
            batch_size: 100,
            max_concurrency: 4,
            max_attempts: 3,
            request_timeout_secs: 10,
        }
    }
}

#[allow(deprecated)]
impl Configuration {
    /// The path of the configuration file, `$HOME/.slotscope/config.toml`.
    pub fn path() -> Result<PathBuf, Error> {
        let mut home = home_dir().ok_or_else(|| {
            Error::Generic(
                "failed to get home directory. does your os support `std::env::home_dir()`?"
                    .to_string(),
            )
        })?;
        home.push(".slotscope");
        home.push("config.toml");
        Ok(home)
    }

    /// Returns the current configuration, with environment overrides applied.
    ///
    /// The configuration file is created with default values if it does not exist.
    pub fn load() -> Result<Self, Error> {
        let path = Self::path()?;

        // if the config file doesn't exist, create it
        if !path.exists() {
            let config = Configuration::default();
            config.save()?;
        }

        // read the config file
        let contents = read_file(&path)
            .map_err(|e| Error::Generic(format!("failed to read config file: {e}")))?;

        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse a configuration from TOML. Missing keys take their default values.
    pub fn parse(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| Error::ParseError(format!("failed to parse config file: {e}")))
    }

    /// Overrides values from the `SLOTSCOPE_*` environment variables, when they are set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(rpc_url) = get_env("SLOTSCOPE_RPC_URL") {
            debug!("overriding rpc_url with SLOTSCOPE_RPC_URL");
            self.rpc_url = rpc_url;
        }
        if let Some(metadata_url) = get_env("SLOTSCOPE_METADATA_URL") {
            debug!("overriding metadata_url with SLOTSCOPE_METADATA_URL");
            self.metadata_url = metadata_url;
        }
        if let Some(port) = get_env_parsed("SLOTSCOPE_PORT") {
            debug!("overriding port with SLOTSCOPE_PORT");
            self.port = port;
        }
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> Result<(), Error> {
        write_file(
            Self::path()?,
            &toml::to_string(&self)
                .map_err(|e| Error::ParseError(format!("failed to serialize config: {e}")))?,
        )
        .map_err(|e| Error::Generic(format!("failed to write config file: {e}")))?;

        Ok(())
    }

    /// Deletes the configuration file at `$HOME/.slotscope/config.toml`.
    pub fn delete() -> Result<(), Error> {
        delete_path(Self::path()?)
            .map_err(|e| Error::Generic(format!("failed to delete config file: {e}")))?;

        Ok(())
    }

    /// The RPC endpoint configured for every chain, keyed by chain id.
    ///
    /// `rpc_url` serves chain id 1 unless `chain_rpc_urls` has its own entry for it.
    pub fn rpc_endpoints(&self) -> Result<BTreeMap<u64, String>, Error> {
        let mut endpoints = BTreeMap::new();
        if !self.rpc_url.is_empty() {
            endpoints.insert(CHAIN_ID_ETHEREUM, self.rpc_url.clone());
        }

        for (chain_id, url) in &self.chain_rpc_urls {
            let chain_id = chain_id.parse::<u64>().map_err(|_| {
                Error::ParseError(format!("invalid chain id in chain_rpc_urls: '{chain_id}'"))
            })?;
            if !url.is_empty() {
                endpoints.insert(chain_id, url.clone());
            }
        }

        Ok(endpoints)
    }

    /// Set a single key/value pair without writing it to disk.
    ///
    /// Per-chain endpoints are addressed as `chain_rpc_urls.<CHAIN_ID>`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error> {
            value
                .parse::<T>()
                .map_err(|_| Error::ParseError(format!("invalid value for '{key}': '{value}'")))
        }

        // update the key in the struct and ensure it's the correct type
        match key {
            "rpc_url" => self.rpc_url = value.to_string(),
            "metadata_url" => self.metadata_url = value.to_string(),
            "bind" => self.bind = value.to_string(),
            "port" => self.port = parse(key, value)?,
            "cache_ttl_secs" => self.cache_ttl_secs = parse(key, value)?,
            "batch_size" => self.batch_size = parse(key, value)?,
            "max_concurrency" => self.max_concurrency = parse(key, value)?,
            "max_attempts" => self.max_attempts = parse(key, value)?,
            "request_timeout_secs" => self.request_timeout_secs = parse(key, value)?,
            _ => match key.strip_prefix("chain_rpc_urls.") {
                Some(chain_id) => {
                    parse::<u64>(key, chain_id)?;
                    self.chain_rpc_urls.insert(chain_id.to_string(), value.to_string());
                }
                None => {
                    return Err(Error::Generic(format!(
                        "invalid key: \'{key}\' is not a valid configuration key."
                    )))
                }
            },
        }

        Ok(())
    }

    /// Update a single key/value pair in the configuration and write it to disk.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.set(key, value)?;

        // write the updated config to disk
        self.save()?;

        Ok(())
    }
}

/// The `config` command is used to display and edit the current configuration.
pub fn config(args: ConfigArgs) -> Result<(), Error> {
    if !args.key.is_empty() {
        if !args.value.is_empty() {
            // read the config file and update the key/value pair
            let mut config = Configuration::load()?;
            config.update(&args.key, &args.value)?;
            info!("updated configuration! Set \'{}\' = \'{}\' .", &args.key, &args.value);
        } else {
            // key is set, but no value is set
            error!("found key but no value to set. Please specify a value to set, use `slotscope config --help` for more information.");
        }
    } else {
        // no key is set, print the config file
        println!("{:#?}", Configuration::load()?);
        info!("use `slotscope config <KEY> <VALUE>` to set a key/value pair.");
    }

    Ok(())
}
