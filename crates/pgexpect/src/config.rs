use anyhow::anyhow;
use common::settings::parse_bool_setting;
use postgres::{Client, NoTls};

use crate::report::{ExpectError, Result};

pub const DATABASE_URL_ENV: &str = "PGEXPECT_DATABASE_URL";
pub const REQUIRE_DATABASE_ENV: &str = "PGEXPECT_REQUIRE_DB";
pub const LOG_FILTER_ENV: &str = "PGEXPECT_LOG";
pub const DEFAULT_LOG_FILTER: &str = "pgexpect=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: Option<String>,
    pub require_database: bool,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self { database_url: None, require_database: false, log_filter: DEFAULT_LOG_FILTER.into() }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            database_url: non_empty(DATABASE_URL_ENV),
            require_database: non_empty(REQUIRE_DATABASE_ENV)
                .as_deref()
                .and_then(parse_bool_setting)
                .unwrap_or(false),
            log_filter: non_empty(LOG_FILTER_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
        }
    }

    /// Opens a connection for live tests. `Ok(None)` means no database is
    /// configured and the caller should skip.
    pub fn connect(&self) -> Result<Option<Client>> {
        let Some(url) = self.database_url.as_deref() else {
            if self.require_database {
                return Err(ExpectError::Connect(anyhow!(
                    "{REQUIRE_DATABASE_ENV} is set but {DATABASE_URL_ENV} is empty"
                )));
            }
            return Ok(None);
        };

        Client::connect(url, NoTls).map(Some).map_err(|err| ExpectError::Connect(err.into()))
    }
}
