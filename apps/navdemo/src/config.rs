use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::Deserialize;
use shared::{Route, ROUTE_DELIMITER};

pub const DEFAULT_CONFIG_FILE: &str = "navdemo.toml";
const ENV_PREFIX: &str = "NAVDEMO__";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_filter: String,
    pub transition_delay_ms: u64,
    pub route_delimiter: char,
    pub initial_route: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            transition_delay_ms: 0,
            route_delimiter: ROUTE_DELIMITER,
            initial_route: "auth/signIn".into(),
        }
    }
}

impl Settings {
    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    pub fn parse_route(&self, raw: &str) -> Route {
        Route::parse_with(raw, self.route_delimiter)
    }

    pub fn initial_route(&self) -> Route {
        self.parse_route(&self.initial_route)
    }
}

/// Defaults, then the TOML file, then `NAVDEMO__*` environment variables.
///
/// An explicitly requested file must exist; the default `navdemo.toml` is
/// optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let mut settings = match fs::read_to_string(&path) {
        Ok(raw) => parse_settings(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => Settings::default(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(raw)?)
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

    if let Some(v) = var("LOG_FILTER") {
        settings.log_filter = v;
    }
    if let Some(v) = var("TRANSITION_DELAY_MS") {
        settings.transition_delay_ms = v
            .trim()
            .parse()
            .with_context(|| format!("{ENV_PREFIX}TRANSITION_DELAY_MS is not a number: '{v}'"))?;
    }
    if let Some(v) = var("ROUTE_DELIMITER") {
        let mut chars = v.chars();
        match (chars.next(), chars.next()) {
            (Some(delimiter), None) => settings.route_delimiter = delimiter,
            _ => bail!("{ENV_PREFIX}ROUTE_DELIMITER must be a single character, got '{v}'"),
        }
    }
    if let Some(v) = var("INITIAL_ROUTE") {
        settings.initial_route = v;
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
