// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempted_app::{DEFAULT_ADDRESS, DEFAULT_NAMESPACE};

pub const APP_NAME: &str = "tempted";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_UPDATE_SECONDS: i64 = 2;
const DEFAULT_TIMEOUT: &str = "10s";
const DISABLED_UPDATE_SECONDS: i64 = -1;

pub const LOGO_COLOR_ENV: &str = "TEMPTED_LOGO_COLOR";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub temporal: Temporal,
    #[serde(default)]
    pub ui: Ui,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            temporal: Temporal::default(),
            ui: Ui::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Temporal {
    pub address: Option<String>,
    pub namespace: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub update_seconds: Option<i64>,
    pub logo_color: Option<String>,
}

/// Values that outrank the file: flags, or the environment variables clap
/// reads for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub address: Option<String>,
    pub namespace: Option<String>,
    pub update_seconds: Option<i64>,
    pub token: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("TEMPTED_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set TEMPTED_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [temporal] and [ui]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(timeout) = &self.temporal.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "temporal.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(seconds) = self.ui.update_seconds {
            update_interval(seconds).with_context(|| {
                format!("invalid ui.update_seconds in {}", path.display())
            })?;
        }

        Ok(())
    }

    /// Merges overrides, then `env_lookup`, then the file, then defaults.
    pub fn resolve(
        &self,
        overrides: &Overrides,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<tempted_app::Config> {
        let address = first_non_empty([
            overrides.address.clone(),
            self.temporal.address.clone(),
        ])
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_owned());
        let namespace = first_non_empty([
            overrides.namespace.clone(),
            self.temporal.namespace.clone(),
        ])
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned());
        let token = first_non_empty([overrides.token.clone(), self.temporal.token.clone()]);
        let update_seconds = overrides
            .update_seconds
            .or(self.ui.update_seconds)
            .unwrap_or(DEFAULT_UPDATE_SECONDS);
        let logo_color = first_non_empty([env_lookup(LOGO_COLOR_ENV), self.ui.logo_color.clone()])
            .unwrap_or_default();
        let timeout = parse_duration(self.temporal.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))?;

        Ok(tempted_app::Config {
            address,
            namespace,
            update_interval: update_interval(update_seconds)?,
            logo_color,
            token,
            timeout,
            ..tempted_app::Config::default()
        })
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# tempted config\n# Place this file at: {}\n\nversion = 1\n\n[temporal]\n# Temporal HTTP API address (TEMPORAL_ADDRESS)\naddress = \"{}\"\n# Namespace to browse (TEMPORAL_NAMESPACE)\nnamespace = \"{}\"\n# Bearer token (TEMPORAL_TOKEN)\n# token = \"\"\ntimeout = \"{}\"\n\n[ui]\n# Seconds between refreshes; -1 disables (TEMPTED_UPDATE_SECONDS)\nupdate_seconds = {}\n# Logo color as a name or #rrggbb (TEMPTED_LOGO_COLOR)\n# logo_color = \"#7b61ff\"\n",
            path.display(),
            DEFAULT_ADDRESS,
            DEFAULT_NAMESPACE,
            DEFAULT_TIMEOUT,
            DEFAULT_UPDATE_SECONDS,
        )
    }
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
}

/// Zero and -1 turn periodic refresh off.
pub fn update_interval(seconds: i64) -> Result<Duration> {
    match seconds {
        DISABLED_UPDATE_SECONDS | 0 => Ok(Duration::ZERO),
        seconds if seconds > 0 => Ok(Duration::from_secs(seconds.unsigned_abs())),
        seconds => bail!("update interval must be positive or -1 to disable, got {seconds}"),
    }
}

const DURATION_UNITS: [(&str, u64); 3] = [("ms", 1), ("s", 1_000), ("m", 60_000)];

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    for (suffix, millis_per_unit) in DURATION_UNITS {
        if let Some(amount) = trimmed.strip_suffix(suffix) {
            let amount: u64 = amount
                .parse()
                .with_context(|| format!("timeout {raw:?} needs a whole number before {suffix:?}"))?;
            return Ok(Duration::from_millis(amount.saturating_mul(millis_per_unit)));
        }
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, Overrides, parse_duration, update_interval};
    use anyhow::Result;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);

        let resolved = config.resolve(&Overrides::default(), no_env)?;
        assert_eq!(resolved.address, "http://localhost:7243");
        assert_eq!(resolved.namespace, "default");
        assert_eq!(resolved.update_interval, Duration::from_secs(2));
        assert_eq!(resolved.timeout, Duration::from_secs(10));
        assert_eq!(resolved.token, None);
        assert!(resolved.logo_color.is_empty());
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[temporal]\naddress=\"localhost:7243\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[temporal] and [ui]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[temporal]\naddress = \"temporal.internal:7243\"\nnamespace = \"orders\"\ntoken = \"abc\"\ntimeout = \"500ms\"\n[ui]\nupdate_seconds = 5\nlogo_color = \"#00ff00\"\n",
        )?;
        let resolved = Config::load(&path)?.resolve(&Overrides::default(), no_env)?;
        assert_eq!(resolved.address, "temporal.internal:7243");
        assert_eq!(resolved.namespace, "orders");
        assert_eq!(resolved.token.as_deref(), Some("abc"));
        assert_eq!(resolved.timeout, Duration::from_millis(500));
        assert_eq!(resolved.update_interval, Duration::from_secs(5));
        assert_eq!(resolved.logo_color, "#00ff00");
        Ok(())
    }

    #[test]
    fn overrides_beat_file_values() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[temporal]\naddress = \"file:7243\"\nnamespace = \"file-ns\"\n[ui]\nupdate_seconds = 5\nlogo_color = \"red\"\n",
        )?;
        let overrides = Overrides {
            address: Some("flag:7243".to_owned()),
            namespace: Some("  ".to_owned()),
            update_seconds: Some(-1),
            token: Some("flag-token".to_owned()),
        };
        let env = BTreeMap::from([("TEMPTED_LOGO_COLOR".to_owned(), "blue".to_owned())]);
        let resolved =
            Config::load(&path)?.resolve(&overrides, |key| env.get(key).cloned())?;
        assert_eq!(resolved.address, "flag:7243");
        assert_eq!(resolved.namespace, "file-ns");
        assert_eq!(resolved.update_interval, Duration::ZERO);
        assert_eq!(resolved.token.as_deref(), Some("flag-token"));
        assert_eq!(resolved.logo_color, "blue");
        Ok(())
    }

    #[test]
    fn broken_toml_names_the_file() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[temporal\n")?;
        let error = Config::load(&path).expect_err("broken TOML should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn zero_timeout_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[temporal]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn negative_update_seconds_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\nupdate_seconds = -5\n")?;
        let error = Config::load(&path).expect_err("negative interval should fail");
        assert!(format!("{error:#}").contains("-1 to disable"));
        Ok(())
    }

    #[test]
    fn update_interval_handles_disable_values() -> Result<()> {
        assert_eq!(update_interval(-1)?, Duration::ZERO);
        assert_eq!(update_interval(0)?, Duration::ZERO);
        assert_eq!(update_interval(3)?, Duration::from_secs(3));
        assert!(update_interval(-2).is_err());
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("250ms")?, Duration::from_millis(250));
        assert_eq!(parse_duration(" 30s ")?, Duration::from_secs(30));
        assert_eq!(parse_duration("3m")?, Duration::from_secs(180));
        let error = parse_duration("soon").expect_err("unitless text should fail");
        assert!(error.to_string().contains("invalid duration"));
        let error = parse_duration("fives").expect_err("non-numeric amount should fail");
        assert!(error.to_string().contains("whole number"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("TEMPTED_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("TEMPTED_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_ends_in_app_config_toml() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("TEMPTED_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("tempted/config.toml"));
        Ok(())
    }

    #[test]
    fn example_config_round_trips() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.temporal.namespace.as_deref(), Some("default"));
        assert_eq!(config.ui.update_seconds, Some(2));
        Ok(())
    }
}
