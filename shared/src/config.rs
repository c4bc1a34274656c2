use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => Err(()),
        }
    }
}

/// Runtime configuration, read from the environment.
///
/// | Env Var                 | Default          |
/// |-------------------------|------------------|
/// | `TABLE_NAME`            | `garden`         |
/// | `ASSETS_BUCKET`         | required         |
/// | `PUBLIC_BUCKET`         | `ASSETS_BUCKET`  |
/// | `REAPER_WORKERS`        | `4`              |
/// | `REAPER_QUEUE_CAPACITY` | `1024`           |
/// | `LOG_FORMAT`            | `json`           |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub table_name: String,
    pub assets_bucket: String,
    pub public_bucket: String,
    pub reaper_workers: usize,
    pub reaper_queue_capacity: usize,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let table_name = get("TABLE_NAME").unwrap_or_else(|| "garden".to_string());
        let assets_bucket = get("ASSETS_BUCKET").ok_or(ConfigError::Missing("ASSETS_BUCKET"))?;
        let public_bucket = get("PUBLIC_BUCKET").unwrap_or_else(|| assets_bucket.clone());

        let reaper_workers = parse_or(get("REAPER_WORKERS"), "REAPER_WORKERS", 4)?;
        let reaper_queue_capacity =
            parse_or(get("REAPER_QUEUE_CAPACITY"), "REAPER_QUEUE_CAPACITY", 1024)?;

        let log_format = match get("LOG_FORMAT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "LOG_FORMAT",
                value,
            })?,
            None => LogFormat::Json,
        };

        Ok(Self {
            table_name,
            assets_bucket,
            public_bucket,
            reaper_workers,
            reaper_queue_capacity,
            log_format,
        })
    }
}

fn parse_or(value: Option<String>, name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => match v.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::Invalid { name, value: v }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_assets_bucket_is_set() {
        let cfg = config(&[("ASSETS_BUCKET", "garden-assets")]).unwrap();
        assert_eq!(cfg.table_name, "garden");
        assert_eq!(cfg.public_bucket, "garden-assets");
        assert_eq!(cfg.reaper_workers, 4);
        assert_eq!(cfg.reaper_queue_capacity, 1024);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn assets_bucket_is_required() {
        assert_matches!(config(&[]), Err(ConfigError::Missing("ASSETS_BUCKET")));
        assert_matches!(
            config(&[("ASSETS_BUCKET", "  ")]),
            Err(ConfigError::Missing("ASSETS_BUCKET"))
        );
    }

    #[test]
    fn bad_numbers_and_formats_are_rejected() {
        assert_matches!(
            config(&[("ASSETS_BUCKET", "a"), ("REAPER_WORKERS", "0")]),
            Err(ConfigError::Invalid { name: "REAPER_WORKERS", .. })
        );
        assert_matches!(
            config(&[("ASSETS_BUCKET", "a"), ("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { name: "LOG_FORMAT", .. })
        );
    }

    #[test]
    fn explicit_values_win() {
        let cfg = config(&[
            ("ASSETS_BUCKET", "a"),
            ("PUBLIC_BUCKET", "site"),
            ("TABLE_NAME", "t"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(cfg.public_bucket, "site");
        assert_eq!(cfg.table_name, "t");
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }
}
