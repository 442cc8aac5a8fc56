//! Command-line arguments and settings resolution
//!
//! Each setting is resolved as: flag > environment variable > TOML file > default.
//! `clap` covers the first two tiers; [`Settings::resolve`] merges in the rest.

use crate::engine::{EngineOptions, SizeThreshold};
use crate::sink::ReportFormat;
use chrono::NaiveDate;
use clap::Parser;
use pvid_common::config::{ConnectionInfo, TomlConfig};
use pvid_common::time::{parse_date, secs_to_duration, yesterday};
use pvid_common::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATASET_ROOT: &str = "/home/minio/data/pvid/person";
pub const DEFAULT_INPUT_DIR: &str = "data";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for pvid-da
#[derive(Parser, Debug, Default)]
#[command(name = "pvid-da")]
#[command(about = "Explains why face and body captures were not archived")]
#[command(version)]
pub struct Args {
    /// TOML config file
    #[arg(short, long, env = "PVID_DA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Analytical (snapshot) store host
    #[arg(long, env = "PVID_ANALYTICAL_HOST")]
    pub analytical_host: Option<String>,

    #[arg(long, env = "PVID_ANALYTICAL_PORT")]
    pub analytical_port: Option<u16>,

    #[arg(long, env = "PVID_ANALYTICAL_USER")]
    pub analytical_user: Option<String>,

    #[arg(long, env = "PVID_ANALYTICAL_PASSWORD", hide_env_values = true)]
    pub analytical_password: Option<String>,

    #[arg(long, env = "PVID_ANALYTICAL_DATABASE")]
    pub analytical_database: Option<String>,

    /// Metadata (task/device) store host
    #[arg(long, env = "PVID_METADATA_HOST")]
    pub metadata_host: Option<String>,

    #[arg(long, env = "PVID_METADATA_PORT")]
    pub metadata_port: Option<u16>,

    #[arg(long, env = "PVID_METADATA_USER")]
    pub metadata_user: Option<String>,

    #[arg(long, env = "PVID_METADATA_PASSWORD", hide_env_values = true)]
    pub metadata_password: Option<String>,

    #[arg(long, env = "PVID_METADATA_DATABASE")]
    pub metadata_database: Option<String>,

    /// Analysis date, YYYY-MM-DD (default: yesterday)
    #[arg(short, long, env = "PVID_DA_DATE")]
    pub date: Option<String>,

    /// Root directory of the archiving job's classification datasets
    #[arg(long, env = "PVID_DA_DATASET_ROOT")]
    pub dataset_root: Option<PathBuf>,

    /// Directory of batch files; reports go to <input-dir>/result
    #[arg(short, long, env = "PVID_DA_INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Report format: text or json
    #[arg(short, long, env = "PVID_DA_FORMAT")]
    pub format: Option<String>,

    /// Deadline for every repository query, in seconds
    #[arg(long, env = "PVID_DA_QUERY_TIMEOUT")]
    pub query_timeout_secs: Option<u64>,

    #[arg(long, env = "PVID_DA_MIN_PERSON_HEIGHT")]
    pub min_person_height: Option<i32>,

    #[arg(long, env = "PVID_DA_MIN_PERSON_WIDTH")]
    pub min_person_width: Option<i32>,

    /// Classify body captures from devices not configured for person archiving
    /// (`--check-device-archive=false` turns off a config-file `true`)
    #[arg(
        long,
        env = "PVID_DA_CHECK_DEVICE_ARCHIVE",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub check_device_archive: Option<bool>,

    /// Log level directive, overridden by RUST_LOG
    #[arg(long, env = "PVID_DA_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Fully resolved run settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub analytical: ConnectionInfo,
    pub metadata: ConnectionInfo,
    pub date: NaiveDate,
    pub dataset_root: PathBuf,
    pub input_dir: PathBuf,
    pub format: ReportFormat,
    pub query_timeout: Duration,
    pub size: SizeThreshold,
    pub check_device_archive: bool,
    pub log_level: String,
}

impl Settings {
    /// Merge arguments over the config file over compiled defaults
    pub fn resolve(args: &Args, config: &TomlConfig) -> Result<Self> {
        let analysis = &config.analysis;
        let defaults = SizeThreshold::default();

        let date = match args.date.as_deref().or(analysis.date.as_deref()) {
            Some(value) => parse_date(value)?,
            None => yesterday(),
        };
        let query_timeout_secs = args
            .query_timeout_secs
            .or(analysis.query_timeout_secs)
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS);
        if query_timeout_secs == 0 {
            return Err(Error::Config(
                "query_timeout_secs must be at least 1".to_string(),
            ));
        }
        let format = match args.format.as_deref().or(analysis.format.as_deref()) {
            Some(value) => value.parse()?,
            None => ReportFormat::default(),
        };

        Ok(Self {
            analytical: overlay(
                config.analytical_connection(),
                &args.analytical_host,
                args.analytical_port,
                &args.analytical_user,
                &args.analytical_password,
                &args.analytical_database,
            ),
            metadata: overlay(
                config.metadata_connection(),
                &args.metadata_host,
                args.metadata_port,
                &args.metadata_user,
                &args.metadata_password,
                &args.metadata_database,
            ),
            date,
            dataset_root: args
                .dataset_root
                .clone()
                .or_else(|| analysis.dataset_root.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_ROOT)),
            input_dir: args
                .input_dir
                .clone()
                .or_else(|| analysis.input_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR)),
            format,
            query_timeout: secs_to_duration(query_timeout_secs),
            size: SizeThreshold {
                min_height: args
                    .min_person_height
                    .or(analysis.min_person_height)
                    .unwrap_or(defaults.min_height),
                min_width: args
                    .min_person_width
                    .or(analysis.min_person_width)
                    .unwrap_or(defaults.min_width),
            },
            check_device_archive: args
                .check_device_archive
                .or(analysis.check_device_archive)
                .unwrap_or(false),
            log_level: args
                .log_level
                .clone()
                .unwrap_or_else(|| config.logging.level.clone()),
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            date: self.date,
            size: self.size,
            check_device_archive: self.check_device_archive,
        }
    }
}

fn overlay(
    base: ConnectionInfo,
    host: &Option<String>,
    port: Option<u16>,
    user: &Option<String>,
    password: &Option<String>,
    database: &Option<String>,
) -> ConnectionInfo {
    ConnectionInfo {
        host: host.clone().unwrap_or(base.host),
        port: port.unwrap_or(base.port),
        user: user.clone().unwrap_or(base.user),
        password: password.clone().unwrap_or(base.password),
        database: database.clone().unwrap_or(base.database),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_args_or_config() {
        let settings = Settings::resolve(&Args::default(), &TomlConfig::default()).unwrap();
        assert_eq!(settings.analytical, ConnectionInfo::analytical_default());
        assert_eq!(settings.metadata, ConnectionInfo::metadata_default());
        assert_eq!(settings.date, yesterday());
        assert_eq!(settings.dataset_root, PathBuf::from(DEFAULT_DATASET_ROOT));
        assert_eq!(settings.input_dir, PathBuf::from(DEFAULT_INPUT_DIR));
        assert_eq!(settings.format, ReportFormat::Text);
        assert_eq!(settings.query_timeout, Duration::from_secs(60));
        assert_eq!(settings.size, SizeThreshold::default());
        assert!(!settings.check_device_archive);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_args_override_config() {
        let config = TomlConfig::from_toml_str(
            r#"
            [analytical]
            host = "10.0.0.1"
            port = 6000

            [analysis]
            date = "2024-01-31"
            input_dir = "/srv/batches"
            format = "json"
            min_person_height = 100
            "#,
        )
        .unwrap();
        let args = Args {
            analytical_host: Some("10.0.0.2".into()),
            date: Some("2024-02-01".into()),
            min_person_width: Some(40),
            ..Default::default()
        };

        let settings = Settings::resolve(&args, &config).unwrap();
        assert_eq!(settings.analytical.host, "10.0.0.2");
        assert_eq!(settings.analytical.port, 6000);
        assert_eq!(settings.analytical.user, "dbadmin");
        assert_eq!(settings.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(settings.input_dir, PathBuf::from("/srv/batches"));
        assert_eq!(settings.format, ReportFormat::Json);
        assert_eq!(settings.size.min_height, 100);
        assert_eq!(settings.size.min_width, 40);
    }

    #[test]
    fn test_invalid_date_is_config_error() {
        let args = Args {
            date: Some("31/01/2024".into()),
            ..Default::default()
        };
        let err = Settings::resolve(&args, &TomlConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_format_is_config_error() {
        let args = Args {
            format: Some("csv".into()),
            ..Default::default()
        };
        assert!(matches!(
            Settings::resolve(&args, &TomlConfig::default()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_parse_long_flags() {
        let args = Args::try_parse_from([
            "pvid-da",
            "--analytical-port",
            "5444",
            "--check-device-archive",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.analytical_port, Some(5444));
        assert_eq!(args.check_device_archive, Some(true));
        assert_eq!(args.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_zero_query_timeout_rejected() {
        let args = Args {
            query_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            Settings::resolve(&args, &TomlConfig::default()),
            Err(Error::Config(_))
        ));

        let config = TomlConfig::from_toml_str("[analysis]\nquery_timeout_secs = 0\n").unwrap();
        assert!(matches!(
            Settings::resolve(&Args::default(), &config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_flag_turns_off_device_check_from_config() {
        let config =
            TomlConfig::from_toml_str("[analysis]\ncheck_device_archive = true\n").unwrap();

        let enabled = Settings::resolve(&Args::default(), &config).unwrap();
        assert!(enabled.check_device_archive);

        let args = Args::try_parse_from(["pvid-da", "--check-device-archive=false"]).unwrap();
        assert_eq!(args.check_device_archive, Some(false));
        let disabled = Settings::resolve(&args, &config).unwrap();
        assert!(!disabled.check_device_archive);
    }

    #[test]
    fn test_device_check_flag_without_value_enables() {
        let args = Args::try_parse_from(["pvid-da", "--check-device-archive", "-f", "json"]).unwrap();
        assert_eq!(args.check_device_archive, Some(true));
        assert_eq!(args.format.as_deref(), Some("json"));
    }
}
