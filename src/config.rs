use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::layout::{LayoutSettings, HORIZONTAL_SPACING, VERTICAL_SPACING};
use clap::{Parser, Subcommand};
use config::{
    Config as ConfigCrate, // Need this for builder
    ConfigError as ConfigCrateError,
    Environment,
    File,
    Map,
    Source,
    Value,
};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_MAX_LABEL_WIDTH: usize = 40;
const DEFAULT_MAX_NODES: usize = 80;
// Terminal cells per layout unit
const DEFAULT_ZOOM_X: f64 = 0.06;
const DEFAULT_ZOOM_Y: f64 = 0.03;
const DEFAULT_PAN_STEP: u16 = 4;
const DEFAULT_SHOW_EDGE_LABELS: bool = true;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] ConfigCrateError),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

// Optional fields allow for layered config (defaults -> file -> env -> args).
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
struct FileConfig {
    horizontal_spacing: Option<f64>,
    vertical_spacing: Option<f64>,
    max_history: Option<usize>,
    max_label_width: Option<usize>,
    max_nodes: Option<usize>,
    zoom_x: Option<f64>,
    zoom_y: Option<f64>,
    pan_step: Option<u16>,
    show_edge_labels: Option<bool>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub horizontal_spacing: f64,
    pub vertical_spacing: f64,
    pub max_history: usize,
    pub max_label_width: usize,
    pub max_nodes: usize,
    pub zoom_x: f64,
    pub zoom_y: f64,
    pub pan_step: u16,
    pub show_edge_labels: bool,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            horizontal_spacing: HORIZONTAL_SPACING,
            vertical_spacing: VERTICAL_SPACING,
            max_history: DEFAULT_HISTORY_CAPACITY,
            max_label_width: DEFAULT_MAX_LABEL_WIDTH,
            max_nodes: DEFAULT_MAX_NODES,
            zoom_x: DEFAULT_ZOOM_X,
            zoom_y: DEFAULT_ZOOM_Y,
            pan_step: DEFAULT_PAN_STEP,
            show_edge_labels: DEFAULT_SHOW_EDGE_LABELS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    pub fn layout_settings(&self) -> LayoutSettings {
        LayoutSettings {
            horizontal_spacing: self.horizontal_spacing,
            vertical_spacing: self.vertical_spacing,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Mindmap layout engine and terminal viewer", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a custom configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration and exit
    #[arg(long, global = true)]
    pub debug_config: bool,

    #[arg(long, global = true)]
    pub horizontal_spacing: Option<f64>,
    #[arg(long, global = true)]
    pub vertical_spacing: Option<f64>,
    #[arg(long, global = true)]
    pub max_history: Option<usize>,
    #[arg(long, global = true)]
    pub max_label_width: Option<usize>,
    #[arg(long, global = true)]
    pub max_nodes: Option<usize>,
    #[arg(long, global = true)]
    pub zoom_x: Option<f64>,
    #[arg(long, global = true)]
    pub zoom_y: Option<f64>,
    #[arg(long, global = true)]
    pub pan_step: Option<u16>,
    #[arg(long, global = true)]
    pub show_edge_labels: Option<bool>,
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the computed layout of a node list as JSON
    Layout {
        /// Canonical node list or raw model response
        input: PathBuf,
        #[arg(long)]
        pretty: bool,
        /// Also report orphans and duplicates on stderr
        #[arg(long)]
        report: bool,
    },
    /// Derive a node list from a plain-text note
    Outline {
        note: PathBuf,
        /// Root label, defaults to the file name
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Open the interactive viewer
    View {
        /// A node list (.json) or a plain-text note
        input: PathBuf,
        #[arg(long)]
        title: Option<String>,
    },
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mindmap-engine").map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn load_config(args: &CliArgs) -> Result<AppConfig, ConfigError> {
    let env_source = Environment::with_prefix("MINDMAP").separator("__");
    // Missing env vars are fine; a failing collect just means no overrides
    let env_map: Map<String, Value> = env_source.collect().unwrap_or_else(|_| Map::new());

    build_config_from_args(args, Some(env_map))
}

// Separate function to allow testing with specific args and override sources
fn build_config_from_args(
    args: &CliArgs,
    override_source: Option<Map<String, Value>>,
) -> Result<AppConfig, ConfigError> {
    let config_file_path = args.config.clone().or_else(default_config_path);

    let mut config_builder = ConfigCrate::builder();

    if let Some(ref path) = config_file_path {
        config_builder = config_builder.add_source(File::from(path.clone()).required(false));
    }

    // Overrides (environment or test map) beat the file
    if let Some(overrides) = override_source {
        for (key, value) in overrides {
            config_builder = config_builder.set_override(&key, value)?;
        }
    }

    let loaded: FileConfig = config_builder.build()?.try_deserialize()?;

    // args > overrides > file > defaults
    let config = AppConfig {
        horizontal_spacing: args
            .horizontal_spacing
            .or(loaded.horizontal_spacing)
            .unwrap_or(HORIZONTAL_SPACING),
        vertical_spacing: args
            .vertical_spacing
            .or(loaded.vertical_spacing)
            .unwrap_or(VERTICAL_SPACING),
        max_history: args
            .max_history
            .or(loaded.max_history)
            .unwrap_or(DEFAULT_HISTORY_CAPACITY),
        max_label_width: args
            .max_label_width
            .or(loaded.max_label_width)
            .unwrap_or(DEFAULT_MAX_LABEL_WIDTH),
        max_nodes: args
            .max_nodes
            .or(loaded.max_nodes)
            .unwrap_or(DEFAULT_MAX_NODES),
        zoom_x: args.zoom_x.or(loaded.zoom_x).unwrap_or(DEFAULT_ZOOM_X),
        zoom_y: args.zoom_y.or(loaded.zoom_y).unwrap_or(DEFAULT_ZOOM_Y),
        pan_step: args
            .pan_step
            .or(loaded.pan_step)
            .unwrap_or(DEFAULT_PAN_STEP),
        show_edge_labels: args
            .show_edge_labels
            .or(loaded.show_edge_labels)
            .unwrap_or(DEFAULT_SHOW_EDGE_LABELS),
        log_level: args
            .log_level
            .clone()
            .or(loaded.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        log_file: args.log_file.clone().or(loaded.log_file),
    };

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let positive = [
        ("horizontal_spacing", config.horizontal_spacing),
        ("vertical_spacing", config.vertical_spacing),
        ("zoom_x", config.zoom_x),
        ("zoom_y", config.zoom_y),
    ];
    for (name, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "{name} must be a positive number, got {value}"
            )));
        }
    }

    if config.max_history == 0 {
        return Err(ConfigError::ValidationError(
            "max_history must be at least 1".to_string(),
        ));
    }
    if config.max_label_width < 4 {
        return Err(ConfigError::ValidationError(
            "max_label_width must be at least 4".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ValueKind;
    use tempfile::TempDir;

    // Points --config at a file that does not exist so the user's own config
    // never leaks into tests
    fn test_args(dir: &TempDir, extra: &[&str]) -> CliArgs {
        let config_path = dir.path().join("missing.toml");
        let mut cmd = vec![
            "test_binary".to_string(),
            "--config".to_string(),
            config_path.display().to_string(),
        ];
        cmd.extend(extra.iter().map(|s| s.to_string()));
        CliArgs::try_parse_from(cmd).expect("Failed to parse test args")
    }

    #[test]
    fn test_default_config() {
        let dir = TempDir::new().unwrap();
        let config = build_config_from_args(&test_args(&dir, &[]), None).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.layout_settings(), LayoutSettings::default());
        assert_eq!(config.max_history, 50);
    }

    #[test]
    fn test_env_override() {
        let dir = TempDir::new().unwrap();
        let mut override_map = Map::new();
        override_map.insert(
            "horizontal_spacing".to_string(),
            Value::new(None, ValueKind::Float(200.0)),
        );
        override_map.insert(
            "max_history".to_string(),
            Value::new(None, ValueKind::U64(10)),
        );

        let config = build_config_from_args(&test_args(&dir, &[]), Some(override_map)).unwrap();

        assert_eq!(config.horizontal_spacing, 200.0);
        assert_eq!(config.max_history, 10);
        assert_eq!(config.vertical_spacing, VERTICAL_SPACING);
    }

    #[test]
    fn test_file_then_args() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "vertical_spacing = 80.0\nmax_label_width = 24\n").unwrap();

        let args = CliArgs::try_parse_from([
            "test_binary",
            "--config",
            path.to_str().unwrap(),
            "--max-label-width=30",
        ])
        .unwrap();
        let config = build_config_from_args(&args, None).unwrap();

        assert_eq!(config.vertical_spacing, 80.0);
        assert_eq!(config.max_label_width, 30);
    }

    #[test]
    fn test_subcommand_parsing() {
        let dir = TempDir::new().unwrap();
        let args = test_args(&dir, &["layout", "map.json", "--pretty"]);

        assert_eq!(
            args.command,
            Some(Command::Layout {
                input: PathBuf::from("map.json"),
                pretty: true,
                report: false,
            })
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let dir = TempDir::new().unwrap();
        let args = test_args(&dir, &["--vertical-spacing=0"]);
        assert!(matches!(
            build_config_from_args(&args, None),
            Err(ConfigError::ValidationError(_))
        ));

        let args = test_args(&dir, &["--max-history=0"]);
        assert!(build_config_from_args(&args, None).is_err());
    }
}
