use clap::{ArgAction, Parser, Subcommand};
use std::io::IsTerminal;
use tasklist_core::config::ConfigOverrides;
use tasklist_core::error::AppError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,

    /// More log output (repeat for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less log output (repeat for less)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasklist add "Buy milk"
    /// Example: tasklist add "Buy milk" --due 2024-01-05
    /// Example: tasklist add "Buy milk" --due 2024-01-05T09:30:00Z
    Add {
        text: Option<String>,
        /// Due date (RFC3339 or YYYY-MM-DD, defaults to now)
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
    },
    /// Mark a task as done, or open again
    ///
    /// Example: tasklist toggle 1704412800000
    Toggle { id: u64 },
    /// Delete a task after confirmation
    ///
    /// Example: tasklist delete 1704412800000
    /// Example: tasklist delete 1704412800000 --yes
    Delete {
        id: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Choose which tasks are listed (all, open, done)
    ///
    /// Example: tasklist filter open
    Filter { filter: String },
    /// List tasks grouped by due day, latest day first
    ///
    /// Example: tasklist list
    /// Example: tasklist list --filter done
    List {
        /// Switch to this filter before listing
        #[arg(long)]
        filter: Option<String>,
    },
    /// Load previous tasks from the remote list
    ///
    /// Example: tasklist import
    Import {
        /// Import again even if previous tasks were already loaded
        #[arg(long)]
        force: bool,
    },
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    ImportUrl,
    ImportTimeoutSecs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "import_url" | "url" => ConfigOverrideTarget::ImportUrl,
        "import_timeout_secs" | "import_timeout" | "timeout" => {
            ConfigOverrideTarget::ImportTimeoutSecs
        }
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("override '{field}' needs a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(|message| {
            AppError::invalid_input(format!("{CONFIG_OVERRIDE_FLAG}: {message}"))
        })?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::ImportUrl => overrides.import_url = Some(parsed.value),
            ConfigOverrideTarget::ImportTimeoutSecs => {
                let secs = parsed.value.parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "{CONFIG_OVERRIDE_FLAG}: import_timeout_secs must be a whole number"
                    ))
                })?;
                overrides.import_timeout_secs = Some(secs);
            }
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> Result<(), AppError> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|err| AppError::invalid_input(format!("invalid RUST_LOG / log filter: {err}")))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ConfigOverrideTarget, collect_overrides, parse_config_override};

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" THEME = Midnight ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::Theme);
        assert_eq!(parsed.value, "Midnight");

        let parsed = parse_config_override("Import-URL=http://localhost/posts").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::ImportUrl);
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("aliases.ls=list").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("theme").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_rejects_empty_value() {
        let err = parse_config_override("theme=  ").unwrap_err();
        assert!(err.contains("needs a value"));
    }

    #[test]
    fn collect_overrides_fills_fields() {
        let overrides = collect_overrides(&[
            "theme=noir".to_string(),
            "import_timeout_secs=5".to_string(),
        ])
        .unwrap();

        assert_eq!(overrides.theme.as_deref(), Some("noir"));
        assert_eq!(overrides.import_timeout_secs, Some(5));
        assert_eq!(overrides.import_url, None);
    }

    #[test]
    fn collect_overrides_rejects_bad_timeout() {
        let err = collect_overrides(&["timeout=soon".to_string()]).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }
}
