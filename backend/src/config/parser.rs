use crate::models::task::TaskEvent;
use crate::orchestrator::engine::{OrchestratorConfig, TaskConfig, DEFAULT_RNG_SEED};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that abort a config load
///
/// Line numbers are 1-based and count every line of the input, including
/// comments and blank lines.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config has no header line")]
    MissingHeader,

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("line {line}: {field} must be a number, got '{value}'")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: unknown event token '{token}'")]
    UnknownEvent { line: usize, token: String },
}

impl ConfigError {
    /// Line the error points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            ConfigError::Malformed { line, .. }
            | ConfigError::InvalidNumber { line, .. }
            | ConfigError::UnknownEvent { line, .. } => Some(*line),
            ConfigError::Io { .. } | ConfigError::MissingHeader => None,
        }
    }
}

fn number<T: FromStr>(line: usize, field: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        line,
        field,
        value: value.trim().to_string(),
    })
}

/// Strip an ASCII prefix, ignoring case
fn strip_prefix_ci<'a>(token: &'a str, prefix: &str) -> Option<&'a str> {
    let head = token.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &token[prefix.len()..])
}

/// Parse one event token
///
/// # Example
///
/// ```rust
/// use cpu_scheduler_sim_core::config::parse_event;
/// use cpu_scheduler_sim_core::models::task::TaskEvent;
///
/// assert_eq!(parse_event("IO:2-3", 1).unwrap(), TaskEvent::io(2, 3));
/// assert_eq!(parse_event("ml01:4", 1).unwrap(), TaskEvent::lock(4, "01"));
/// ```
pub fn parse_event(token: &str, line: usize) -> Result<TaskEvent, ConfigError> {
    let token = token.trim();
    let unknown = || ConfigError::UnknownEvent {
        line,
        token: token.to_string(),
    };

    if let Some(rest) = strip_prefix_ci(token, "IO:") {
        let (start, duration) = rest.split_once('-').ok_or_else(unknown)?;
        return Ok(TaskEvent::io(
            number(line, "I/O start", start)?,
            number(line, "I/O duration", duration)?,
        ));
    }

    let (lock, rest) = if let Some(rest) = strip_prefix_ci(token, "ML") {
        (true, rest)
    } else if let Some(rest) = strip_prefix_ci(token, "MU") {
        (false, rest)
    } else {
        return Err(unknown());
    };

    let (mutex_id, start) = rest.rsplit_once(':').ok_or_else(unknown)?;
    if mutex_id.is_empty() {
        return Err(ConfigError::Malformed {
            line,
            message: format!("event '{}' has an empty mutex id", token),
        });
    }
    let start = number(line, "mutex event start", start)?;

    Ok(if lock {
        TaskEvent::lock(start, mutex_id)
    } else {
        TaskEvent::unlock(start, mutex_id)
    })
}

fn parse_header(text: &str, line: usize, config: &mut OrchestratorConfig) -> Result<(), ConfigError> {
    let fields: Vec<&str> = text.split(';').map(str::trim).collect();
    if !(2..=3).contains(&fields.len()) || fields[0].is_empty() {
        return Err(ConfigError::Malformed {
            line,
            message: "header must be <algorithm>;<quantum>[;<alpha>]".to_string(),
        });
    }

    config.algorithm = fields[0].to_string();
    config.quantum = number(line, "quantum", fields[1])?;
    if let Some(alpha) = fields.get(2) {
        config.alpha = number(line, "alpha", alpha)?;
    }
    Ok(())
}

fn parse_task(text: &str, line: usize) -> Result<TaskConfig, ConfigError> {
    let fields: Vec<&str> = text.split(';').map(str::trim).collect();
    if fields.len() < 5 {
        return Err(ConfigError::Malformed {
            line,
            message: format!(
                "task needs <id>;<color>;<arrival>;<duration>;<priority>, got {} field(s)",
                fields.len()
            ),
        });
    }
    if fields[0].is_empty() {
        return Err(ConfigError::Malformed {
            line,
            message: "task id is empty".to_string(),
        });
    }

    let events = fields[5..]
        .iter()
        .filter(|token| !token.is_empty())
        .map(|token| parse_event(token, line))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TaskConfig {
        id: fields[0].to_string(),
        color: fields[1].to_string(),
        arrival: number(line, "arrival", fields[2])?,
        duration: number(line, "duration", fields[3])?,
        priority: number(line, "priority", fields[4])?,
        events,
    })
}

/// Parse config text into an orchestrator config
///
/// The seed is [`DEFAULT_RNG_SEED`]; callers may override it afterwards.
pub fn parse_config(text: &str) -> Result<OrchestratorConfig, ConfigError> {
    let mut config = OrchestratorConfig {
        rng_seed: DEFAULT_RNG_SEED,
        ..Default::default()
    };
    let mut seen_header = false;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        if seen_header {
            config.task_configs.push(parse_task(content, line)?);
        } else {
            parse_header(content, line, &mut config)?;
            seen_header = true;
        }
    }

    if !seen_header {
        return Err(ConfigError::MissingHeader);
    }
    Ok(config)
}

/// Read and parse a config file
pub fn load_config(path: impl AsRef<Path>) -> Result<OrchestratorConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&text)
}
