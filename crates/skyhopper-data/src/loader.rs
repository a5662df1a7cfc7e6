//! Settings loading: reads the settings file and resolves it into an
//! [`EngineConfig`].
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus validation of the resolved values.

use crate::schema::{SettingsData, TierData};
use serde::de::DeserializeOwned;
use skyhopper_core::config::{EngineConfig, StartingStats};
use skyhopper_core::fixed::Seconds;
use skyhopper_core::node::Improvement;
use skyhopper_core::upgrade::{Tier, UpgradeLadder, UpgradeTable};
use std::path::{Path, PathBuf};

/// Base name of the settings file.
pub const SETTINGS_FILE: &str = "settings";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A value parsed but is not usable.
    #[error("invalid {field} in {file}: {detail}")]
    Invalid {
        file: PathBuf,
        field: &'static str,
        detail: String,
    },

    /// The same value appears twice on one ladder.
    #[error("duplicate {field} tier {value} in {file}")]
    DuplicateTier {
        file: PathBuf,
        field: &'static str,
        value: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one exists.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }
    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Parse a string in the given format. `file` is only used for errors.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataLoadError> {
    let parse = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse(e.to_string())),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Resolution
// ===========================================================================

fn to_seconds(value: f64, field: &'static str, file: &Path) -> Result<Seconds, DataLoadError> {
    let invalid = |detail: String| DataLoadError::Invalid {
        file: file.to_path_buf(),
        field,
        detail,
    };
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(format!("{value} is not a positive number of seconds")));
    }
    Seconds::checked_from_num(value).ok_or_else(|| invalid(format!("{value} is out of range")))
}

fn count_ladder(
    tiers: &[TierData<u32>],
    field: &'static str,
    file: &Path,
) -> Result<UpgradeLadder<u32>, DataLoadError> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::with_capacity(tiers.len());
    for t in tiers {
        if !seen.insert(t.value) {
            return Err(DataLoadError::DuplicateTier {
                file: file.to_path_buf(),
                field,
                value: t.value.to_string(),
            });
        }
        out.push(Tier {
            value: t.value,
            price: t.price,
        });
    }
    Ok(UpgradeLadder::new(Improvement::Increase, out))
}

fn speed_ladder(
    tiers: &[TierData<f64>],
    field: &'static str,
    file: &Path,
) -> Result<UpgradeLadder<Seconds>, DataLoadError> {
    let mut out: Vec<Tier<Seconds>> = Vec::with_capacity(tiers.len());
    for t in tiers {
        let value = to_seconds(t.value, field, file)?;
        if out.iter().any(|existing| existing.value == value) {
            return Err(DataLoadError::DuplicateTier {
                file: file.to_path_buf(),
                field,
                value: t.value.to_string(),
            });
        }
        out.push(Tier {
            value,
            price: t.price,
        });
    }
    Ok(UpgradeLadder::new(Improvement::Decrease, out))
}

/// Validate parsed settings and build the engine configuration.
pub fn resolve_settings(data: &SettingsData, file: &Path) -> Result<EngineConfig, DataLoadError> {
    let s = &data.starting;
    let starting = StartingStats {
        suction_speed: to_seconds(s.suction_speed, "starting.suction_speed", file)?,
        suction_amount: s.suction_amount,
        suction_range: s.suction_range,
        transfer_speed: to_seconds(s.transfer_speed, "starting.transfer_speed", file)?,
        transfer_amount: s.transfer_amount,
        max_links: s.max_links,
    };

    let u = &data.upgrades;
    let table = UpgradeTable {
        suction_speed: speed_ladder(&u.suction_speed, "upgrades.suction_speed", file)?,
        suction_amount: count_ladder(&u.suction_amount, "upgrades.suction_amount", file)?,
        suction_range: count_ladder(&u.suction_range, "upgrades.suction_range", file)?,
        transfer_speed: speed_ladder(&u.transfer_speed, "upgrades.transfer_speed", file)?,
        transfer_amount: count_ladder(&u.transfer_amount, "upgrades.transfer_amount", file)?,
        max_links: count_ladder(&u.max_links, "upgrades.max_links", file)?,
    };

    warn_unreachable(&table.suction_speed, starting.suction_speed, "suction_speed", file);
    warn_unreachable(&table.suction_amount, starting.suction_amount, "suction_amount", file);
    warn_unreachable(&table.suction_range, starting.suction_range, "suction_range", file);
    warn_unreachable(&table.transfer_speed, starting.transfer_speed, "transfer_speed", file);
    warn_unreachable(&table.transfer_amount, starting.transfer_amount, "transfer_amount", file);
    warn_unreachable(&table.max_links, starting.max_links, "max_links", file);

    Ok(EngineConfig::new(starting, table))
}

/// Tiers no better than the starting value can never be bought.
fn warn_unreachable<T: Copy + PartialOrd>(
    ladder: &UpgradeLadder<T>,
    start: T,
    field: &str,
    file: &Path,
) {
    let dead = ladder
        .tiers()
        .iter()
        .filter(|t| !ladder.direction().is_better(t.value, start))
        .count();
    if dead > 0 {
        log::warn!(
            "{}: {dead} {field} tier(s) are no better than the starting value",
            file.display()
        );
    }
}

/// Load `settings.{ron,toml,json}` from `dir`. A missing file yields the
/// default configuration.
pub fn load_settings(dir: &Path) -> Result<EngineConfig, DataLoadError> {
    let Some(path) = find_data_file(dir, SETTINGS_FILE)? else {
        log::info!("no settings file in {}, using defaults", dir.display());
        return Ok(EngineConfig::default());
    };
    let data: SettingsData = deserialize_file(&path)?;
    let config = resolve_settings(&data, &path)?;
    log::info!("loaded settings from {}", path.display());
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
