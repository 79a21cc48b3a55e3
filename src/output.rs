use std::{
    fmt::{Display, Formatter},
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{core::tax::Commodity, prelude::*};

pub const RUN_LOG: &str = "runs.log";

pub const CBS_RATES: &str = "cbs_rates.json";

pub const COMPARISON: &str = "compare_prices.csv";

/// Artifact names of one commodity.
pub struct CommodityArtifacts {
    /// Reconciled monthly prices.
    pub prices: &'static str,

    /// Monthly means of the raw market prices.
    pub averages: &'static str,

    /// Freshly fetched all-in price points.
    pub points: &'static str,
}

impl CommodityArtifacts {
    pub const fn of(commodity: Commodity) -> Self {
        match commodity {
            Commodity::Electricity => Self {
                prices: "monthly_electricity_prices.csv",
                averages: "monthly_electricity_averages.csv",
                points: "ez_electricity_prices.json",
            },
            Commodity::Gas => Self {
                prices: "monthly_gas_prices.csv",
                averages: "monthly_gas_averages.csv",
                points: "ez_gas_prices.json",
            },
        }
    }
}

/// Artifact directory, optionally mirrored into a public directory.
#[must_use]
pub struct Output {
    dir: PathBuf,
    public_dir: Option<PathBuf>,
}

impl Output {
    pub const fn new(dir: PathBuf, public_dir: Option<PathBuf>) -> Self {
        Self { dir, public_dir }
    }

    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write the artifact in full and tell whether its contents changed.
    ///
    /// The change detection never blocks the write.
    #[instrument(skip(self, bytes))]
    pub fn publish(&self, name: &str, bytes: &[u8]) -> Result<bool> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create `{}`", self.dir.display()))?;
        let path = self.path(name);
        let previous = if path.is_file() { Some(md5::compute(fs::read(&path)?)) } else { None };
        let digest = md5::compute(bytes);
        let changed = previous != Some(digest);
        write_atomically(&path, bytes)?;
        if let Some(public_dir) = &self.public_dir {
            fs::create_dir_all(public_dir)
                .with_context(|| format!("failed to create `{}`", public_dir.display()))?;
            write_atomically(&public_dir.join(name), bytes)?;
        }
        info!(changed, digest = format!("{digest:x}"), n_bytes = bytes.len(), "published");
        Ok(changed)
    }

    pub fn append_run_log(&self, entry: &RunLogEntry) -> Result {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(RUN_LOG);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open `{}`", path.display()))?;
        writeln!(file, "{entry}")?;
        Ok(())
    }
}

/// Write to a temporary sibling and rename it over the target.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result {
    let file_name = path
        .file_name()
        .with_context(|| format!("`{}` is not a file path", path.display()))?;
    let temporary = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));
    fs::write(&temporary, bytes)
        .with_context(|| format!("failed to write `{}`", temporary.display()))?;
    fs::rename(&temporary, path)
        .with_context(|| format!("failed to replace `{}`", path.display()))?;
    Ok(())
}

pub struct RunLogEntry {
    pub timestamp: DateTime<Utc>,
    pub n_rows: usize,
    pub changed: bool,
}

impl Display for RunLogEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows={} changed={}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.n_rows,
            self.changed,
        )
    }
}
