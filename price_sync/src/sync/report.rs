use std::fmt;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::{
    metadata::MergeError,
    resolve::{ResolutionFailure, ResolutionReason},
};

/// A record that resolved to a canonical identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    /// Record id.
    pub id: i64,
    /// Record project key.
    pub project_key: String,
    /// Token symbol as stored on the record.
    pub symbol: Option<String>,
    /// Chosen identifier.
    pub coin_id: String,
    /// Step of the resolution chain that chose it.
    pub reason: ResolutionReason,
}

/// A record no identifier could be chosen for.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedRecord {
    /// Record id.
    pub id: i64,
    /// Record project key.
    pub project_key: String,
    /// Token symbol as stored on the record.
    pub symbol: Option<String>,
    /// Why resolution failed.
    pub reason: ResolutionFailure,
}

/// A resolved record that got (or, in a dry run, would get) a new price.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedRecord {
    /// The resolution behind the update.
    pub record: ResolvedRecord,
    /// Price written.
    pub usd: Decimal,
    /// Full merged metadata.
    pub metadata: Map<String, Value>,
}

/// Why a resolved record was not updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The provider returned no USD price for the identifier.
    NoUsdPrice,
    /// The stored metadata could not be merged.
    Merge(MergeError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoUsdPrice => f.write_str("no USD price"),
            Self::Merge(e) => write!(f, "{e}"),
        }
    }
}

/// A resolved record left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// The resolution behind the attempt.
    pub record: ResolvedRecord,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Outcome of one sync run.
///
/// `resolved` and `unresolved` partition the candidate records; `updated` and
/// `skipped` partition `resolved` once prices are known (both stay empty when
/// nothing resolved).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Whether this was a simulation.
    pub dry_run: bool,
    /// Records with an identifier.
    pub resolved: Vec<ResolvedRecord>,
    /// Records without one.
    pub unresolved: Vec<UnresolvedRecord>,
    /// Records priced and merged.
    pub updated: Vec<UpdatedRecord>,
    /// Resolved records that were not updated.
    pub skipped: Vec<SkippedRecord>,
    /// Rows the store reported as written (always 0 in a dry run).
    pub written: usize,
}

impl SyncReport {
    /// Empty report for a run.
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// True if the run touched no record at all.
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty() && self.unresolved.is_empty()
    }
}

fn symbol(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or("-")
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // helper: section header with underline
        let mut section = |title: String,
                           body: &mut dyn FnMut(&mut fmt::Formatter<'_>) -> fmt::Result|
         -> fmt::Result {
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(title.chars().count()))?;
            body(f)?;
            writeln!(f)
        };

        if !self.unresolved.is_empty() {
            section(format!("Unresolved ({})", self.unresolved.len()), &mut |f| {
                for r in &self.unresolved {
                    writeln!(
                        f,
                        "- id={} key={} symbol={} ({})",
                        r.id,
                        r.project_key,
                        symbol(&r.symbol),
                        r.reason
                    )?;
                }
                Ok(())
            })?;
        }

        if !self.updated.is_empty() {
            let title = if self.dry_run { "Would update" } else { "Updated" };
            section(format!("{title} ({})", self.updated.len()), &mut |f| {
                for u in &self.updated {
                    let r = &u.record;
                    writeln!(
                        f,
                        "+ id={} key={} symbol={} coin_id={} source={} usd={}",
                        r.id,
                        r.project_key,
                        symbol(&r.symbol),
                        r.coin_id,
                        r.reason,
                        u.usd
                    )?;
                }
                Ok(())
            })?;
        }

        if !self.skipped.is_empty() {
            section(format!("Skipped ({})", self.skipped.len()), &mut |f| {
                for s in &self.skipped {
                    writeln!(
                        f,
                        "~ id={} key={} coin_id={} ({})",
                        s.record.id, s.record.project_key, s.record.coin_id, s.reason
                    )?;
                }
                Ok(())
            })?;
        }

        let counts = format!(
            "resolved {}, unresolved {}, {} {}, skipped {}",
            self.resolved.len(),
            self.unresolved.len(),
            if self.dry_run { "would update" } else { "updated" },
            self.updated.len(),
            self.skipped.len(),
        );
        if self.dry_run {
            write!(f, "Dry-run complete: {counts}.")
        } else {
            write!(f, "Done: {counts}.")
        }
    }
}
