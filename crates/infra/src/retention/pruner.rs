//! Filesystem retention pruner
//!
//! The scan-then-act sequence is not guarded against other processes
//! modifying the same tree between the two steps.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dsr_core::{classify, RetentionAction};
use dsr_domain::constants::ARCHIVE_EXTENSION;
use dsr_domain::{DsrError, Result, RetentionCandidate, RetentionPolicy};
use flate2::write::GzEncoder;
use flate2::Compression;
use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, info, instrument, warn};

/// Counters for one prune pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub scanned: usize,
    pub kept: usize,
    pub deleted: usize,
    pub archived: usize,
    pub failed: usize,
}

/// Apply `policy` to every file under `root` whose path relative to `root`
/// matches `pattern`.
///
/// Failures on individual files are logged and counted; they do not stop
/// the pass.
///
/// # Errors
/// Returns `DsrError::InvalidRetentionRoot` if `root` is not an existing
/// directory and `DsrError::Config` if `pattern` is not a valid glob.
#[instrument(skip(root, policy, now), fields(root = %root.display()))]
pub fn prune(root: &Path, pattern: &str, policy: &RetentionPolicy, now: DateTime<Utc>) -> Result<PruneStats> {
    if !root.is_dir() {
        return Err(DsrError::InvalidRetentionRoot(root.to_path_buf()));
    }

    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| DsrError::Config(format!("invalid retention pattern '{pattern}': {e}")))?
        .compile_matcher();

    let candidates = scan(root, &matcher, policy.archive);
    let mut stats = PruneStats { scanned: candidates.len(), ..PruneStats::default() };

    let plan = classify(candidates, policy, now);
    stats.kept = plan.keep.len();

    let action = RetentionAction::for_policy(policy);
    for candidate in plan.reject {
        let outcome = match action {
            RetentionAction::Delete => fs::remove_file(&candidate.path).map(|()| stats.deleted += 1),
            RetentionAction::Archive => archive(&candidate.path).map(|_| stats.archived += 1),
        };
        if let Err(err) = outcome {
            stats.failed += 1;
            warn!(path = %candidate.path.display(), error = %err, ?action, "retention action failed");
        } else {
            debug!(path = %candidate.path.display(), ?action, "retention action applied");
        }
    }

    info!(
        pattern,
        max_age = %policy.max_age,
        retain = policy.retain_count,
        scanned = stats.scanned,
        kept = stats.kept,
        deleted = stats.deleted,
        archived = stats.archived,
        failed = stats.failed,
        "retention pass finished"
    );
    Ok(stats)
}

/// Collect matching regular files. Existing archives are skipped when the
/// policy archives, so they are not compressed twice.
fn scan(root: &Path, matcher: &GlobMatcher, archiving: bool) -> Vec<RetentionCandidate> {
    let mut candidates = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "cannot read directory during retention scan");
                continue;
            }
        };

        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            let Ok(metadata) = entry.metadata() else { continue };

            if metadata.is_dir() {
                pending.push(path);
                continue;
            }
            if !metadata.is_file() {
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else { continue };
            if !matcher.is_match(relative) {
                continue;
            }
            if archiving && path.extension().and_then(|e| e.to_str()) == Some(ARCHIVE_EXTENSION) {
                continue;
            }

            match metadata.modified() {
                Ok(modified) => candidates.push(RetentionCandidate::new(path, DateTime::<Utc>::from(modified))),
                Err(err) => warn!(path = %path.display(), error = %err, "cannot read modification time"),
            }
        }
    }

    candidates
}

/// Gzip `path` to `{path}.gz` and remove the original.
fn archive(path: &Path) -> io::Result<PathBuf> {
    let mut target = path.as_os_str().to_owned();
    target.push(".");
    target.push(ARCHIVE_EXTENSION);
    let target = PathBuf::from(target);

    let mut reader = BufReader::new(File::open(path)?);
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(&target)?), Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::time::{Duration, SystemTime};

    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    use super::*;

    const DAY: u64 = 24 * 60 * 60;

    fn touch(root: &Path, relative: &str, age_days: u64, now: SystemTime) -> PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, relative.as_bytes()).unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(now - Duration::from_secs(age_days * DAY)).unwrap();
        path
    }

    fn policy(retain_count: usize, archive: bool) -> RetentionPolicy {
        RetentionPolicy { retain_count, max_age: "7d".parse().unwrap(), archive }
    }

    #[test]
    fn deletes_stale_files_and_keeps_fresh_ones() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        let one = touch(dir.path(), "a.log", 1, now);
        let three = touch(dir.path(), "b.log", 3, now);
        let ten = touch(dir.path(), "c.log", 10, now);
        let forty = touch(dir.path(), "d.log", 40, now);

        let stats = prune(dir.path(), "*.log", &policy(0, false), DateTime::<Utc>::from(now)).unwrap();

        assert_eq!(stats, PruneStats { scanned: 4, kept: 2, deleted: 2, archived: 0, failed: 0 });
        assert!(one.exists() && three.exists());
        assert!(!ten.exists() && !forty.exists());
    }

    #[test]
    fn retain_count_keeps_most_recent_fresh_file() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        let newer = touch(dir.path(), "reports/ABC/01-Jan-2024/x.csv", 1, now);
        let older = touch(dir.path(), "reports/ABC/02-Jan-2024/y.csv", 2, now);

        let stats = prune(dir.path(), "reports/**/**/*", &policy(1, false), DateTime::<Utc>::from(now)).unwrap();

        assert_eq!(stats.kept, 1);
        assert!(newer.exists());
        assert!(!older.exists());
    }

    #[test]
    fn pattern_does_not_cross_directories() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        let nested = touch(dir.path(), "nested/old.log", 30, now);
        let top = touch(dir.path(), "old.log", 30, now);

        prune(dir.path(), "*.log", &policy(0, false), DateTime::<Utc>::from(now)).unwrap();

        assert!(nested.exists());
        assert!(!top.exists());
    }

    #[test]
    fn archives_instead_of_deleting() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        let stale = touch(dir.path(), "old.log", 30, now);

        let stats = prune(dir.path(), "*", &policy(0, true), DateTime::<Utc>::from(now)).unwrap();
        assert_eq!(stats.archived, 1);
        assert!(!stale.exists());

        let archived = dir.path().join("old.log.gz");
        let mut decoded = String::new();
        GzDecoder::new(File::open(&archived).unwrap()).read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, "old.log");

        // a second pass leaves the archive alone
        let again = prune(dir.path(), "*", &policy(0, true), DateTime::<Utc>::from(now)).unwrap();
        assert_eq!(again.scanned, 0);
        assert!(archived.exists());
    }

    #[test]
    fn missing_root_fails_fast() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = prune(&missing, "*.log", &policy(0, false), Utc::now()).unwrap_err();
        assert_eq!(err, DsrError::InvalidRetentionRoot(missing));
    }
}
