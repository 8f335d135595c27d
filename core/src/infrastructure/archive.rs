// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Filesystem collaborator: archive naming, lookup, hashing and placement.
//!
//! Archive files live under a project-scoped directory as
//! `<physicalVolumeName>_<timestamp>.<ext>`. The data-mover writes a staging
//! file which is then moved into its final name (rename, falling back to
//! copy+remove across filesystems).

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Recognized archive extensions, in probe order.
pub const ARCHIVE_EXTENSIONS: [&str; 3] = ["tar.gz", "tar.zst", "tar"];

/// Timestamp component of archive filenames.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Normalize a compression format name to an archive extension.
pub fn archive_extension(format: &str) -> &'static str {
    match format {
        "tar.zst" => "tar.zst",
        "tar" => "tar",
        _ => "tar.gz",
    }
}

/// Generate an archive filename for a physical volume name.
///
/// The physical name (never the service alias) keys the file, so two
/// services sharing one volume cannot produce colliding artifacts.
pub fn backup_filename(volume_name: &str, format: &str) -> String {
    let timestamp = Utc::now().format(TIMESTAMP_FORMAT);
    format!("{}_{}.{}", volume_name, timestamp, archive_extension(format))
}

/// Name of the staging file the data-mover writes inside its bind mount.
pub fn staging_filename(format: &str) -> String {
    format!("data.{}", archive_extension(format))
}

pub fn ensure_directory(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

/// Move a file, falling back to copy+remove when rename crosses a
/// filesystem boundary.
pub fn move_or_copy(src: &Path, dst: &Path) -> std::io::Result<()> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    fs::copy(src, dst)?;
    fs::remove_file(src)
}

/// Streamed SHA-256 of a file, hex-encoded.
pub fn file_checksum(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn file_size(path: &Path) -> std::io::Result<i64> {
    Ok(fs::metadata(path)?.len() as i64)
}

fn is_archive_for(file_name: &str, prefix: &str) -> bool {
    file_name.starts_with(prefix)
        && file_name.len() > prefix.len()
        && file_name[prefix.len()..].starts_with('_')
        && ARCHIVE_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext))
}

/// All archive files in `dir` matching any of the candidate name prefixes.
pub fn list_backup_files(dir: &Path, names: &[String]) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if names.iter().any(|name| is_archive_for(file_name, name)) {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// The newest archive (by modification time) matching any candidate prefix.
pub fn find_latest_backup(dir: &Path, names: &[String]) -> Option<PathBuf> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for path in list_backup_files(dir, names) {
        let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) else {
            continue;
        };
        match &latest {
            Some((best, _)) if *best >= modified => {}
            _ => latest = Some((modified, path)),
        }
    }
    latest.map(|(_, path)| path)
}

/// Recover the volume name encoded in an archive filename.
///
/// `p_data_2026-08-05_143000.tar.gz` → `p_data`: the two trailing
/// underscore-separated segments are the timestamp.
pub fn volume_name_from_filename(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let mut stem = file_name;
    for ext in ARCHIVE_EXTENSIONS {
        if let Some(s) = stem.strip_suffix(ext) {
            stem = s.trim_end_matches('.');
            break;
        }
    }
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 3 {
        return None;
    }
    let name = parts[..parts.len() - 2].join("_");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Tar invocation that archives `/source` into the staging file.
pub fn tar_create_command(format: &str) -> Vec<String> {
    let flags = match archive_extension(format) {
        "tar.gz" => "czf",
        "tar.zst" => "caf",
        _ => "cf",
    };
    vec![
        "tar".to_string(),
        flags.to_string(),
        format!("/backup/{}", staging_filename(format)),
        "-C".to_string(),
        "/source".to_string(),
        ".".to_string(),
    ]
}

/// Tar invocation that extracts an archive into `/target`. Compression is
/// chosen from the file extension.
pub fn tar_extract_command(backup_file_name: &str) -> Vec<String> {
    let flags = if backup_file_name.ends_with(".tar.gz") || backup_file_name.ends_with(".tgz") {
        "xzf"
    } else {
        // Plain tar, and zstd via tar's auto-detection.
        "xf"
    };
    vec![
        "tar".to_string(),
        flags.to_string(),
        format!("/backup/{}", backup_file_name),
        "-C".to_string(),
        "/target".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_backup_filename_shape() {
        let name = backup_filename("p_data", "tar.gz");
        assert!(name.starts_with("p_data_"));
        assert!(name.ends_with(".tar.gz"));
        assert_eq!(volume_name_from_filename(Path::new(&name)).as_deref(), Some("p_data"));
    }

    #[test]
    fn test_volume_name_from_filename_with_underscores() {
        let path = Path::new("my_long_volume_2026-08-05_143000.tar.gz");
        assert_eq!(
            volume_name_from_filename(path).as_deref(),
            Some("my_long_volume")
        );
    }

    #[test]
    fn test_volume_name_from_filename_rejects_short_names() {
        assert_eq!(volume_name_from_filename(Path::new("data.tar.gz")), None);
    }

    #[test]
    fn test_checksum_is_hex_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.bin");
        File::create(&path).unwrap().write_all(b"payload").unwrap();

        let checksum = file_checksum(&path).unwrap();
        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_list_and_find_latest() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("p_data_2026-01-01_000000.tar.gz");
        let new = dir.path().join("p_data_2026-02-01_000000.tar.gz");
        let other = dir.path().join("q_data_2026-03-01_000000.tar.gz");
        for p in [&old, &new, &other] {
            File::create(p).unwrap().write_all(b"x").unwrap();
        }
        // Ensure distinct mtimes regardless of filesystem resolution.
        let past = SystemTime::now() - std::time::Duration::from_secs(3600);
        let f = File::options().write(true).open(&old).unwrap();
        f.set_modified(past).unwrap();

        let names = vec!["p_data".to_string()];
        let listed = list_backup_files(dir.path(), &names);
        assert_eq!(listed.len(), 2);

        let latest = find_latest_backup(dir.path(), &names).unwrap();
        assert_eq!(latest, new);
    }

    #[test]
    fn test_prefix_match_requires_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p_database_2026-01-01_000000.tar.gz");
        File::create(&path).unwrap().write_all(b"x").unwrap();

        // "p_data" must not match "p_database_..."
        let listed = list_backup_files(dir.path(), &["p_data".to_string()]);
        assert!(listed.is_empty());
    }

    #[test]
    fn test_move_or_copy() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.tar.gz");
        let dst = dir.path().join("dst.tar.gz");
        File::create(&src).unwrap().write_all(b"x").unwrap();

        move_or_copy(&src, &dst).unwrap();
        assert!(!src.exists());
        assert!(dst.exists());
    }

    #[test]
    fn test_tar_commands() {
        assert_eq!(
            tar_create_command("tar.gz"),
            vec!["tar", "czf", "/backup/data.tar.gz", "-C", "/source", "."]
        );
        assert_eq!(
            tar_extract_command("p_data_2026-01-01_000000.tar.gz"),
            vec!["tar", "xzf", "/backup/p_data_2026-01-01_000000.tar.gz", "-C", "/target"]
        );
        assert_eq!(tar_extract_command("x.tar.zst")[1], "xf");
    }
}
