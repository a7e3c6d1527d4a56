//! Size-rotated file sink
//!
//! The active file is rotated to a timestamped backup next to it when a write
//! would push it past the size limit. Backups are then pruned by count and
//! age and optionally gzip-compressed.

use crate::core::error::{LoggerError, Result};
use crate::core::{LevelSet, Sink};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const MEGABYTE: u64 = 1024 * 1024;

/// Default size limit in megabytes
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESS_SUFFIX: &str = ".gz";

/// Rotation policy for [`FileSink`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Size limit of the active file in megabytes; 0 means 100
    pub max_size_mb: u64,

    /// Remove backups older than this many days (24h each); 0 keeps them
    pub max_age_days: u64,

    /// Keep at most this many backups; 0 keeps all
    pub max_backups: usize,

    /// Use local time instead of UTC in backup names
    pub local_time: bool,

    /// Gzip backups after rotation
    pub compress: bool,
}

impl FileConfig {
    pub fn max_size_bytes(&self) -> u64 {
        let mb = if self.max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            self.max_size_mb
        };
        mb.saturating_mul(MEGABYTE)
    }
}

/// Append-only file that rotates itself by size.
///
/// Not synchronized; [`FileSink`] wraps it in a mutex.
#[derive(Debug)]
struct RotatingFile {
    path: PathBuf,
    config: FileConfig,
    max_bytes: u64,
    file: Option<File>,
    size: u64,
}

impl RotatingFile {
    /// Open `path` for appending, creating it and its parent directories.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or the file cannot be opened.
    fn open(path: impl AsRef<Path>, config: FileConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_log_dir(parent)?;
        }

        let max_bytes = config.max_size_bytes();
        let mut rotating = Self {
            path,
            config,
            max_bytes,
            file: None,
            size: 0,
        };
        rotating.open_existing()?;
        Ok(rotating)
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the active file
    #[cfg(test)]
    fn size(&self) -> u64 {
        self.size
    }

    /// Write one record, rotating first if it would not fit.
    ///
    /// # Errors
    ///
    /// A record larger than the size limit is rejected. I/O failures of the
    /// write or the rotation are returned; pruning and compression problems
    /// are only reported on stderr.
    fn write_record(&mut self, record: &[u8]) -> Result<usize> {
        let len = record.len() as u64;
        if len > self.max_bytes {
            return Err(LoggerError::file_sink(
                self.path.display().to_string(),
                format!(
                    "write length {} exceeds maximum file size {}",
                    len, self.max_bytes
                ),
            ));
        }

        if self.file.is_none() {
            self.open_existing()?;
        }
        if self.size + len > self.max_bytes {
            self.rotate()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| LoggerError::writer("log file is not open"))?;
        file.write_all(record).map_err(|e| {
            LoggerError::file_sink(
                self.path.display().to_string(),
                format!("Failed to write record: {}", e),
            )
        })?;
        self.size += len;
        Ok(record.len())
    }

    /// Flush and release the file handle; the next write reopens it
    fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        Ok(())
    }

    /// Move the active file to a backup and start a new one
    fn rotate(&mut self) -> Result<()> {
        self.close()?;

        if self.path.exists() {
            let backup = self.next_backup_path();
            fs::rename(&self.path, &backup).map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Cannot rename to '{}': {}", backup.display(), e),
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Cannot open new log file: {}", e),
                )
            })?;
        self.file = Some(file);
        self.size = 0;

        self.mill();
        Ok(())
    }

    fn open_existing(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;
        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();
        self.file = Some(file);
        self.size = size;
        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn format_backup_time(&self, at: DateTime<Utc>) -> String {
        if self.config.local_time {
            at.with_timezone(&Local).format(BACKUP_TIME_FORMAT).to_string()
        } else {
            at.format(BACKUP_TIME_FORMAT).to_string()
        }
    }

    fn name_parts(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (stem, ext)
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// `<stem>-<time><ext>`, always newer than the newest existing backup
    fn next_backup_path(&self) -> PathBuf {
        let (stem, ext) = self.name_parts();
        let dir = self.dir();
        let mut at = self.now();
        if let Some(latest) = self.latest_backup_time() {
            if latest >= at {
                at = latest + chrono::Duration::milliseconds(1);
            }
        }
        loop {
            let name = format!("{}-{}{}", stem, self.format_backup_time(at), ext);
            let candidate = dir.join(&name);
            let compressed = dir.join(format!("{}{}", name, COMPRESS_SUFFIX));
            if !candidate.exists() && !compressed.exists() {
                return candidate;
            }
            at += chrono::Duration::milliseconds(1);
        }
    }

    fn latest_backup_time(&self) -> Option<DateTime<Utc>> {
        let backups = self.backups().ok()?;
        let name = backups.first()?.file_name()?.to_string_lossy().into_owned();
        self.backup_time(&name)
    }

    fn backup_time(&self, file_name: &str) -> Option<DateTime<Utc>> {
        let (stem, ext) = self.name_parts();
        let rest = file_name.strip_prefix(&format!("{}-", stem))?;
        let rest = rest.strip_suffix(COMPRESS_SUFFIX).unwrap_or(rest);
        let stamp = rest.strip_suffix(ext.as_str())?;
        let naive = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok()?;
        if self.config.local_time {
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc))
        } else {
            Some(Utc.from_utc_datetime(&naive))
        }
    }

    /// Backups next to the active file, newest first
    fn backups(&self) -> Result<Vec<PathBuf>> {
        let mut found: Vec<(DateTime<Utc>, PathBuf)> = Vec::new();
        for entry in fs::read_dir(self.dir())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(at) = self.backup_time(&name) {
                found.push((at, entry.path()));
            }
        }
        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    /// Prune and compress backups. Problems are reported, never returned.
    fn mill(&self) {
        let backups = match self.backups() {
            Ok(backups) => backups,
            Err(e) => {
                eprintln!("[LOGGER WARNING] Cannot list log backups: {}", e);
                return;
            }
        };

        let cutoff = if self.config.max_age_days > 0 {
            i64::try_from(self.config.max_age_days)
                .ok()
                .and_then(chrono::Duration::try_days)
                .and_then(|age| self.now().checked_sub_signed(age))
        } else {
            None
        };

        let mut kept = Vec::new();
        for (idx, path) in backups.into_iter().enumerate() {
            let too_many = self.config.max_backups > 0 && idx >= self.config.max_backups;
            let too_old = match (cutoff, path.file_name()) {
                (Some(cutoff), Some(name)) => self
                    .backup_time(&name.to_string_lossy())
                    .is_some_and(|at| at < cutoff),
                _ => false,
            };

            if too_many || too_old {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!(
                        "[LOGGER WARNING] Cannot remove old log file '{}': {}",
                        path.display(),
                        e
                    );
                }
            } else {
                kept.push(path);
            }
        }

        if !self.config.compress {
            return;
        }
        for path in kept {
            if path.to_string_lossy().ends_with(COMPRESS_SUFFIX) {
                continue;
            }
            if let Err(e) = compress_file(&path) {
                eprintln!("[LOGGER WARNING] {}", e);
            }
        }
    }
}

/// Gzip `path` to `<path>.gz`, removing the source only after success
fn compress_file(path: &Path) -> Result<()> {
    let mut gz_name = path.as_os_str().to_os_string();
    gz_name.push(COMPRESS_SUFFIX);
    let gz_path = PathBuf::from(gz_name);
    let mut tmp_name = gz_path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let compress = || -> io::Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&tmp_path)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&tmp_path, &gz_path)
    };

    if let Err(e) = compress() {
        let _ = fs::remove_file(&tmp_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", path.display()),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed '{}' but cannot remove the original: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

fn create_log_dir(dir: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o744);
    }
    builder.create(dir).map_err(|e| {
        LoggerError::io_operation(
            "create log directory",
            format!("Failed to create directory '{}'", dir.display()),
            e,
        )
    })
}

/// Sink writing records to a size-rotated file
pub struct FileSink {
    file: Mutex<RotatingFile>,
    levels: LevelSet,
}

impl FileSink {
    /// Create the sink, creating the parent directory with mode `0744`.
    ///
    /// # Errors
    ///
    /// Fails if the directory or the file cannot be created.
    pub fn new(path: impl AsRef<Path>, config: FileConfig, levels: LevelSet) -> Result<Self> {
        Ok(Self {
            file: Mutex::new(RotatingFile::open(path, config)?),
            levels,
        })
    }

    /// Override the size limit with an exact byte count
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.file.get_mut().max_bytes = max_bytes.max(1);
        self
    }

    pub fn path(&self) -> PathBuf {
        self.file.lock().path().to_path_buf()
    }

    /// Rotate now, regardless of size
    pub fn rotate(&self) -> Result<()> {
        self.file.lock().rotate()
    }

    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        self.file.lock().backups()
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn levels(&self) -> &LevelSet {
        &self.levels
    }

    fn write(&self, record: &[u8]) -> Result<usize> {
        self.file.lock().write_record(record)
    }

    fn close(&self) -> Result<()> {
        self.file.lock().close()
    }
}
