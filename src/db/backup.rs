//! Database backups.
//!
//! The facade only selects an engine and hands it the stored credentials; the
//! dump itself is produced by an external tool. [`BackupKind`] is the closed
//! set of supported engines, each implementing [`BackupEngine`].

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use super::facade::Database;
use crate::error_handling::DatabaseError;

/// Supported backup engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum BackupKind {
    /// `mysqldump`
    MySql,
}

impl BackupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupKind::MySql => "MySQL",
        }
    }

    /// Names accepted by `from_str`, for help text and error messages.
    pub fn supported() -> Vec<&'static str> {
        BackupKind::iter().map(|k| k.as_str()).collect()
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackupKind {
    type Err = DatabaseError;

    /// Exact, case-sensitive match on the engine name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackupKind::iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DatabaseError::InvalidBackupKind(s.to_string()))
    }
}

/// Output format of a backup file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupFormat {
    /// Plain SQL text
    Sql,
    /// Gzip-compressed SQL text
    Gzip,
}

impl BackupFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            BackupFormat::Sql => "sql",
            BackupFormat::Gzip => "sql.gz",
        }
    }
}

impl FromStr for BackupFormat {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" => Ok(BackupFormat::Sql),
            "gz" | "gzip" | "sql.gz" => Ok(BackupFormat::Gzip),
            _ => Err(DatabaseError::InvalidBackupFormat(s.to_string())),
        }
    }
}

/// Everything an engine needs to dump one database.
#[derive(Clone, PartialEq, Eq)]
pub struct BackupTarget {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: String,
    /// Directory the backup file is written to
    pub path: PathBuf,
    pub format: String,
}

impl fmt::Debug for BackupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("path", &self.path)
            .field("format", &self.format)
            .finish()
    }
}

/// A backup implementation, constructed with a [`BackupTarget`].
#[async_trait]
pub trait BackupEngine: Send + Sync {
    /// Performs the dump and returns the path of the written file.
    async fn backup(&self) -> Result<PathBuf, DatabaseError>;
}

/// Dumps a MySQL database with the `mysqldump` client.
///
/// The password is passed through `MYSQL_PWD` so it does not show up in the
/// process list.
#[derive(Debug, Clone)]
pub struct MySqlDump {
    target: BackupTarget,
    binary: String,
}

impl MySqlDump {
    pub fn new(target: BackupTarget) -> Self {
        Self {
            target,
            binary: crate::config::DEFAULT_MYSQLDUMP_BIN.to_string(),
        }
    }

    /// Uses `binary` instead of `mysqldump` from `PATH`.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn target(&self) -> &BackupTarget {
        &self.target
    }

    /// Command-line arguments passed to the dump tool.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = vec![format!("--host={}", self.target.host)];
        if let Some(port) = self.target.port {
            args.push(format!("--port={port}"));
        }
        if let Some(user) = &self.target.username {
            args.push(format!("--user={user}"));
        }
        args.extend(
            ["--single-transaction", "--routines", "--triggers"]
                .iter()
                .map(|a| a.to_string()),
        );
        args.push(self.target.database.clone());
        args
    }

    /// File the dump is written to, timestamped so runs don't overwrite each other.
    pub fn output_file(&self, format: BackupFormat) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        self.target.path.join(format!(
            "{}_{}.{}",
            self.target.database,
            stamp,
            format.extension()
        ))
    }
}

#[async_trait]
impl BackupEngine for MySqlDump {
    async fn backup(&self) -> Result<PathBuf, DatabaseError> {
        let format: BackupFormat = self.target.format.parse()?;

        let mut command = tokio::process::Command::new(&self.binary);
        command.args(self.arguments());
        if let Some(password) = &self.target.password {
            command.env("MYSQL_PWD", password);
        }
        debug!("Running {} {:?}", self.binary, self.arguments());
        let output = command.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DatabaseError::Backup(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        tokio::fs::create_dir_all(&self.target.path).await?;
        let file = self.output_file(format);
        write_dump(&file, &output.stdout, format).await?;
        info!(
            "Backup of {} written to {} ({} bytes of SQL)",
            self.target.database,
            file.display(),
            output.stdout.len()
        );
        Ok(file)
    }
}

/// Writes `dump` to `file`, compressing it when the format asks for it.
pub async fn write_dump(file: &Path, dump: &[u8], format: BackupFormat) -> Result<(), DatabaseError> {
    let bytes = match format {
        BackupFormat::Sql => dump.to_vec(),
        BackupFormat::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(dump)?;
            encoder.finish()?
        }
    };
    tokio::fs::write(file, bytes).await?;
    Ok(())
}

impl Database {
    /// Backs up the configured database with the engine named by `kind`.
    ///
    /// `kind` is checked before anything touches the filesystem; an unknown
    /// engine fails with `DatabaseError::InvalidBackupKind`.
    pub async fn backup(
        &mut self,
        kind: &str,
        path: impl Into<PathBuf>,
        format: &str,
    ) -> Result<PathBuf, DatabaseError> {
        let kind = kind.parse::<BackupKind>().inspect_err(|_| {
            log::warn!(
                "Unsupported backup kind requested (supported: {})",
                BackupKind::supported().join(", ")
            );
        })?;
        let binary = self.dump_binary.clone();
        self.backup_with(path, format, |target| match kind {
            BackupKind::MySql => MySqlDump::new(target).with_binary(binary),
        })
        .await
    }

    /// Backs up the configured database with an engine built by `build`.
    ///
    /// The engine is constructed once from the stored credentials and run once.
    pub async fn backup_with<E, F>(
        &mut self,
        path: impl Into<PathBuf>,
        format: &str,
        build: F,
    ) -> Result<PathBuf, DatabaseError>
    where
        E: BackupEngine,
        F: FnOnce(BackupTarget) -> E,
    {
        let path = path.into();
        self.backup_path = Some(path.clone());
        self.backup_format = Some(format.to_string());

        let target = self.backup_target(path, format)?;
        info!("Backing up {} on {}", target.database, target.host);
        let engine = build(target);
        engine.backup().await
    }

    /// Credentials and location for a backup, from the stored settings.
    fn backup_target(&self, path: PathBuf, format: &str) -> Result<BackupTarget, DatabaseError> {
        let settings = self.settings();
        let dsn = match self.dsn() {
            Some(dsn) => dsn.clone(),
            None => {
                let raw = settings.dsn.as_deref().ok_or(DatabaseError::MissingDsn)?;
                super::dsn::Dsn::parse(raw)?
            }
        };
        let database = dsn
            .database()
            .ok_or_else(|| DatabaseError::InvalidDsn("DSN names no database".to_string()))?
            .to_string();

        Ok(BackupTarget {
            host: dsn.host().unwrap_or("localhost").to_string(),
            port: dsn.port(),
            username: settings
                .username
                .clone()
                .or_else(|| dsn.username().map(str::to_string)),
            password: settings
                .password
                .clone()
                .or_else(|| dsn.password().map(str::to_string)),
            database,
            path,
            format: format.to_string(),
        })
    }

    /// Directory used by the most recent backup.
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// Format requested by the most recent backup.
    pub fn backup_format(&self) -> Option<&str> {
        self.backup_format.as_deref()
    }
}
