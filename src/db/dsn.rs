//! Data source name parsing.
//!
//! Two spellings are accepted:
//! - URL form, as understood by sqlx: `mysql://user:pw@host:3306/app`,
//!   `postgres://host/app`, `sqlite::memory:`, `sqlite://data/app.db`
//! - Key/value form common in PHP-era configuration: `mysql:host=db;port=3306;dbname=app`,
//!   `pgsql:host=db;dbname=app`, `sqlite:/var/lib/app.db`
//!
//! Both are normalized into a [`Dsn`], which picks the [`Backend`] and renders
//! the connect URL handed to its sqlx driver.

use std::collections::BTreeMap;
use std::fmt;

use url::Url;

use crate::error_handling::DatabaseError;

/// SQL dialect family selected by the DSN scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// MySQL and MariaDB
    MySql,
    /// PostgreSQL
    Postgres,
    /// SQLite (file or in-memory)
    Sqlite,
}

impl Backend {
    /// Maps a DSN scheme to a backend. Scheme matching is case-insensitive.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Backend::MySql),
            "postgres" | "postgresql" | "pgsql" => Some(Backend::Postgres),
            "sqlite" | "sqlite3" => Some(Backend::Sqlite),
            _ => None,
        }
    }

    /// Scheme used in the connect URL given to sqlx.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Backend::MySql => "mysql",
            Backend::Postgres => "postgres",
            Backend::Sqlite => "sqlite",
        }
    }

    /// Short driver name, as listed by `Database::available_drivers`.
    pub fn driver_name(&self) -> &'static str {
        match self {
            Backend::MySql => "mysql",
            Backend::Postgres => "pgsql",
            Backend::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::MySql => "MySQL",
            Backend::Postgres => "PostgreSQL",
            Backend::Sqlite => "SQLite",
        };
        f.write_str(name)
    }
}

/// Parsed data source name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    backend: Backend,
    host: Option<String>,
    port: Option<u16>,
    /// Database name, or the file path / `:memory:` for SQLite
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    params: BTreeMap<String, String>,
}

impl Dsn {
    /// Parses either DSN spelling.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidDsn` for an empty string, an unknown scheme,
    /// a malformed URL or a SQLite DSN without a path.
    pub fn parse(raw: &str) -> Result<Self, DatabaseError> {
        let raw = raw.trim();
        let (scheme, rest) = raw
            .split_once(':')
            .ok_or_else(|| DatabaseError::InvalidDsn(format!("missing scheme in '{raw}'")))?;
        let backend = Backend::from_scheme(scheme)
            .ok_or_else(|| DatabaseError::InvalidDsn(format!("unsupported scheme '{scheme}'")))?;

        match backend {
            Backend::Sqlite => Self::parse_sqlite(rest),
            _ if rest.starts_with("//") => Self::parse_url(backend, raw),
            _ => Ok(Self::parse_key_value(backend, rest)),
        }
    }

    fn empty(backend: Backend) -> Self {
        Self {
            backend,
            host: None,
            port: None,
            database: None,
            username: None,
            password: None,
            params: BTreeMap::new(),
        }
    }

    fn parse_sqlite(rest: &str) -> Result<Self, DatabaseError> {
        let rest = rest.strip_prefix("//").unwrap_or(rest);
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        if path.is_empty() {
            return Err(DatabaseError::InvalidDsn(
                "SQLite DSN needs a file path or :memory:".to_string(),
            ));
        }

        let mut dsn = Self::empty(Backend::Sqlite);
        dsn.database = Some(path.to_string());
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                dsn.params.insert(key.to_string(), value.to_string());
            }
        }
        Ok(dsn)
    }

    fn parse_url(backend: Backend, raw: &str) -> Result<Self, DatabaseError> {
        let url = Url::parse(raw)
            .map_err(|e| DatabaseError::InvalidDsn(format!("malformed URL '{raw}': {e}")))?;

        let mut dsn = Self::empty(backend);
        dsn.host = url.host_str().map(str::to_string);
        dsn.port = url.port();
        dsn.database = Some(url.path().trim_start_matches('/').to_string()).filter(|d| !d.is_empty());
        dsn.username = Some(url.username().to_string()).filter(|u| !u.is_empty());
        dsn.password = url.password().map(str::to_string);
        dsn.params = url.query_pairs().into_owned().collect();
        Ok(dsn)
    }

    fn parse_key_value(backend: Backend, rest: &str) -> Self {
        let mut dsn = Self::empty(backend);
        for pair in rest.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "host" => dsn.host = Some(value.to_string()),
                "port" => match value.parse() {
                    Ok(port) => dsn.port = Some(port),
                    Err(_) => log::warn!("Ignoring non-numeric port '{value}' in DSN"),
                },
                "dbname" => dsn.database = Some(value.to_string()),
                "user" => dsn.username = Some(value.to_string()),
                "password" => dsn.password = Some(value.to_string()),
                other => {
                    dsn.params.insert(other.to_string(), value.to_string());
                }
            }
        }
        dsn
    }

    /// Backend selected by the scheme.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Server host, if the DSN names one.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Server port, if the DSN names one.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Database name (or SQLite path).
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// User embedded in the DSN itself.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Password embedded in the DSN itself.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Extra parameters carried by the DSN (query string or unknown keys).
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Renders the URL handed to the driver's `connect`.
    ///
    /// Explicit credentials win over credentials embedded in the DSN; driver
    /// options are appended as query parameters and override DSN parameters
    /// with the same name.
    pub fn connect_url(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        driver_options: &BTreeMap<String, String>,
    ) -> Result<String, DatabaseError> {
        let mut params = self.params.clone();
        params.extend(driver_options.iter().map(|(k, v)| (k.clone(), v.clone())));

        if self.backend == Backend::Sqlite {
            // sqlite URLs are opaque paths, credentials do not apply
            let path = self.database.as_deref().unwrap_or(":memory:");
            let mut url = format!("sqlite:{path}");
            if !params.is_empty() {
                let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                url.push('?');
                url.push_str(&query.join("&"));
            }
            return Ok(url);
        }

        let host = self.host.as_deref().unwrap_or("localhost");
        let mut url = Url::parse(&format!("{}://{}", self.backend.url_scheme(), host))
            .map_err(|e| DatabaseError::InvalidDsn(format!("invalid host '{host}': {e}")))?;
        let invalid = |what: &str| DatabaseError::InvalidDsn(format!("cannot set {what} on DSN"));

        url.set_port(self.port).map_err(|_| invalid("port"))?;
        if let Some(database) = &self.database {
            url.set_path(database);
        }
        if let Some(user) = username.filter(|u| !u.is_empty()).or(self.username.as_deref()) {
            url.set_username(user).map_err(|_| invalid("username"))?;
        }
        if let Some(pass) = password.filter(|p| !p.is_empty()).or(self.password.as_deref()) {
            url.set_password(Some(pass)).map_err(|_| invalid("password"))?;
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url.to_string())
    }
}
