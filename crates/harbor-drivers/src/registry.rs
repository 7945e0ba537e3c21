//! Host driver registries
//!
//! Report which client drivers are installed, for driver resolution.

use std::path::{Path, PathBuf};

use harbor_core::{DriverRegistry, HarborError, Result};

/// Location of the unixODBC driver registry when no environment override is set
pub const DEFAULT_ODBCINST_PATH: &str = "/etc/odbcinst.ini";

const ODBCINST_FILE_NAME: &str = "odbcinst.ini";

/// Sections of `odbcinst.ini` that configure unixODBC itself
const RESERVED_SECTIONS: &[&str] = &["ODBC", "ODBC Drivers"];

/// Driver registry backed by the unixODBC `odbcinst.ini` file.
///
/// Every section header names one installed driver:
///
/// ```ini
/// [ODBC Driver 17 for SQL Server]
/// Description=Microsoft ODBC Driver 17 for SQL Server
/// Driver=/opt/microsoft/msodbcsql17/lib64/libmsodbcsql-17.10.so.1.1
/// ```
#[derive(Debug, Clone)]
pub struct OdbcInstRegistry {
    path: PathBuf,
}

impl OdbcInstRegistry {
    /// Registry at the location unixODBC would use: `$ODBCSYSINI/$ODBCINSTINI`
    /// when `ODBCSYSINI` is set, [`DEFAULT_ODBCINST_PATH`] otherwise
    pub fn new() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Like [`new`](Self::new), reading variables through `lookup`
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = match lookup("ODBCSYSINI").filter(|dir| !dir.trim().is_empty()) {
            Some(dir) => {
                let file = lookup("ODBCINSTINI")
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| ODBCINST_FILE_NAME.to_string());
                Path::new(&dir).join(file)
            }
            None => PathBuf::from(DEFAULT_ODBCINST_PATH),
        };
        Self { path }
    }

    /// Registry reading a specific file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for OdbcInstRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverRegistry for OdbcInstRegistry {
    fn list_available_drivers(&self) -> Result<Vec<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "driver registry file not found");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(HarborError::Driver(format!(
                    "cannot read driver registry {}: {e}",
                    self.path.display()
                )));
            }
        };

        let drivers = parse_sections(&content);
        tracing::debug!(path = %self.path.display(), count = drivers.len(), "read driver registry");
        Ok(drivers)
    }
}

/// Section names of an INI document, minus the reserved ones, in file order
fn parse_sections(content: &str) -> Vec<String> {
    let mut drivers: Vec<String> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) else {
            continue;
        };

        let name = name.trim();
        if name.is_empty()
            || RESERVED_SECTIONS.iter().any(|r| r.eq_ignore_ascii_case(name))
            || drivers.iter().any(|d| d == name)
        {
            continue;
        }
        drivers.push(name.to_string());
    }

    drivers
}

/// Driver registry returning a fixed list.
///
/// Useful when the installed drivers are known up front, or for hosts
/// without a unixODBC registry.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    drivers: Vec<String>,
}

impl StaticRegistry {
    pub fn new<I, S>(drivers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            drivers: drivers.into_iter().map(Into::into).collect(),
        }
    }
}

impl DriverRegistry for StaticRegistry {
    fn list_available_drivers(&self) -> Result<Vec<String>> {
        Ok(self.drivers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_skips_reserved_and_comments() {
        let content = "\
; installed drivers
[ODBC]
Trace=No

[ODBC Drivers]
ODBC Driver 17 for SQL Server=Installed

[ODBC Driver 17 for SQL Server]
Driver=/opt/microsoft/msodbcsql17/lib64/libmsodbcsql-17.so

# disabled
[ FreeTDS ]
Driver=/usr/lib/libtdsodbc.so
";
        assert_eq!(
            parse_sections(content),
            vec!["ODBC Driver 17 for SQL Server", "FreeTDS"]
        );
    }

    #[test]
    fn test_parse_sections_ignores_duplicates_and_junk() {
        let content = "[A]\n[]\nnot a section\n[A]\n[B\n[C]";
        assert_eq!(parse_sections(content), vec!["A", "C"]);
    }

    #[test]
    fn test_path_from_env() {
        let registry = OdbcInstRegistry::from_env_with(|key| match key {
            "ODBCSYSINI" => Some("/opt/odbc".to_string()),
            "ODBCINSTINI" => Some("drivers.ini".to_string()),
            _ => None,
        });
        assert_eq!(registry.path(), Path::new("/opt/odbc/drivers.ini"));

        let registry = OdbcInstRegistry::from_env_with(|key| {
            (key == "ODBCSYSINI").then(|| "/opt/odbc".to_string())
        });
        assert_eq!(registry.path(), Path::new("/opt/odbc/odbcinst.ini"));

        let registry = OdbcInstRegistry::from_env_with(|_| None);
        assert_eq!(registry.path(), Path::new(DEFAULT_ODBCINST_PATH));
    }

    #[test]
    fn test_static_registry() {
        let registry = StaticRegistry::new(["ODBC Driver 18 for SQL Server"]);
        assert_eq!(
            registry.list_available_drivers().unwrap(),
            vec!["ODBC Driver 18 for SQL Server"]
        );
        assert!(StaticRegistry::default().list_available_drivers().unwrap().is_empty());
    }
}
