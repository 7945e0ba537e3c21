//! Driver discovery against unixODBC registry files

use std::io::Write;

use harbor_connection::DriverResolver;
use harbor_core::{HarborError, SupportedDrivers};
use harbor_drivers::{DriverRegistry, OdbcInstRegistry};
use pretty_assertions::assert_eq;
use tempfile::{NamedTempFile, TempDir};

const MSODBCSQL_INI: &str = "\
[ODBC]
Trace=No

[ODBC Driver 18 for SQL Server]
Description=Microsoft ODBC Driver 18 for SQL Server
Driver=/opt/microsoft/msodbcsql18/lib64/libmsodbcsql-18.3.so.2.1
UsageCount=1

[ODBC Driver 17 for SQL Server]
Description=Microsoft ODBC Driver 17 for SQL Server
Driver=/opt/microsoft/msodbcsql17/lib64/libmsodbcsql-17.10.so.5.1
UsageCount=1
";

fn registry_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_lists_installed_drivers_in_file_order() {
    let file = registry_file(MSODBCSQL_INI);
    let registry = OdbcInstRegistry::with_path(file.path());

    assert_eq!(
        registry.list_available_drivers().unwrap(),
        vec![
            "ODBC Driver 18 for SQL Server".to_string(),
            "ODBC Driver 17 for SQL Server".to_string(),
        ]
    );
}

#[test]
fn test_missing_file_means_no_drivers() {
    let dir = TempDir::new().unwrap();
    let registry = OdbcInstRegistry::with_path(dir.path().join("odbcinst.ini"));

    assert!(registry.list_available_drivers().unwrap().is_empty());
}

#[test]
fn test_unreadable_registry_is_a_driver_error() {
    // a directory cannot be read as a file
    let dir = TempDir::new().unwrap();
    let registry = OdbcInstRegistry::with_path(dir.path());

    assert!(matches!(
        registry.list_available_drivers(),
        Err(HarborError::Driver(_))
    ));
}

#[test]
fn test_env_location() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("odbcinst.ini"), MSODBCSQL_INI).unwrap();
    let sys_ini = dir.path().to_string_lossy().into_owned();

    let registry = OdbcInstRegistry::from_env_with(|key| {
        (key == "ODBCSYSINI").then(|| sys_ini.clone())
    });

    assert_eq!(registry.path(), dir.path().join("odbcinst.ini"));
    assert_eq!(registry.list_available_drivers().unwrap().len(), 2);
}

#[test]
fn test_resolves_preferred_installed_driver() {
    let file = registry_file(MSODBCSQL_INI);
    let registry = OdbcInstRegistry::with_path(file.path());

    // 18 is installed but not supported; 17 is the first supported match
    let supported = SupportedDrivers::default();
    let driver = DriverResolver::new(&supported, &registry).resolve().unwrap();
    assert_eq!(driver.name(), "ODBC Driver 17 for SQL Server");

    let supported = SupportedDrivers::new(["ODBC Driver 18 for SQL Server", "ODBC Driver 17 for SQL Server"]);
    let driver = DriverResolver::new(&supported, &registry).resolve().unwrap();
    assert_eq!(driver.name(), "ODBC Driver 18 for SQL Server");
}

#[test]
fn test_resolution_fails_without_supported_driver() {
    let file = registry_file("[ODBC]\n[FreeTDS]\nDriver=/usr/lib/libtdsodbc.so\n");
    let registry = OdbcInstRegistry::with_path(file.path());

    let supported = SupportedDrivers::default();
    let err = DriverResolver::new(&supported, &registry).resolve().unwrap_err();
    assert!(matches!(err, HarborError::NoDriverFound { .. }));
}
