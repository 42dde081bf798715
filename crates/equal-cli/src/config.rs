use std::{env, fmt, path::PathBuf, str::FromStr};

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Sqlite,
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageKind::Sqlite),
            "memory" => Ok(StorageKind::Memory),
            other => Err(format!("unknown storage '{other}', expected sqlite or memory")),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Sqlite => f.write_str("sqlite"),
            StorageKind::Memory => f.write_str("memory"),
        }
    }
}

pub struct Config {
    pub db_path: PathBuf,
    pub storage: StorageKind,
}

impl Config {
    pub fn load() -> Self {
        Self {
            db_path: try_load("EQUAL_DB_PATH", PathBuf::from("equal-democracy.db")),
            storage: try_load("EQUAL_STORAGE", StorageKind::Sqlite),
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + fmt::Debug,
    T::Err: fmt::Display,
{
    let Ok(raw) = env::var(key) else {
        info!("{key} not set, using default: {default:?}");
        return default;
    };

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value '{raw}': {e}, using default: {default:?}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_kind_parses_loosely() {
        assert_eq!(" SQLite ".parse::<StorageKind>(), Ok(StorageKind::Sqlite));
        assert_eq!("memory".parse::<StorageKind>(), Ok(StorageKind::Memory));
        assert!("redis".parse::<StorageKind>().is_err());
    }
}
