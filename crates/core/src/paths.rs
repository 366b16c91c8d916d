use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".reviewlens"))
            .unwrap_or_else(|| PathBuf::from(".reviewlens"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    /// The identity roster, a delimited-text table with a fixed column order.
    pub fn roster_file(&self) -> PathBuf {
        self.base.join("users.csv")
    }

    /// The single active-identity record; absence means logged out.
    pub fn current_identity_file(&self) -> PathBuf {
        self.base.join("current_user.json")
    }

    /// Relay-side archive tables (one CSV per table).
    pub fn tables_dir(&self) -> PathBuf {
        self.base.join("tables")
    }

    pub fn table_file(&self, name: &str) -> PathBuf {
        self.tables_dir().join(format!("{}.csv", name))
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base)?;
        std::fs::create_dir_all(self.tables_dir())?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
