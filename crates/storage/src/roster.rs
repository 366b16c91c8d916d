use reviewlens_core::{Error, Identity, Paths, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

const ROSTER_HEADERS: [&str; 4] = ["email", "userId", "reviewerVersion", "registrationDate"];

/// The local identity roster plus the single active-identity record.
///
/// Single-tab, single-writer by assumption: concurrent processes racing on
/// a save are last-writer-wins. Each save is one atomic file replace, so a
/// torn roster is not possible.
pub struct UserStore {
    paths: Paths,
}

impl UserStore {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    /// Parse the roster table. Absent file is an empty roster; a malformed
    /// row (wrong field count, unparseable version) is skipped, not a fault.
    pub fn load_all(&self) -> Result<Vec<Identity>> {
        let path = self.paths.roster_file();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| Error::Store(format!("Failed to open roster: {}", e)))?;

        let mut identities = Vec::new();
        for record in reader.records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable roster row");
                    continue;
                }
            };
            match parse_row(&record) {
                Some(identity) => identities.push(identity),
                None => {
                    debug!(fields = record.len(), "Skipping malformed roster row");
                }
            }
        }

        Ok(identities)
    }

    /// Serialize the full roster deterministically. The header row is
    /// always present, even with zero identities; embedded separators and
    /// quotes are quote-escaped.
    pub fn save_all(&self, identities: &[Identity]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(ROSTER_HEADERS)
            .map_err(|e| Error::Store(format!("Failed to write roster header: {}", e)))?;

        for identity in identities {
            let version = identity.reviewer_version.to_string();
            writer
                .write_record([
                    identity.email.as_str(),
                    identity.user_id.as_str(),
                    version.as_str(),
                    identity.registration_date.as_str(),
                ])
                .map_err(|e| Error::Store(format!("Failed to write roster row: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Store(format!("Failed to flush roster: {}", e)))?;
        atomic_write(&self.paths.roster_file(), &bytes)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self.load_all()?.into_iter().find(|u| u.email == email))
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.load_all()?.len())
    }

    /// Add a new identity; the email must not already be registered.
    pub fn append(&self, identity: &Identity) -> Result<()> {
        let mut identities = self.load_all()?;
        if identities.iter().any(|u| u.email == identity.email) {
            return Err(Error::Validation(format!(
                "This email is already registered: {}",
                identity.email
            )));
        }
        identities.push(identity.clone());
        self.save_all(&identities)
    }

    pub fn load_current(&self) -> Result<Option<Identity>> {
        let path = self.paths.current_identity_file();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        match serde_json::from_str(&content) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                debug!(error = %e, "Current-identity record unreadable, treating as logged out");
                Ok(None)
            }
        }
    }

    /// `None` clears the record: absence means logged out.
    pub fn save_current(&self, identity: Option<&Identity>) -> Result<()> {
        let path = self.paths.current_identity_file();
        match identity {
            Some(identity) => {
                let json = serde_json::to_string_pretty(identity)?;
                atomic_write(&path, json.as_bytes())
            }
            None => {
                if path.exists() {
                    fs::remove_file(&path)?;
                }
                Ok(())
            }
        }
    }
}

fn parse_row(record: &csv::StringRecord) -> Option<Identity> {
    if record.len() != ROSTER_HEADERS.len() {
        return None;
    }
    let reviewer_version = record.get(2)?.trim().parse::<u8>().ok()?;
    Some(Identity {
        email: record.get(0)?.to_string(),
        user_id: record.get(1)?.to_string(),
        reviewer_version,
        registration_date: record.get(3)?.to_string(),
    })
}

/// Write-then-rename so a save is observed either fully or not at all.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, UserStore) {
        let temp = TempDir::new().unwrap();
        let paths = Paths::with_base(temp.path().to_path_buf());
        (temp, UserStore::new(paths))
    }

    fn identity(email: &str, version: u8) -> Identity {
        Identity::new(email, "user_a1b2c3d4e", version, "2024-05-01T10:00:00Z")
    }

    #[test]
    fn test_load_all_absent_file_is_empty() {
        let (_temp, store) = store();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let (_temp, store) = store();
        let users = vec![identity("a@example.com", 1), identity("b@example.com", 2)];
        store.save_all(&users).unwrap();
        assert_eq!(store.load_all().unwrap(), users);
    }

    #[test]
    fn test_round_trip_with_embedded_separators_and_quotes() {
        let (_temp, store) = store();
        let mut user = identity("odd@example.com", 4);
        user.user_id = "user_\"quoted\",comma".to_string();
        store.save_all(std::slice::from_ref(&user)).unwrap();
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, vec![user]);
    }

    #[test]
    fn test_empty_roster_still_writes_header() {
        let (_temp, store) = store();
        store.save_all(&[]).unwrap();
        let content = std::fs::read_to_string(store.paths.roster_file()).unwrap();
        assert!(content.starts_with("email,userId,reviewerVersion,registrationDate"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let (_temp, store) = store();
        let raw = "email,userId,reviewerVersion,registrationDate\n\
                   ok@example.com,user_abc,2,2024-01-01T00:00:00Z\n\
                   short@example.com,user_def\n\
                   bad@example.com,user_ghi,not-a-number,2024-01-01T00:00:00Z\n";
        std::fs::write(store.paths.roster_file(), raw).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].email, "ok@example.com");
    }

    #[test]
    fn test_append_rejects_duplicate_email() {
        let (_temp, store) = store();
        store.append(&identity("dup@example.com", 1)).unwrap();
        let err = store.append(&identity("dup@example.com", 2)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_current_identity_lifecycle() {
        let (_temp, store) = store();
        assert!(store.load_current().unwrap().is_none());

        let user = identity("me@example.com", 5);
        store.save_current(Some(&user)).unwrap();
        assert_eq!(store.load_current().unwrap(), Some(user));

        store.save_current(None).unwrap();
        assert!(store.load_current().unwrap().is_none());
    }
}
