use chrono::Utc;
use rand::Rng;
use reviewlens_core::{Error, Identity, Result};
use reviewlens_storage::UserStore;
use tracing::info;

pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

/// Six-digit one-time code, 100000..=999999.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

const USER_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `user_` followed by nine base-36 characters.
pub fn generate_user_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| USER_ID_ALPHABET[rng.gen_range(0..USER_ID_ALPHABET.len())] as char)
        .collect();
    format!("user_{}", suffix)
}

/// Round-robin bucket 1..=5 over registration order.
pub fn assign_reviewer_version(existing_count: usize) -> u8 {
    ((existing_count % 5) + 1) as u8
}

/// A registration waiting for its OTP. The code is held here only; it is
/// never persisted, and no identity exists until verification succeeds.
#[derive(Debug)]
pub struct PendingRegistration {
    email: String,
    otp: String,
}

impl PendingRegistration {
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Demo delivery: the caller shows the code to the user directly.
    pub fn otp(&self) -> &str {
        &self.otp
    }

    pub fn verify(&self, submitted: &str) -> bool {
        submitted.trim() == self.otp
    }
}

pub struct AuthManager {
    store: UserStore,
}

impl AuthManager {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    pub fn begin_registration(&self, email: &str) -> Result<PendingRegistration> {
        let email = email.trim();
        validate_email(email)?;
        if self.store.find_by_email(email)?.is_some() {
            return Err(Error::Validation(
                "This email is already registered".to_string(),
            ));
        }
        Ok(PendingRegistration {
            email: email.to_string(),
            otp: generate_otp(),
        })
    }

    /// Exact-match OTP check; any mismatch leaves the roster untouched.
    pub fn complete_registration(
        &self,
        pending: &PendingRegistration,
        submitted_otp: &str,
    ) -> Result<Identity> {
        if !pending.verify(submitted_otp) {
            return Err(Error::Validation(
                "Invalid OTP. Please try again.".to_string(),
            ));
        }

        let version = assign_reviewer_version(self.store.count()?);
        let identity = Identity::new(
            &pending.email,
            &generate_user_id(),
            version,
            &Utc::now().to_rfc3339(),
        );
        self.store.append(&identity)?;
        self.store.save_current(Some(&identity))?;
        info!(email = %identity.email, reviewer_version = identity.reviewer_version, "Registered reviewer");
        Ok(identity)
    }

    pub fn login(&self, email: &str) -> Result<Identity> {
        let email = email.trim();
        validate_email(email)?;
        let identity = self.store.find_by_email(email)?.ok_or_else(|| {
            Error::NotFound("Email not found. Please register first.".to_string())
        })?;
        self.store.save_current(Some(&identity))?;
        Ok(identity)
    }

    pub fn logout(&self) -> Result<()> {
        self.store.save_current(None)
    }
}
