//! Authentication: who is using the task store.
//!
//! [`AuthProvider`] is the seam to the identity service. [`LocalAuth`]
//! implements it with salted SHA-256 password digests in `accounts.json`
//! and the signed-in user in `session.json`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{error, info};
use uuid::Uuid;

use crate::backend::{DataAccess, Filter, Row, Table};
use crate::error::{Error, Result};
use crate::task::Profile;

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

/// Identity operations consumed by the application.
pub trait AuthProvider {
    fn current_user(&self) -> Result<Option<User>>;
    fn sign_in_with_password(&mut self, email: &str, password: &str) -> Result<User>;
    fn sign_up(&mut self, email: &str, password: &str, full_name: &str) -> Result<User>;
    fn sign_out(&mut self) -> Result<()>;
}

/// The authenticated user, or an auth error asking to sign in.
pub fn require_user(auth: &dyn AuthProvider) -> Result<User> {
    auth.current_user()?
        .ok_or_else(|| Error::Auth("not signed in; run `td login` first".into()))
}

/// Input of the registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Client-side checks run before any call to the identity service.
pub fn validate_registration(reg: &Registration, min_password_len: usize) -> Result<()> {
    if reg.full_name.trim().is_empty() {
        return Err(Error::Validation("Full name is required".into()));
    }
    if reg.email.trim().is_empty() {
        return Err(Error::Validation("Email is required".into()));
    }
    if reg.password != reg.confirm_password {
        return Err(Error::Validation("Passwords do not match!".into()));
    }
    if reg.password.chars().count() < min_password_len {
        return Err(Error::Validation(format!(
            "Password must be at least {min_password_len} characters long!"
        )));
    }
    Ok(())
}

/// Sign up and create the profile row.
///
/// A failed profile insert is logged and does not undo the sign-up.
pub fn register(
    auth: &mut dyn AuthProvider,
    backend: &mut dyn DataAccess,
    reg: &Registration,
    min_password_len: usize,
) -> Result<User> {
    validate_registration(reg, min_password_len)?;
    let user = auth.sign_up(&reg.email, &reg.password, reg.full_name.trim())?;

    let mut row = Row::new();
    row.insert("id".into(), json!(user.id));
    row.insert("full_name".into(), json!(reg.full_name.trim()));
    if let Err(e) = backend.insert(Table::Profiles, vec![row]) {
        error!(user = %user.id, "profile creation failed: {e}");
    }
    Ok(user)
}

/// Display name from the profile, falling back to "User".
pub fn display_name(backend: &dyn DataAccess, user: &User) -> String {
    let rows = match backend.select(Table::Profiles, &[Filter::eq("id", user.id)], None) {
        Ok(rows) => rows,
        Err(e) => {
            error!(user = %user.id, "error loading profile: {e}");
            return "User".into();
        }
    };
    rows.into_iter()
        .next()
        .and_then(|row| serde_json::from_value::<Profile>(serde_json::Value::Object(row)).ok())
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| "User".into())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    id: Uuid,
    email: String,
    full_name: String,
    salt: String,
    password_digest: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Accounts {
    #[serde(default)]
    accounts: Vec<Account>,
}

fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// File-backed accounts and session.
#[derive(Debug, Clone)]
pub struct LocalAuth {
    accounts_path: PathBuf,
    session_path: PathBuf,
}

impl LocalAuth {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            accounts_path: data_dir.join("accounts.json"),
            session_path: data_dir.join("session.json"),
        }
    }

    fn load_accounts(&self) -> Result<Accounts> {
        if !self.accounts_path.exists() {
            return Ok(Accounts::default());
        }
        let raw = fs::read_to_string(&self.accounts_path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_accounts(&self, accounts: &Accounts) -> Result<()> {
        fs::write(&self.accounts_path, serde_json::to_string_pretty(accounts)?)?;
        Ok(())
    }

    fn start_session(&self, user: &User) -> Result<()> {
        fs::write(&self.session_path, serde_json::to_string_pretty(user)?)?;
        Ok(())
    }
}

impl AuthProvider for LocalAuth {
    fn current_user(&self) -> Result<Option<User>> {
        if !self.session_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.session_path)?;
        let Ok(user) = serde_json::from_str::<User>(&raw) else {
            return Ok(None);
        };
        // The session is only valid while the account exists.
        let accounts = self.load_accounts()?;
        Ok(accounts.accounts.iter().any(|a| a.id == user.id).then_some(user))
    }

    fn sign_in_with_password(&mut self, email: &str, password: &str) -> Result<User> {
        let email = normalise_email(email);
        let accounts = self.load_accounts()?;
        let account = accounts
            .accounts
            .iter()
            .find(|a| a.email == email && a.password_digest == digest(&a.salt, password))
            .ok_or_else(|| Error::Auth("Invalid login credentials".into()))?;
        let user = User { id: account.id, email: account.email.clone() };
        self.start_session(&user)?;
        info!(user = %user.id, "signed in");
        Ok(user)
    }

    fn sign_up(&mut self, email: &str, password: &str, full_name: &str) -> Result<User> {
        let email = normalise_email(email);
        let mut accounts = self.load_accounts()?;
        if accounts.accounts.iter().any(|a| a.email == email) {
            return Err(Error::Auth("User already registered".into()));
        }
        let salt = Uuid::new_v4().simple().to_string();
        let account = Account {
            id: Uuid::new_v4(),
            email: email.clone(),
            full_name: full_name.to_string(),
            password_digest: digest(&salt, password),
            salt,
            created_at: Utc::now(),
        };
        let user = User { id: account.id, email };
        accounts.accounts.push(account);
        self.save_accounts(&accounts)?;
        self.start_session(&user)?;
        info!(user = %user.id, "account created");
        Ok(user)
    }

    fn sign_out(&mut self) -> Result<()> {
        if self.session_path.exists() {
            fs::remove_file(&self.session_path)?;
        }
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::JsonBackend;

    fn reg(password: &str, confirm: &str) -> Registration {
        Registration {
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn registration_validation_blocks_bad_input() {
        let err = validate_registration(&reg("secret1", "secret2"), 6).unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match!");
        let err = validate_registration(&reg("abc", "abc"), 6).unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters long!");
        assert!(validate_registration(&reg("secret1", "secret1"), 6).is_ok());
    }

    #[test]
    fn invalid_registration_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let mut auth = LocalAuth::open(dir.path());
        let mut backend = JsonBackend::in_memory();
        assert!(register(&mut auth, &mut backend, &reg("a", "b"), 6).is_err());
        assert!(auth.current_user().unwrap().is_none());
        assert!(!dir.path().join("accounts.json").exists());
    }

    #[test]
    fn register_sign_out_and_sign_in() {
        let dir = tempfile::tempdir().unwrap();
        let mut auth = LocalAuth::open(dir.path());
        let mut backend = JsonBackend::in_memory();

        let user = register(&mut auth, &mut backend, &reg("secret1", "secret1"), 6).unwrap();
        assert_eq!(auth.current_user().unwrap(), Some(user.clone()));
        assert_eq!(display_name(&backend, &user), "Ada Lovelace");

        auth.sign_out().unwrap();
        assert!(auth.current_user().unwrap().is_none());
        assert!(matches!(require_user(&auth), Err(Error::Auth(_))));

        let err = auth.sign_in_with_password("ada@example.com", "wrong").unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        let again = auth.sign_in_with_password(" ADA@example.com ", "secret1").unwrap();
        assert_eq!(again.id, user.id);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut auth = LocalAuth::open(dir.path());
        auth.sign_up("a@b.c", "secret1", "A").unwrap();
        assert!(matches!(auth.sign_up("A@B.C", "secret2", "B"), Err(Error::Auth(_))));
    }

    #[test]
    fn missing_profile_displays_default_name() {
        let backend = JsonBackend::in_memory();
        let user = User { id: Uuid::new_v4(), email: "x@y.z".into() };
        assert_eq!(display_name(&backend, &user), "User");
    }
}
