use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::io::store::atomic_write;
use crate::model::{Actor, Role};

pub const ACCOUNTS_FILE: &str = "accounts.toml";

/// Error type for sign-in and account file handling
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("unknown account: {0}")]
    UnknownAccount(String),
    #[error("wrong password for {0}")]
    BadPassword(String),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse accounts.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not serialize accounts.toml: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Sign-in session. Changes are pushed to every open `AuthWatch`.
pub trait AuthProvider {
    fn sign_in(&self, email: &str, password: &str) -> Result<Actor, AuthError>;
    fn sign_out(&self);
    fn current_actor(&self) -> Option<Actor>;
    /// Subscribe to sign-in/out changes; dropping the watch unsubscribes
    fn on_auth_changed(&self) -> AuthWatch;
}

/// Receiving end of an auth-change subscription
pub struct AuthWatch {
    rx: mpsc::Receiver<Option<Actor>>,
}

impl AuthWatch {
    /// Newest pending change, if any. `Some(None)` means signed out.
    pub fn poll(&self) -> Option<Option<Actor>> {
        let mut latest = None;
        while let Ok(change) = self.rx.try_recv() {
            latest = Some(change);
        }
        latest
    }
}

/// One entry of accounts.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    /// Lowercase hex SHA-256 of the password
    pub password_sha256: String,
    #[serde(default)]
    pub role: Role,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Account {
    pub fn to_actor(&self) -> Actor {
        Actor {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsFile {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Read accounts.toml; a missing file has no accounts
pub fn read_accounts(path: &Path) -> Result<AccountsFile, AuthError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(toml::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AccountsFile::default()),
        Err(e) => Err(AuthError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Add or replace the account with the same email
pub fn upsert_account(path: &Path, account: Account) -> Result<(), AuthError> {
    let mut file = read_accounts(path)?;
    file.accounts.retain(|a| !a.email.eq_ignore_ascii_case(&account.email));
    file.accounts.push(account);
    let text = toml::to_string_pretty(&file)?;
    atomic_write(path, text.as_bytes()).map_err(|e| AuthError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Accounts checked against the store's accounts.toml
pub struct LocalAuth {
    path: PathBuf,
    session: RefCell<Option<Actor>>,
    watchers: RefCell<Vec<mpsc::Sender<Option<Actor>>>>,
}

impl LocalAuth {
    pub fn new(store_dir: &Path) -> Self {
        LocalAuth {
            path: store_dir.join(ACCOUNTS_FILE),
            session: RefCell::new(None),
            watchers: RefCell::new(Vec::new()),
        }
    }

    fn notify(&self) {
        let current = self.session.borrow().clone();
        self.watchers
            .borrow_mut()
            .retain(|tx| tx.send(current.clone()).is_ok());
    }
}

impl AuthProvider for LocalAuth {
    fn sign_in(&self, email: &str, password: &str) -> Result<Actor, AuthError> {
        let file = read_accounts(&self.path)?;
        let account = file
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email.trim()))
            .ok_or_else(|| AuthError::UnknownAccount(email.to_string()))?;
        if !account
            .password_sha256
            .eq_ignore_ascii_case(&hash_password(password))
        {
            tracing::info!(email, "sign-in rejected");
            return Err(AuthError::BadPassword(email.to_string()));
        }
        let actor = account.to_actor();
        tracing::info!(uid = %actor.uid, role = ?actor.role, "signed in");
        *self.session.borrow_mut() = Some(actor.clone());
        self.notify();
        Ok(actor)
    }

    fn sign_out(&self) {
        if self.session.borrow_mut().take().is_some() {
            tracing::info!("signed out");
            self.notify();
        }
    }

    fn current_actor(&self) -> Option<Actor> {
        self.session.borrow().clone()
    }

    fn on_auth_changed(&self) -> AuthWatch {
        let (tx, rx) = mpsc::channel();
        self.watchers.borrow_mut().push(tx);
        AuthWatch { rx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalAuth) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(ACCOUNTS_FILE);
        upsert_account(
            &path,
            Account {
                email: "boss@example.com".into(),
                password_sha256: hash_password("hunter2"),
                role: Role::Admin,
                uid: "u-admin".into(),
                display_name: Some("Boss".into()),
            },
        )
        .unwrap();
        upsert_account(
            &path,
            Account {
                email: "dev@example.com".into(),
                password_sha256: hash_password("pw"),
                role: Role::Viewer,
                uid: "u-dev".into(),
                display_name: None,
            },
        )
        .unwrap();
        let auth = LocalAuth::new(tmp.path());
        (tmp, auth)
    }

    #[test]
    fn test_password_digest_is_hex() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sign_in_reports_role() {
        let (_tmp, auth) = setup();
        let admin = auth.sign_in("boss@example.com", "hunter2").unwrap();
        assert!(admin.is_admin());
        assert_eq!(admin.label(), "Boss");
        let dev = auth.sign_in("DEV@example.com", "pw").unwrap();
        assert!(!dev.is_admin());
        assert_eq!(auth.current_actor(), Some(dev));
    }

    #[test]
    fn test_wrong_password_keeps_session() {
        let (_tmp, auth) = setup();
        auth.sign_in("boss@example.com", "hunter2").unwrap();
        assert!(matches!(
            auth.sign_in("dev@example.com", "nope"),
            Err(AuthError::BadPassword(_))
        ));
        assert!(matches!(
            auth.sign_in("ghost@example.com", "pw"),
            Err(AuthError::UnknownAccount(_))
        ));
        assert_eq!(auth.current_actor().map(|a| a.uid), Some("u-admin".into()));
    }

    #[test]
    fn test_watchers_see_changes() {
        let (_tmp, auth) = setup();
        let watch = auth.on_auth_changed();
        assert_eq!(watch.poll(), None);
        auth.sign_in("dev@example.com", "pw").unwrap();
        assert_eq!(watch.poll().flatten().map(|a| a.uid), Some("u-dev".into()));
        auth.sign_out();
        assert_eq!(watch.poll(), Some(None));
        assert_eq!(auth.current_actor(), None);
    }

    #[test]
    fn test_upsert_replaces_same_email() {
        let (tmp, _auth) = setup();
        let path = tmp.path().join(ACCOUNTS_FILE);
        upsert_account(
            &path,
            Account {
                email: "dev@example.com".into(),
                password_sha256: hash_password("new"),
                role: Role::Admin,
                uid: "u-dev".into(),
                display_name: None,
            },
        )
        .unwrap();
        let file = read_accounts(&path).unwrap();
        assert_eq!(file.accounts.len(), 2);
        assert_eq!(file.accounts[1].role, Role::Admin);
    }

    #[test]
    fn test_missing_file_has_no_accounts() {
        let tmp = TempDir::new().unwrap();
        let auth = LocalAuth::new(tmp.path());
        assert!(matches!(
            auth.sign_in("a@b.c", "x"),
            Err(AuthError::UnknownAccount(_))
        ));
    }
}
