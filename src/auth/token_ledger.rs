//! Token Ledger
//! Mission: Persist an audit trail of issued tokens and their validity

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

/// One audit row for an issued token.
///
/// `is_valid` starts true and can only be flipped to false; rows are never
/// deleted.
#[derive(Debug, Clone)]
pub struct TokenAudit {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub is_valid: bool,
}

/// Ledger of issued tokens with SQLite backend
pub struct TokenLedger {
    db_path: String,
}

impl TokenLedger {
    /// Open the ledger and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let ledger = Self {
            db_path: db_path.to_string(),
        };
        ledger.init_db()?;
        Ok(ledger)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS jwt_audit (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                token TEXT UNIQUE NOT NULL,
                issued_at TEXT NOT NULL,
                expiry TEXT NOT NULL,
                is_valid INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        Ok(())
    }

    /// Record a freshly issued token for the given user.
    pub fn record(
        &self,
        user_id: i64,
        token: &str,
        issued_at: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO jwt_audit (user_id, token, issued_at, expiry, is_valid)
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![
                user_id,
                token,
                issued_at.to_rfc3339(),
                expiry.to_rfc3339(),
            ],
        )
        .context("Failed to record token")?;

        Ok(())
    }

    /// Look up the audit record for a token string.
    pub fn find(&self, token: &str) -> Result<Option<TokenAudit>> {
        let conn = Connection::open(&self.db_path)?;

        let audit = conn
            .query_row(
                "SELECT id, user_id, token, issued_at, expiry, is_valid
                 FROM jwt_audit WHERE token = ?1",
                params![token],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, bool>(5)?,
                    ))
                },
            )
            .optional()
            .context("Failed to look up token")?;

        audit
            .map(|(id, user_id, token, issued_at, expiry, is_valid)| {
                Ok(TokenAudit {
                    id,
                    user_id,
                    token,
                    issued_at: parse_timestamp(&issued_at)?,
                    expiry: parse_timestamp(&expiry)?,
                    is_valid,
                })
            })
            .transpose()
    }

    /// Flip the validity flag to false.
    ///
    /// Returns false when no audit record exists for the token. Revoking an
    /// already-revoked token leaves the flag false and reports success.
    pub fn revoke(&self, token: &str) -> Result<bool> {
        let conn = Connection::open(&self.db_path)?;
        let rows = conn
            .execute(
                "UPDATE jwt_audit SET is_valid = 0 WHERE token = ?1",
                params![token],
            )
            .context("Failed to revoke token")?;

        if rows > 0 {
            info!("🗑️  Token revoked");
        }

        Ok(rows > 0)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Bad timestamp in ledger: {raw}"))?
        .with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::NamedTempFile;

    fn create_test_ledger() -> (TokenLedger, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();

        // The jwt_audit table has a FOREIGN KEY on users(id), which the
        // bundled SQLite build enforces by default. In production the
        // users table is created by UserStore against the same db_path
        // before any tokens are recorded; replicate that fixture here.
        let conn = Connection::open(db_path).unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT,
                roles TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO users (id, username, password_hash, first_name, last_name, created_at)
             VALUES (1, 'test-user', 'hash', 'Test', 'User', ?1)",
            params![Utc::now().to_rfc3339()],
        )
        .unwrap();

        let ledger = TokenLedger::new(db_path).unwrap();
        (ledger, temp_file)
    }

    fn record_sample(ledger: &TokenLedger, token: &str) {
        let now = Utc::now();
        ledger
            .record(1, token, now, now + Duration::minutes(30))
            .unwrap();
    }

    #[test]
    fn test_record_and_find() {
        let (ledger, _temp) = create_test_ledger();
        record_sample(&ledger, "token-a");

        let audit = ledger.find("token-a").unwrap().unwrap();
        assert_eq!(audit.user_id, 1);
        assert!(audit.is_valid);
        assert!(audit.expiry > audit.issued_at);
    }

    #[test]
    fn test_find_unknown_token() {
        let (ledger, _temp) = create_test_ledger();
        assert!(ledger.find("missing").unwrap().is_none());
    }

    #[test]
    fn test_revoke_flips_flag_once() {
        let (ledger, _temp) = create_test_ledger();
        record_sample(&ledger, "token-a");

        assert!(ledger.revoke("token-a").unwrap());
        assert!(!ledger.find("token-a").unwrap().unwrap().is_valid);

        // Second revoke still succeeds; the flag stays false.
        assert!(ledger.revoke("token-a").unwrap());
        assert!(!ledger.find("token-a").unwrap().unwrap().is_valid);
    }

    #[test]
    fn test_revoke_unknown_token_reports_missing() {
        let (ledger, _temp) = create_test_ledger();
        assert!(!ledger.revoke("missing").unwrap());
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let (ledger, _temp) = create_test_ledger();
        record_sample(&ledger, "token-a");

        let now = Utc::now();
        assert!(ledger
            .record(2, "token-a", now, now + Duration::minutes(30))
            .is_err());
    }
}
