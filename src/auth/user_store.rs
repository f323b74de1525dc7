//! User Storage
//! Mission: Securely store and manage user accounts with SQLite

use crate::auth::models::{NewUser, PageParams, User, UserQuery};
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::info;

const USER_COLUMNS: &str =
    "id, username, password_hash, first_name, last_name, email, roles, created_at";

/// Credential store with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

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
        )?;

        Ok(())
    }

    /// Check whether a username is already taken.
    ///
    /// Checked before insert; the UNIQUE constraint still backs the invariant
    /// if two registrations race.
    pub fn username_exists(&self, username: &str) -> Result<bool> {
        let conn = Connection::open(&self.db_path)?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .context("Failed to check username")?;
        Ok(count > 0)
    }

    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))?;

        let user_result = stmt.query_row(params![username], map_user_row);

        match user_result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify username and password
    pub fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        match self.get_user_by_username(username)? {
            Some(user) => {
                let valid =
                    verify(password, &user.password_hash).context("Failed to verify password")?;
                Ok(valid)
            }
            None => Ok(false),
        }
    }

    /// Persist a validated registration candidate and return the new id.
    ///
    /// The password is stored only as a bcrypt hash.
    pub fn create_user(&self, candidate: &NewUser) -> Result<i64> {
        let password_hash = hash(
            candidate.pass_word.as_deref().unwrap_or_default(),
            DEFAULT_COST,
        )
        .context("Failed to hash password")?;

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO users (username, password_hash, first_name, last_name, email, roles, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                candidate.user_name.as_deref().unwrap_or_default(),
                password_hash,
                candidate.first_name.as_deref().unwrap_or_default(),
                candidate.last_name.as_deref().unwrap_or_default(),
                candidate.email,
                candidate.roles,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("Failed to insert user")?;

        let id = conn.last_insert_rowid();
        info!(
            "✅ Created user: {} (id {})",
            candidate.user_name.as_deref().unwrap_or_default(),
            id
        );

        Ok(id)
    }

    /// One page of users ordered by id ascending, plus the total row count.
    pub fn list_users(&self, page: PageParams) -> Result<(Vec<User>, u64)> {
        let conn = Connection::open(&self.db_path)?;

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT ?1 OFFSET ?2"
        ))?;
        let users = stmt
            .query_map(
                params![page.size() as i64, (page.page() as i64) * (page.size() as i64)],
                map_user_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((users, total as u64))
    }

    /// One page of users matching the filter, ordered by id ascending.
    ///
    /// `user_id` is an exact match; the string predicates are substring
    /// matches via LIKE (case-insensitive for ASCII). Unset predicates are
    /// skipped entirely, so an empty filter behaves like `list_users`.
    pub fn query_users(&self, filter: &UserQuery, page: PageParams) -> Result<(Vec<User>, u64)> {
        let conn = Connection::open(&self.db_path)?;

        const WHERE_CLAUSE: &str = "(?1 IS NULL OR id = ?1)
               AND (?2 IS NULL OR first_name LIKE '%' || ?2 || '%')
               AND (?3 IS NULL OR last_name LIKE '%' || ?3 || '%')
               AND (?4 IS NULL OR email LIKE '%' || ?4 || '%')
               AND (?5 IS NULL OR username LIKE '%' || ?5 || '%')";

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM users WHERE {WHERE_CLAUSE}"),
            params![
                filter.user_id,
                filter.first_name,
                filter.last_name,
                filter.email,
                filter.user_name,
            ],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {WHERE_CLAUSE}
             ORDER BY id ASC LIMIT ?6 OFFSET ?7"
        ))?;
        let users = stmt
            .query_map(
                params![
                    filter.user_id,
                    filter.first_name,
                    filter.last_name,
                    filter.email,
                    filter.user_name,
                    page.size() as i64,
                    (page.page() as i64) * (page.size() as i64),
                ],
                map_user_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((users, total as u64))
    }
}

fn map_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        email: row.get(5)?,
        roles: row.get(6)?,
        created_at: row.get(7)?,
    })
}
