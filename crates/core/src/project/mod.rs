//! Project lookups.
//!
//! Projects are not owned by this core; they exist only as assignment
//! targets for batch dispatch and as context rows in the backlog summary.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::agent::DirectoryError;

/// A project, as consumed by the dispatch core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Unique identifier.
    pub id: String,
    /// Display name. Batch assignment matches cached recommended project
    /// names against this exactly.
    pub name: String,
    /// Customer the project belongs to.
    pub customer_id: String,
    /// Whether the project is still active (inactive projects are never
    /// recommended).
    pub active: bool,
}

/// Trait for project directory backends.
pub trait ProjectDirectory: Send + Sync {
    /// Get a project by ID.
    fn get(&self, id: &str) -> Result<Option<Project>, DirectoryError>;

    /// All active projects.
    fn active_projects(&self) -> Result<Vec<Project>, DirectoryError>;

    /// Recommended project for a customer, if one exists.
    fn recommended_for_customer(&self, customer_id: &str)
        -> Result<Option<Project>, DirectoryError>;
}

/// SQLite-backed project directory.
///
/// The recommendation heuristic is the most recently registered active
/// project of the customer.
pub struct SqliteProjectDirectory {
    conn: Mutex<Connection>,
}

impl SqliteProjectDirectory {
    /// Open (or create) a directory backed by the given database file.
    pub fn new(path: &Path) -> Result<Self, DirectoryError> {
        let conn = Connection::open(path).map_err(|e| DirectoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory directory (useful for testing).
    pub fn in_memory() -> Result<Self, DirectoryError> {
        let conn =
            Connection::open_in_memory().map_err(|e| DirectoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DirectoryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                customer_id TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_projects_customer ON projects(customer_id);
            "#,
        )
        .map_err(|e| DirectoryError::Database(e.to_string()))?;

        Ok(())
    }

    /// Insert or replace a project.
    pub fn add(&self, project: &Project) -> Result<(), DirectoryError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR REPLACE INTO projects (id, name, customer_id, active) VALUES (?, ?, ?, ?)",
            params![
                project.id,
                project.name,
                project.customer_id,
                project.active as i32
            ],
        )
        .map_err(|e| DirectoryError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
        let active: i32 = row.get(3)?;
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            customer_id: row.get(2)?,
            active: active != 0,
        })
    }
}

impl ProjectDirectory for SqliteProjectDirectory {
    fn get(&self, id: &str) -> Result<Option<Project>, DirectoryError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, name, customer_id, active FROM projects WHERE id = ?",
            params![id],
            Self::row_to_project,
        );

        match result {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DirectoryError::Database(e.to_string())),
        }
    }

    fn active_projects(&self) -> Result<Vec<Project>, DirectoryError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, name, customer_id, active FROM projects \
                 WHERE active = 1 ORDER BY rowid ASC",
            )
            .map_err(|e| DirectoryError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_project)
            .map_err(|e| DirectoryError::Database(e.to_string()))?;

        let mut projects = Vec::new();
        for row_result in rows {
            let project = row_result.map_err(|e| DirectoryError::Database(e.to_string()))?;
            projects.push(project);
        }

        Ok(projects)
    }

    fn recommended_for_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<Project>, DirectoryError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, name, customer_id, active FROM projects \
             WHERE customer_id = ? AND active = 1 ORDER BY rowid DESC LIMIT 1",
            params![customer_id],
            Self::row_to_project,
        );

        match result {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DirectoryError::Database(e.to_string())),
        }
    }
}
