//! Agent directory trait and SQLite reference implementation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use thiserror::Error;

use super::{Agent, AgentLevel};

/// Error type for directory lookups (agents and projects).
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("database error: {0}")]
    Database(String),
}

/// Trait for agent directory backends.
///
/// `list` must return agents in a stable order (insertion order for the
/// reference implementation) - the least-busy strategy relies on it for
/// deterministic tie-breaking.
pub trait AgentDirectory: Send + Sync {
    /// Get an agent by ID.
    fn get(&self, id: &str) -> Result<Option<Agent>, DirectoryError>;

    /// List all agents in stable insertion order.
    fn list(&self) -> Result<Vec<Agent>, DirectoryError>;
}

/// SQLite-backed agent directory.
pub struct SqliteAgentDirectory {
    conn: Mutex<Connection>,
}

impl SqliteAgentDirectory {
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
            CREATE TABLE IF NOT EXISTS agents (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                team TEXT NOT NULL,
                level TEXT NOT NULL,
                languages TEXT NOT NULL,
                max_capacity_points INTEGER
            );
            "#,
        )
        .map_err(|e| DirectoryError::Database(e.to_string()))?;

        Ok(())
    }

    /// Insert or replace an agent.
    pub fn add(&self, agent: &Agent) -> Result<(), DirectoryError> {
        let conn = self.conn.lock().unwrap();

        let languages_json = serde_json::to_string(&agent.languages)
            .map_err(|e| DirectoryError::Database(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO agents (id, name, team, level, languages, max_capacity_points) \
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                agent.id,
                agent.name,
                agent.team,
                agent.level.as_str(),
                languages_json,
                agent.max_capacity_points,
            ],
        )
        .map_err(|e| DirectoryError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_agent(row: &rusqlite::Row) -> rusqlite::Result<Agent> {
        let id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let team: String = row.get(2)?;
        let level_str: String = row.get(3)?;
        let languages_json: String = row.get(4)?;
        let max_capacity_points: Option<u32> = row.get(5)?;

        let level = AgentLevel::parse(&level_str).unwrap_or(AgentLevel::Regular);
        let languages: Vec<String> = serde_json::from_str(&languages_json).unwrap_or_default();

        Ok(Agent {
            id,
            name,
            team,
            level,
            languages,
            max_capacity_points,
        })
    }
}

impl AgentDirectory for SqliteAgentDirectory {
    fn get(&self, id: &str) -> Result<Option<Agent>, DirectoryError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, name, team, level, languages, max_capacity_points \
             FROM agents WHERE id = ?",
            params![id],
            Self::row_to_agent,
        );

        match result {
            Ok(agent) => Ok(Some(agent)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DirectoryError::Database(e.to_string())),
        }
    }

    fn list(&self) -> Result<Vec<Agent>, DirectoryError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, name, team, level, languages, max_capacity_points \
                 FROM agents ORDER BY rowid ASC",
            )
            .map_err(|e| DirectoryError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_agent)
            .map_err(|e| DirectoryError::Database(e.to_string()))?;

        let mut agents = Vec::new();
        for row_result in rows {
            let agent = row_result.map_err(|e| DirectoryError::Database(e.to_string()))?;
            agents.push(agent);
        }

        Ok(agents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_agent(id: &str, name: &str) -> Agent {
        Agent {
            id: id.to_string(),
            name: name.to_string(),
            team: "support".to_string(),
            level: AgentLevel::Regular,
            languages: vec!["en".to_string()],
            max_capacity_points: Some(40),
        }
    }

    #[test]
    fn test_add_and_get() {
        let dir = SqliteAgentDirectory::in_memory().unwrap();
        dir.add(&test_agent("a-1", "Dana")).unwrap();

        let agent = dir.get("a-1").unwrap().unwrap();
        assert_eq!(agent.name, "Dana");
        assert_eq!(agent.languages, vec!["en"]);
        assert_eq!(agent.max_capacity_points, Some(40));
    }

    #[test]
    fn test_get_missing_agent() {
        let dir = SqliteAgentDirectory::in_memory().unwrap();
        assert!(dir.get("nobody").unwrap().is_none());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let dir = SqliteAgentDirectory::in_memory().unwrap();
        dir.add(&test_agent("a-3", "Charlie")).unwrap();
        dir.add(&test_agent("a-1", "Alice")).unwrap();
        dir.add(&test_agent("a-2", "Bob")).unwrap();

        let agents = dir.list().unwrap();
        let ids: Vec<&str> = agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a-3", "a-1", "a-2"]);
    }

    #[test]
    fn test_add_replaces_existing() {
        let dir = SqliteAgentDirectory::in_memory().unwrap();
        dir.add(&test_agent("a-1", "Dana")).unwrap();

        let mut updated = test_agent("a-1", "Dana");
        updated.max_capacity_points = None;
        dir.add(&updated).unwrap();

        let agent = dir.get("a-1").unwrap().unwrap();
        assert!(agent.max_capacity_points.is_none());
    }
}
