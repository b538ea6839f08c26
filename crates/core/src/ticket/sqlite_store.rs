//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{
    CreateTicketRequest, ReviewStatus, Ticket, TicketError, TicketFilter, TicketStatus,
    TicketStore,
};

const TICKET_COLUMNS: &str = "id, title, status, review_status, responsible_agent_id, \
     project_id, customer_id, domain, effort_points, priority_score, tags, \
     recommended_project_name, created_at, updated_at, assigned_at";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                status TEXT NOT NULL,
                review_status TEXT NOT NULL,
                responsible_agent_id TEXT,
                project_id TEXT,
                customer_id TEXT NOT NULL,
                domain TEXT NOT NULL,
                effort_points INTEGER NOT NULL DEFAULT 0,
                priority_score REAL NOT NULL DEFAULT 0,
                tags TEXT NOT NULL,
                recommended_project_name TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                assigned_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            CREATE INDEX IF NOT EXISTS idx_tickets_responsible ON tickets(responsible_agent_id);
            CREATE INDEX IF NOT EXISTS idx_tickets_domain ON tickets(domain);
            CREATE INDEX IF NOT EXISTS idx_tickets_priority ON tickets(priority_score DESC);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }

        if let Some(ref domain) = filter.domain {
            conditions.push("domain = ?");
            params.push(Box::new(domain.clone()));
        }

        if filter.unassigned_only {
            conditions.push("responsible_agent_id IS NULL");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let id: String = row.get(0)?;
        let title: String = row.get(1)?;
        let status_str: String = row.get(2)?;
        let review_status_str: String = row.get(3)?;
        let responsible_agent_id: Option<String> = row.get(4)?;
        let project_id: Option<String> = row.get(5)?;
        let customer_id: String = row.get(6)?;
        let domain: String = row.get(7)?;
        let effort_points: u32 = row.get(8)?;
        let priority_score: f32 = row.get(9)?;
        let tags_json: String = row.get(10)?;
        let recommended_project_name: Option<String> = row.get(11)?;
        let created_at_str: String = row.get(12)?;
        let updated_at_str: String = row.get(13)?;
        let assigned_at_str: Option<String> = row.get(14)?;

        // Parse timestamps - use current time if parsing fails (shouldn't happen with valid data)
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let assigned_at = assigned_at_str.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });

        let status = TicketStatus::parse(&status_str).unwrap_or(TicketStatus::Pending);
        let review_status =
            ReviewStatus::parse(&review_status_str).unwrap_or(ReviewStatus::NotRequested);

        let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();

        Ok(Ticket {
            id,
            title,
            status,
            review_status,
            responsible_agent_id,
            project_id,
            customer_id,
            effort_points,
            priority_score,
            tags,
            recommended_project_name,
            domain,
            created_at,
            updated_at,
            assigned_at,
        })
    }

    fn get_locked(conn: &Connection, id: &str) -> Result<Option<Ticket>, TicketError> {
        let sql = format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS);
        let result = conn.query_row(&sql, params![id], Self::row_to_ticket);

        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let review_status = if request.requires_review {
            ReviewStatus::Pending
        } else {
            ReviewStatus::NotRequested
        };

        let tags_json = serde_json::to_string(&request.tags)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO tickets (id, title, status, review_status, customer_id, domain, \
             effort_points, priority_score, tags, recommended_project_name, created_at, \
             updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.title,
                TicketStatus::Pending.as_str(),
                review_status.as_str(),
                request.customer_id,
                request.domain,
                request.effort_points,
                request.priority_score,
                tags_json,
                request.recommended_project_name,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            id,
            title: request.title,
            status: TicketStatus::Pending,
            review_status,
            responsible_agent_id: None,
            project_id: None,
            customer_id: request.customer_id,
            effort_points: request.effort_points,
            priority_score: request.priority_score,
            tags: request.tags,
            recommended_project_name: request.recommended_project_name,
            domain: request.domain,
            created_at: now,
            updated_at: now,
            assigned_at: None,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();
        Self::get_locked(&conn, id)
    }

    fn get_by_responsible(&self, agent_id: &str) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let sql = format!(
            "SELECT {} FROM tickets WHERE responsible_agent_id = ? ORDER BY assigned_at ASC",
            TICKET_COLUMNS
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![agent_id], Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM tickets {} ORDER BY priority_score DESC, created_at ASC LIMIT ? OFFSET ?",
            TICKET_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(count)
    }

    fn update(&self, ticket: &Ticket) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::get_locked(&conn, &ticket.id)?
            .ok_or_else(|| TicketError::NotFound(ticket.id.clone()))?;

        // Domain is immutable after creation; rule sets are versioned, not
        // migrated in place.
        if current.domain != ticket.domain {
            return Err(TicketError::InvalidState {
                ticket_id: ticket.id.clone(),
                current_state: current.domain,
                operation: "change domain of".to_string(),
            });
        }

        // An assigned or in-progress ticket must have a responsible agent.
        if ticket.status.requires_agent() && ticket.responsible_agent_id.is_none() {
            return Err(TicketError::InvalidState {
                ticket_id: ticket.id.clone(),
                current_state: ticket.status.as_str().to_string(),
                operation: "save agent-less".to_string(),
            });
        }

        let now = Utc::now();
        let tags_json =
            serde_json::to_string(&ticket.tags).map_err(|e| TicketError::Database(e.to_string()))?;

        conn.execute(
            "UPDATE tickets SET title = ?, status = ?, review_status = ?, \
             responsible_agent_id = ?, project_id = ?, effort_points = ?, priority_score = ?, \
             tags = ?, recommended_project_name = ?, updated_at = ?, assigned_at = ? \
             WHERE id = ?",
            params![
                ticket.title,
                ticket.status.as_str(),
                ticket.review_status.as_str(),
                ticket.responsible_agent_id,
                ticket.project_id,
                ticket.effort_points,
                ticket.priority_score,
                tags_json,
                ticket.recommended_project_name,
                now.to_rfc3339(),
                ticket.assigned_at.map(|t| t.to_rfc3339()),
                ticket.id,
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            updated_at: now,
            ..ticket.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteTicketStore {
        SqliteTicketStore::in_memory().unwrap()
    }

    fn create_test_request() -> CreateTicketRequest {
        CreateTicketRequest {
            title: "VPN drops every hour".to_string(),
            customer_id: "acme".to_string(),
            domain: "support".to_string(),
            effort_points: 5,
            priority_score: 40.0,
            tags: vec!["network".to_string(), "vpn".to_string()],
            recommended_project_name: None,
            requires_review: false,
        }
    }

    #[test]
    fn test_create_ticket() {
        let store = create_test_store();
        let request = create_test_request();

        let ticket = store.create(request.clone()).unwrap();

        assert!(!ticket.id.is_empty());
        assert_eq!(ticket.title, request.title);
        assert_eq!(ticket.customer_id, request.customer_id);
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert_eq!(ticket.review_status, ReviewStatus::NotRequested);
        assert!(ticket.responsible_agent_id.is_none());
    }

    #[test]
    fn test_create_ticket_with_review() {
        let store = create_test_store();
        let mut request = create_test_request();
        request.requires_review = true;

        let ticket = store.create(request).unwrap();
        assert_eq!(ticket.review_status, ReviewStatus::Pending);
    }

    #[test]
    fn test_get_ticket() {
        let store = create_test_store();
        let created = store.create(create_test_request()).unwrap();

        let fetched = store.get(&created.id).unwrap();
        assert!(fetched.is_some());

        let fetched = fetched.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.tags, created.tags);
    }

    #[test]
    fn test_get_nonexistent_ticket() {
        let store = create_test_store();
        let result = store.get("nonexistent-id").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_get_by_responsible() {
        let store = create_test_store();

        let mut assigned = store.create(create_test_request()).unwrap();
        assigned.responsible_agent_id = Some("agent-1".to_string());
        assigned.status = TicketStatus::Assigned;
        assigned.assigned_at = Some(Utc::now());
        store.update(&assigned).unwrap();

        store.create(create_test_request()).unwrap();

        let tickets = store.get_by_responsible("agent-1").unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, assigned.id);

        let none = store.get_by_responsible("agent-2").unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_list_with_status_filter() {
        let store = create_test_store();

        store.create(create_test_request()).unwrap();
        let mut rejected = store.create(create_test_request()).unwrap();
        rejected.status = TicketStatus::Rejected;
        store.update(&rejected).unwrap();

        let filter = TicketFilter::new().with_status(TicketStatus::Pending);
        let tickets = store.list(&filter).unwrap();
        assert_eq!(tickets.len(), 1);

        let filter = TicketFilter::new().with_status(TicketStatus::Rejected);
        let tickets = store.list(&filter).unwrap();
        assert_eq!(tickets.len(), 1);
    }

    #[test]
    fn test_list_with_domain_filter() {
        let store = create_test_store();

        store.create(create_test_request()).unwrap();

        let mut other = create_test_request();
        other.domain = "billing".to_string();
        store.create(other).unwrap();

        let filter = TicketFilter::new().with_domain("billing");
        let tickets = store.list(&filter).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].domain, "billing");
    }

    #[test]
    fn test_list_unassigned_only() {
        let store = create_test_store();

        let mut assigned = store.create(create_test_request()).unwrap();
        assigned.responsible_agent_id = Some("agent-1".to_string());
        assigned.status = TicketStatus::Assigned;
        store.update(&assigned).unwrap();

        store.create(create_test_request()).unwrap();

        let filter = TicketFilter::new().unassigned();
        let tickets = store.list(&filter).unwrap();
        assert_eq!(tickets.len(), 1);
        assert!(tickets[0].responsible_agent_id.is_none());
    }

    #[test]
    fn test_list_pagination() {
        let store = create_test_store();

        for _ in 0..5 {
            store.create(create_test_request()).unwrap();
        }

        let filter = TicketFilter::new().with_limit(2).with_offset(0);
        assert_eq!(store.list(&filter).unwrap().len(), 2);

        let filter = TicketFilter::new().with_limit(2).with_offset(4);
        assert_eq!(store.list(&filter).unwrap().len(), 1);
    }

    #[test]
    fn test_list_priority_ordering() {
        let store = create_test_store();

        let mut low = create_test_request();
        low.priority_score = 10.0;
        store.create(low).unwrap();

        let mut high = create_test_request();
        high.priority_score = 90.0;
        store.create(high).unwrap();

        let mut medium = create_test_request();
        medium.priority_score = 50.0;
        store.create(medium).unwrap();

        let tickets = store.list(&TicketFilter::new()).unwrap();
        assert_eq!(tickets.len(), 3);
        assert_eq!(tickets[0].priority_score, 90.0);
        assert_eq!(tickets[1].priority_score, 50.0);
        assert_eq!(tickets[2].priority_score, 10.0);
    }

    #[test]
    fn test_count_with_filter() {
        let store = create_test_store();

        store.create(create_test_request()).unwrap();
        let mut failed = store.create(create_test_request()).unwrap();
        failed.status = TicketStatus::Failed;
        store.update(&failed).unwrap();

        let filter = TicketFilter::new().with_status(TicketStatus::Pending);
        assert_eq!(store.count(&filter).unwrap(), 1);
        assert_eq!(store.count(&TicketFilter::new()).unwrap(), 2);
    }

    #[test]
    fn test_update_persists_changes() {
        let store = create_test_store();
        let mut ticket = store.create(create_test_request()).unwrap();

        ticket.responsible_agent_id = Some("agent-7".to_string());
        ticket.status = TicketStatus::Assigned;
        ticket.assigned_at = Some(Utc::now());
        ticket.add_tag("AI-Dispatched");

        store.update(&ticket).unwrap();

        let fetched = store.get(&ticket.id).unwrap().unwrap();
        assert_eq!(fetched.status, TicketStatus::Assigned);
        assert_eq!(fetched.responsible_agent_id.as_deref(), Some("agent-7"));
        assert!(fetched.has_tag("AI-Dispatched"));
        assert!(fetched.assigned_at.is_some());
    }

    #[test]
    fn test_update_nonexistent_ticket() {
        let store = create_test_store();
        let mut ticket = store.create(create_test_request()).unwrap();
        ticket.id = "nonexistent-id".to_string();

        let result = store.update(&ticket);
        assert!(matches!(result, Err(TicketError::NotFound(_))));
    }

    #[test]
    fn test_update_rejects_assigned_without_agent() {
        let store = create_test_store();
        let mut ticket = store.create(create_test_request()).unwrap();

        ticket.status = TicketStatus::Assigned;
        ticket.responsible_agent_id = None;

        let result = store.update(&ticket);
        assert!(matches!(result, Err(TicketError::InvalidState { .. })));
    }

    #[test]
    fn test_update_rejects_domain_change() {
        let store = create_test_store();
        let mut ticket = store.create(create_test_request()).unwrap();

        ticket.domain = "billing".to_string();

        let result = store.update(&ticket);
        assert!(matches!(result, Err(TicketError::InvalidState { .. })));
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("tickets.db");

        let store = SqliteTicketStore::new(&db_path).unwrap();
        let ticket = store.create(create_test_request()).unwrap();

        assert!(db_path.exists());

        let fetched = store.get(&ticket.id).unwrap();
        assert!(fetched.is_some());
    }
}
