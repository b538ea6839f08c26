//! In-memory mock project directory for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::agent::DirectoryError;
use crate::project::{Project, ProjectDirectory};

/// Mock implementation of the [`ProjectDirectory`] trait.
///
/// `recommended_for_customer` consults explicit overrides first and
/// falls back to the most recently added active project of the customer,
/// mirroring the SQLite reference implementation.
#[derive(Default)]
pub struct MockProjectDirectory {
    projects: Mutex<Vec<Project>>,
    recommended: Mutex<HashMap<String, String>>,
}

impl MockProjectDirectory {
    /// Create an empty mock directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project.
    pub fn add(&self, project: Project) {
        self.projects.lock().unwrap().push(project);
    }

    /// Pin the recommended project for a customer.
    pub fn set_recommended_for(&self, customer_id: &str, project_id: &str) {
        self.recommended
            .lock()
            .unwrap()
            .insert(customer_id.to_string(), project_id.to_string());
    }
}

impl ProjectDirectory for MockProjectDirectory {
    fn get(&self, id: &str) -> Result<Option<Project>, DirectoryError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    fn active_projects(&self) -> Result<Vec<Project>, DirectoryError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.active)
            .cloned()
            .collect())
    }

    fn recommended_for_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<Project>, DirectoryError> {
        if let Some(project_id) = self.recommended.lock().unwrap().get(customer_id) {
            return self.get(project_id);
        }

        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|p| p.customer_id == customer_id && p.active)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_active_projects_filters_inactive() {
        let dir = MockProjectDirectory::new();
        dir.add(fixtures::project("p-1", "Live", "acme"));
        let mut dead = fixtures::project("p-2", "Dead", "acme");
        dead.active = false;
        dir.add(dead);

        let projects = dir.active_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "p-1");
    }

    #[test]
    fn test_recommended_override_wins() {
        let dir = MockProjectDirectory::new();
        dir.add(fixtures::project("p-1", "First", "acme"));
        dir.add(fixtures::project("p-2", "Second", "acme"));
        dir.set_recommended_for("acme", "p-1");

        let project = dir.recommended_for_customer("acme").unwrap().unwrap();
        assert_eq!(project.id, "p-1");
    }

    #[test]
    fn test_recommended_falls_back_to_latest_active() {
        let dir = MockProjectDirectory::new();
        dir.add(fixtures::project("p-1", "First", "acme"));
        dir.add(fixtures::project("p-2", "Second", "acme"));

        let project = dir.recommended_for_customer("acme").unwrap().unwrap();
        assert_eq!(project.id, "p-2");
    }
}
