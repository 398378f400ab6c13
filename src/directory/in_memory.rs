//! In-memory implementation of the Directory port.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::config::OrganizationConfig;
use crate::models::{Department, Group, Office, ProductProcess, Team, Worker};

use super::Directory;

/// A read-only directory built from the organization seed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    seed: OrganizationConfig,
    pairings: HashSet<ProductProcess>,
}

impl InMemoryDirectory {
    /// Creates a directory from a configuration seed.
    pub fn new(seed: OrganizationConfig) -> Self {
        let pairings = seed.product_processes.iter().cloned().collect();
        Self { seed, pairings }
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn user(&self, id: &str) -> Option<Worker> {
        self.seed.workers.iter().find(|w| w.id == id).cloned()
    }

    async fn group(&self, id: &str) -> Option<Group> {
        self.seed.groups.iter().find(|g| g.id == id).cloned()
    }

    async fn team(&self, id: &str) -> Option<Team> {
        self.seed.teams.iter().find(|t| t.id == id).cloned()
    }

    async fn department(&self, id: &str) -> Option<Department> {
        self.seed.departments.iter().find(|d| d.id == id).cloned()
    }

    async fn office(&self, id: &str) -> Option<Office> {
        self.seed.offices.iter().find(|o| o.id == id).cloned()
    }

    async fn offices(&self) -> Vec<Office> {
        self.seed.offices.clone()
    }

    async fn departments_of(&self, office_id: &str) -> Vec<Department> {
        self.seed
            .departments
            .iter()
            .filter(|d| d.office_id == office_id)
            .cloned()
            .collect()
    }

    async fn teams_of(&self, department_id: &str) -> Vec<Team> {
        self.seed
            .teams
            .iter()
            .filter(|t| t.department_id == department_id)
            .cloned()
            .collect()
    }

    async fn groups_of(&self, team_id: &str) -> Vec<Group> {
        self.seed
            .groups
            .iter()
            .filter(|g| g.team_id == team_id)
            .cloned()
            .collect()
    }

    async fn active_members(&self, group_id: &str) -> Vec<Worker> {
        self.seed
            .workers
            .iter()
            .filter(|w| w.active && w.group_id.as_deref() == Some(group_id))
            .cloned()
            .collect()
    }

    async fn is_valid_pairing(&self, product_id: &str, process_id: &str) -> bool {
        self.pairings.contains(&ProductProcess {
            product_id: product_id.to_string(),
            process_id: process_id.to_string(),
        })
    }

    async fn product_name(&self, product_id: &str) -> Option<String> {
        self.seed
            .products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.name.clone())
    }

    async fn process_name(&self, process_id: &str) -> Option<String> {
        self.seed
            .processes
            .iter()
            .find(|p| p.id == process_id)
            .map(|p| p.name.clone())
    }
}
