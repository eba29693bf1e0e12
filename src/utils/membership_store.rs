// tyr-service/src/utils/membership_store.rs
use crate::models::{InvitationStatus, Project, ServiceError, Task, Team, TeamInvitation};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// Authoritative membership store. Holds the single copy of every membership
// record; per-actor views are derived at query time instead of being kept in
// sync on the actor side.
//
// Saves are conditional on the entity version, so two concurrent
// read-modify-write cycles against the same entity can never interleave into
// an inconsistent record.
#[derive(Clone)]
pub struct MembershipStore {
    teams: Arc<Mutex<HashMap<String, Team>>>,
    projects: Arc<Mutex<HashMap<String, Project>>>,
    tasks: Arc<Mutex<HashMap<String, Task>>>,
    invitations: Arc<Mutex<HashMap<String, TeamInvitation>>>,
}

impl MembershipStore {
    pub fn new() -> Self {
        Self {
            teams: Arc::new(Mutex::new(HashMap::new())),
            projects: Arc::new(Mutex::new(HashMap::new())),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            invitations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock<'a, T>(
        mutex: &'a Mutex<HashMap<String, T>>,
    ) -> Result<std::sync::MutexGuard<'a, HashMap<String, T>>, ServiceError> {
        mutex.lock().map_err(|_| ServiceError::InternalServerError)
    }

    // Team storage

    pub fn find_team_by_id(&self, team_id: &str) -> Result<Option<Team>, ServiceError> {
        let teams = Self::lock(&self.teams)?;
        Ok(teams.get(team_id).cloned())
    }

    // Save a team, conditional on the caller holding the current version.
    // Returns the saved copy with its version bumped.
    pub fn save_team(&self, team: &Team) -> Result<Team, ServiceError> {
        let mut teams = Self::lock(&self.teams)?;

        if let Some(existing) = teams.get(&team.id) {
            if existing.version != team.version {
                debug!(
                    "Stale save for team: {} (held version {}, stored {})",
                    team.id, team.version, existing.version
                );
                return Err(ServiceError::Conflict(format!(
                    "Team {} was modified concurrently",
                    team.id
                )));
            }
        }

        let mut saved = team.clone();
        saved.version += 1;
        teams.insert(saved.id.clone(), saved.clone());
        Ok(saved)
    }

    // Delete a team and cascade: detach the team reference from its projects
    // (and the denormalized copy on their tasks) and drop its invitations
    pub fn delete_team(&self, team_id: &str) -> Result<bool, ServiceError> {
        let removed = {
            let mut teams = Self::lock(&self.teams)?;
            teams.remove(team_id).is_some()
        };

        if !removed {
            return Ok(false);
        }

        {
            let mut projects = Self::lock(&self.projects)?;
            for project in projects.values_mut() {
                if project.team_id.as_deref() == Some(team_id) {
                    project.team_id = None;
                    project.version += 1;
                }
            }
        }

        {
            let mut tasks = Self::lock(&self.tasks)?;
            for task in tasks.values_mut() {
                if task.team_id.as_deref() == Some(team_id) {
                    task.team_id = None;
                    task.version += 1;
                }
            }
        }

        {
            let mut invitations = Self::lock(&self.invitations)?;
            invitations.retain(|_, inv| inv.team_id != team_id);
        }

        info!("🗑️ Deleted team: {} (projects detached, invitations purged)", team_id);
        Ok(true)
    }

    // Derived per-actor view of team membership: teams the user owns or is a
    // member of. Replaces a denormalized team list on the actor.
    pub fn teams_for_user(&self, user_id: &str) -> Result<Vec<Team>, ServiceError> {
        let teams = Self::lock(&self.teams)?;
        Ok(teams
            .values()
            .filter(|t| t.owner_id == user_id || t.member(user_id).is_some())
            .cloned()
            .collect())
    }

    // Project storage

    pub fn find_project_by_id(&self, project_id: &str) -> Result<Option<Project>, ServiceError> {
        let projects = Self::lock(&self.projects)?;
        Ok(projects.get(project_id).cloned())
    }

    pub fn save_project(&self, project: &Project) -> Result<Project, ServiceError> {
        let mut projects = Self::lock(&self.projects)?;

        if let Some(existing) = projects.get(&project.id) {
            if existing.version != project.version {
                debug!(
                    "Stale save for project: {} (held version {}, stored {})",
                    project.id, project.version, existing.version
                );
                return Err(ServiceError::Conflict(format!(
                    "Project {} was modified concurrently",
                    project.id
                )));
            }
        }

        let mut saved = project.clone();
        saved.version += 1;
        projects.insert(saved.id.clone(), saved.clone());
        Ok(saved)
    }

    // Delete a project and its tasks
    pub fn delete_project(&self, project_id: &str) -> Result<bool, ServiceError> {
        let removed = {
            let mut projects = Self::lock(&self.projects)?;
            projects.remove(project_id).is_some()
        };

        if !removed {
            return Ok(false);
        }

        let mut tasks = Self::lock(&self.tasks)?;
        let before = tasks.len();
        tasks.retain(|_, task| task.project_id.as_deref() != Some(project_id));
        info!(
            "🗑️ Deleted project: {} and {} of its tasks",
            project_id,
            before - tasks.len()
        );
        Ok(true)
    }

    pub fn projects_for_team(&self, team_id: &str) -> Result<Vec<Project>, ServiceError> {
        let projects = Self::lock(&self.projects)?;
        Ok(projects
            .values()
            .filter(|p| p.team_id.as_deref() == Some(team_id))
            .cloned()
            .collect())
    }

    pub fn projects_for_user(&self, user_id: &str) -> Result<Vec<Project>, ServiceError> {
        let projects = Self::lock(&self.projects)?;
        Ok(projects
            .values()
            .filter(|p| p.owner_id == user_id || p.member(user_id).is_some())
            .cloned()
            .collect())
    }

    // Task storage

    pub fn find_task_by_id(&self, task_id: &str) -> Result<Option<Task>, ServiceError> {
        let tasks = Self::lock(&self.tasks)?;
        Ok(tasks.get(task_id).cloned())
    }

    pub fn save_task(&self, task: &Task) -> Result<Task, ServiceError> {
        let mut tasks = Self::lock(&self.tasks)?;

        if let Some(existing) = tasks.get(&task.id) {
            if existing.version != task.version {
                debug!(
                    "Stale save for task: {} (held version {}, stored {})",
                    task.id, task.version, existing.version
                );
                return Err(ServiceError::Conflict(format!(
                    "Task {} was modified concurrently",
                    task.id
                )));
            }
        }

        let mut saved = task.clone();
        saved.version += 1;
        tasks.insert(saved.id.clone(), saved.clone());
        Ok(saved)
    }

    pub fn delete_task(&self, task_id: &str) -> Result<bool, ServiceError> {
        let mut tasks = Self::lock(&self.tasks)?;
        Ok(tasks.remove(task_id).is_some())
    }

    pub fn tasks_for_project(&self, project_id: &str) -> Result<Vec<Task>, ServiceError> {
        let tasks = Self::lock(&self.tasks)?;
        Ok(tasks
            .values()
            .filter(|t| t.project_id.as_deref() == Some(project_id))
            .cloned()
            .collect())
    }

    // Invitation storage

    pub fn find_invitation_by_id(
        &self,
        invitation_id: &str,
    ) -> Result<Option<TeamInvitation>, ServiceError> {
        let invitations = Self::lock(&self.invitations)?;
        Ok(invitations.get(invitation_id).cloned())
    }

    pub fn save_invitation(&self, invitation: &TeamInvitation) -> Result<(), ServiceError> {
        let mut invitations = Self::lock(&self.invitations)?;
        invitations.insert(invitation.id.clone(), invitation.clone());
        Ok(())
    }

    pub fn delete_invitation(&self, invitation_id: &str) -> Result<bool, ServiceError> {
        let mut invitations = Self::lock(&self.invitations)?;
        Ok(invitations.remove(invitation_id).is_some())
    }

    // Get all invitations addressed to a user
    pub fn invitations_for_user(&self, user_id: &str) -> Result<Vec<TeamInvitation>, ServiceError> {
        let invitations = Self::lock(&self.invitations)?;
        Ok(invitations
            .values()
            .filter(|inv| inv.invited_user_id == user_id)
            .cloned()
            .collect())
    }

    // Get all invitations for a team
    pub fn invitations_for_team(&self, team_id: &str) -> Result<Vec<TeamInvitation>, ServiceError> {
        let invitations = Self::lock(&self.invitations)?;
        Ok(invitations
            .values()
            .filter(|inv| inv.team_id == team_id)
            .cloned()
            .collect())
    }

    // True when the user already has a pending, unexpired invitation to the team
    pub fn has_pending_invitation(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<bool, ServiceError> {
        let invitations = Self::lock(&self.invitations)?;
        Ok(invitations.values().any(|inv| {
            inv.team_id == team_id
                && inv.invited_user_id == user_id
                && inv.status == InvitationStatus::Pending
                && !inv.is_expired()
        }))
    }
}

impl Default for MembershipStore {
    fn default() -> Self {
        Self::new()
    }
}

// Process-wide default store for the hosting service. Tests build their own
// instances instead.
lazy_static::lazy_static! {
    pub static ref MEMBERSHIP_STORE: MembershipStore = MembershipStore::new();
}
