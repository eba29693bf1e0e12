// tyr-service/src/utils/guard.rs
//
// The access guard wraps every protected operation: resolve the actor, load
// the target entity and its parent chain, ask the resolver, and only then
// delegate. A missing entity is NotFound before any access decision is made;
// a denial is Forbidden and happens before any side effect.
use crate::models::{
    Actor, CreateInvitationRequest, Project, ProjectData, ProjectMember, ProjectRole,
    ServiceError, Task, TaskData, Team, TeamData, TeamInvitation, TeamMember, TeamRole,
};
use crate::utils::access_control::{self, Capability, TaskCapability};
use crate::utils::identity::{IdentityProvider, RequestContext};
use crate::utils::membership;
use crate::utils::membership_store::{MembershipStore, MEMBERSHIP_STORE};
use log::{error, info};

pub struct AccessGuard<'a, I: IdentityProvider> {
    identity: &'a I,
    store: &'a MembershipStore,
}

impl<'a, I: IdentityProvider> AccessGuard<'a, I> {
    pub fn new(identity: &'a I, store: &'a MembershipStore) -> Self {
        Self { identity, store }
    }

    // Guard over the process-wide default store
    pub fn with_default_store(identity: &'a I) -> Self {
        Self {
            identity,
            store: &MEMBERSHIP_STORE,
        }
    }

    // Actor resolution and entity loading

    fn actor(&self, ctx: &RequestContext) -> Result<Actor, ServiceError> {
        self.identity.current_actor(ctx)
    }

    fn load_team(&self, team_id: &str) -> Result<Team, ServiceError> {
        self.store
            .find_team_by_id(team_id)?
            .ok_or(ServiceError::NotFound)
    }

    // Load a project together with its team, when it has one. The resolver
    // needs the parent chain in hand to apply the cascade.
    fn load_project_chain(&self, project_id: &str) -> Result<(Project, Option<Team>), ServiceError> {
        let project = self
            .store
            .find_project_by_id(project_id)?
            .ok_or(ServiceError::NotFound)?;
        let team = match &project.team_id {
            Some(team_id) => self.store.find_team_by_id(team_id)?,
            None => None,
        };
        Ok((project, team))
    }

    fn load_task_chain(
        &self,
        task_id: &str,
    ) -> Result<(Task, Option<Project>, Option<Team>), ServiceError> {
        let task = self
            .store
            .find_task_by_id(task_id)?
            .ok_or(ServiceError::NotFound)?;
        let (project, team) = match &task.project_id {
            Some(project_id) => {
                let project = self.store.find_project_by_id(project_id)?;
                let team = match project.as_ref().and_then(|p| p.team_id.clone()) {
                    Some(team_id) => self.store.find_team_by_id(&team_id)?,
                    None => None,
                };
                (project, team)
            }
            None => (None, None),
        };
        Ok((task, project, team))
    }

    // Authorization helpers: load, resolve, fail closed

    fn authorize_team(
        &self,
        actor: &Actor,
        team_id: &str,
        capability: Capability,
    ) -> Result<Team, ServiceError> {
        let team = self.load_team(team_id)?;
        if !access_control::can_access_team(actor, &team, capability) {
            error!("❌ User: {} denied {:?} on team: {}", actor.id, capability, team_id);
            return Err(ServiceError::Forbidden);
        }
        Ok(team)
    }

    fn authorize_project(
        &self,
        actor: &Actor,
        project_id: &str,
        capability: Capability,
    ) -> Result<(Project, Option<Team>), ServiceError> {
        let (project, team) = self.load_project_chain(project_id)?;
        if !access_control::can_access_project(actor, &project, team.as_ref(), capability) {
            error!("❌ User: {} denied {:?} on project: {}", actor.id, capability, project_id);
            return Err(ServiceError::Forbidden);
        }
        Ok((project, team))
    }

    fn authorize_task(
        &self,
        actor: &Actor,
        task_id: &str,
        capability: TaskCapability,
    ) -> Result<Task, ServiceError> {
        let (task, project, team) = self.load_task_chain(task_id)?;
        if !access_control::can_access_task(
            actor,
            &task,
            project.as_ref(),
            team.as_ref(),
            capability,
        ) {
            error!("❌ User: {} denied {:?} on task: {}", actor.id, capability, task_id);
            return Err(ServiceError::Forbidden);
        }
        Ok(task)
    }

    // Team operations

    // Any authenticated actor may create a team
    pub fn create_team(&self, ctx: &RequestContext, data: &TeamData) -> Result<Team, ServiceError> {
        let actor = self.actor(ctx)?;
        membership::create_team(self.store, data, &actor)
    }

    pub fn get_team(&self, ctx: &RequestContext, team_id: &str) -> Result<Team, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_team(&actor, team_id, Capability::Read)
    }

    // Teams the actor owns or belongs to, from the store's derived index
    pub fn list_teams(&self, ctx: &RequestContext) -> Result<Vec<Team>, ServiceError> {
        let actor = self.actor(ctx)?;
        self.store.teams_for_user(&actor.id)
    }

    pub fn get_team_members(
        &self,
        ctx: &RequestContext,
        team_id: &str,
    ) -> Result<Vec<TeamMember>, ServiceError> {
        let actor = self.actor(ctx)?;
        let team = self.authorize_team(&actor, team_id, Capability::Read)?;
        Ok(team.members)
    }

    pub fn add_team_member(
        &self,
        ctx: &RequestContext,
        team_id: &str,
        user_id: &str,
        role: TeamRole,
    ) -> Result<TeamMember, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_team(&actor, team_id, Capability::Manage)?;
        membership::add_team_member(self.store, team_id, user_id, role, Some(actor.id))
    }

    // Members may remove themselves; removing anyone else takes manage
    // access. Owner protection is enforced by the mutator either way.
    pub fn remove_team_member(
        &self,
        ctx: &RequestContext,
        team_id: &str,
        user_id: &str,
    ) -> Result<(), ServiceError> {
        let actor = self.actor(ctx)?;
        if actor.id == user_id {
            self.load_team(team_id)?;
        } else {
            self.authorize_team(&actor, team_id, Capability::Manage)?;
        }
        membership::remove_team_member(self.store, team_id, user_id)
    }

    pub fn update_team_member_role(
        &self,
        ctx: &RequestContext,
        team_id: &str,
        user_id: &str,
        new_role: TeamRole,
    ) -> Result<TeamMember, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_team(&actor, team_id, Capability::Manage)?;
        membership::update_team_member_role(self.store, team_id, user_id, new_role)
    }

    // Only the team owner (or a global admin) may delete a team
    pub fn delete_team(&self, ctx: &RequestContext, team_id: &str) -> Result<(), ServiceError> {
        let actor = self.actor(ctx)?;
        let team = self.load_team(team_id)?;

        if team.owner_id != actor.id && !actor.is_admin() {
            error!("❌ User: {} may not delete team: {}", actor.id, team_id);
            return Err(ServiceError::Forbidden);
        }

        self.store.delete_team(team_id)?;
        Ok(())
    }

    // Invitation operations

    pub fn invite_to_team(
        &self,
        ctx: &RequestContext,
        team_id: &str,
        data: &CreateInvitationRequest,
    ) -> Result<TeamInvitation, ServiceError> {
        let actor = self.actor(ctx)?;
        let team = self.authorize_team(&actor, team_id, Capability::Manage)?;
        membership::create_invitation(self.store, &team, &data.user_id, data.role, &actor.id)
    }

    pub fn list_team_invitations(
        &self,
        ctx: &RequestContext,
        team_id: &str,
    ) -> Result<Vec<TeamInvitation>, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_team(&actor, team_id, Capability::Manage)?;
        self.store.invitations_for_team(team_id)
    }

    pub fn list_my_invitations(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<TeamInvitation>, ServiceError> {
        let actor = self.actor(ctx)?;
        self.store.invitations_for_user(&actor.id)
    }

    // Only the invitee may accept or decline
    pub fn respond_to_invitation(
        &self,
        ctx: &RequestContext,
        invitation_id: &str,
        accept: bool,
    ) -> Result<TeamInvitation, ServiceError> {
        let actor = self.actor(ctx)?;
        let invitation = self
            .store
            .find_invitation_by_id(invitation_id)?
            .ok_or(ServiceError::NotFound)?;

        if invitation.invited_user_id != actor.id && !actor.is_admin() {
            error!("❌ User: {} may not respond to invitation: {}", actor.id, invitation_id);
            return Err(ServiceError::Forbidden);
        }

        membership::respond_invitation(self.store, &invitation, accept)
    }

    // Project operations

    // Creating a project under a team takes team manage access; a team-less
    // project only takes an authenticated actor.
    pub fn create_project(
        &self,
        ctx: &RequestContext,
        data: &ProjectData,
    ) -> Result<Project, ServiceError> {
        let actor = self.actor(ctx)?;
        if let Some(team_id) = &data.team_id {
            self.authorize_team(&actor, team_id, Capability::Manage)?;
        }
        membership::create_project(self.store, data, &actor)
    }

    pub fn get_project(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> Result<Project, ServiceError> {
        let actor = self.actor(ctx)?;
        let (project, _) = self.authorize_project(&actor, project_id, Capability::Read)?;
        Ok(project)
    }

    pub fn get_project_members(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> Result<Vec<ProjectMember>, ServiceError> {
        let actor = self.actor(ctx)?;
        let (project, _) = self.authorize_project(&actor, project_id, Capability::Read)?;
        Ok(project.members)
    }

    pub fn add_project_member(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        user_id: &str,
        role: Option<ProjectRole>,
    ) -> Result<ProjectMember, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_project(&actor, project_id, Capability::Manage)?;
        membership::add_project_member(self.store, project_id, user_id, role)
    }

    pub fn remove_project_member(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        user_id: &str,
    ) -> Result<(), ServiceError> {
        let actor = self.actor(ctx)?;
        if actor.id == user_id {
            self.load_project_chain(project_id)?;
        } else {
            self.authorize_project(&actor, project_id, Capability::Manage)?;
        }
        membership::remove_project_member(self.store, project_id, user_id)
    }

    pub fn update_project_member_role(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        user_id: &str,
        new_role: ProjectRole,
    ) -> Result<ProjectMember, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_project(&actor, project_id, Capability::Manage)?;
        membership::update_project_member_role(self.store, project_id, user_id, new_role)
    }

    pub fn archive_project(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> Result<Project, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_project(&actor, project_id, Capability::Manage)?;
        membership::archive_project(self.store, project_id)
    }

    // Only the project owner (or a global admin) may delete a project; its
    // tasks go with it
    pub fn delete_project(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> Result<(), ServiceError> {
        let actor = self.actor(ctx)?;
        let (project, _) = self.load_project_chain(project_id)?;

        if project.owner_id != actor.id && !actor.is_admin() {
            error!("❌ User: {} may not delete project: {}", actor.id, project_id);
            return Err(ServiceError::Forbidden);
        }

        self.store.delete_project(project_id)?;
        Ok(())
    }

    // Task operations

    // Anyone who can read the project may file a task under it; a task with
    // no project only takes an authenticated actor.
    pub fn create_task(&self, ctx: &RequestContext, data: &TaskData) -> Result<Task, ServiceError> {
        let actor = self.actor(ctx)?;
        if let Some(project_id) = &data.project_id {
            self.authorize_project(&actor, project_id, Capability::Read)?;
        }
        let task = membership::create_task(self.store, data, &actor)?;
        info!("✅ Task: {} filed by user: {}", task.id, actor.id);
        Ok(task)
    }

    pub fn get_task(&self, ctx: &RequestContext, task_id: &str) -> Result<Task, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_task(&actor, task_id, TaskCapability::Read)
    }

    pub fn update_task_title(
        &self,
        ctx: &RequestContext,
        task_id: &str,
        title: &str,
    ) -> Result<Task, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_task(&actor, task_id, TaskCapability::Update)?;
        membership::update_task_title(self.store, task_id, title)
    }

    pub fn assign_task(
        &self,
        ctx: &RequestContext,
        task_id: &str,
        assignee: Option<String>,
    ) -> Result<Task, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_task(&actor, task_id, TaskCapability::Update)?;
        membership::assign_task(self.store, task_id, assignee)
    }

    // The actor adds themself as a watcher; being able to read the task is
    // the only requirement
    pub fn watch_task(&self, ctx: &RequestContext, task_id: &str) -> Result<Task, ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_task(&actor, task_id, TaskCapability::Read)?;
        membership::add_task_watcher(self.store, task_id, &actor.id)
    }

    pub fn delete_task(&self, ctx: &RequestContext, task_id: &str) -> Result<(), ServiceError> {
        let actor = self.actor(ctx)?;
        self.authorize_task(&actor, task_id, TaskCapability::Delete)?;
        self.store.delete_task(task_id)?;
        info!("🗑️ Task deleted: {}", task_id);
        Ok(())
    }
}
