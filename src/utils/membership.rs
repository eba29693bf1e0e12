// tyr-service/src/utils/membership.rs
//
// Membership mutators. Every change to a membership set goes through here so
// the invariants (no duplicate records, owner protection, bundle derived from
// the role table) hold at a single place.
//
// Each mutator is a read-modify-write against the store's conditional save;
// a stale save is retried against a fresh copy a bounded number of times
// before the conflict surfaces to the caller.
use crate::models::{
    Actor, InvitationStatus, Project, ProjectData, ProjectMember, ProjectRole, ServiceError, Task,
    TaskData, Team, TeamData, TeamInvitation, TeamMember, TeamRole,
};
use crate::utils::membership_store::MembershipStore;
use log::{debug, info};

// Retry budget for stale conditional saves
const MAX_SAVE_ATTEMPTS: u32 = 3;

// Read-modify-write loop for a team. `apply` runs against a fresh copy on
// every attempt; its error short-circuits, a stale save retries.
pub(crate) fn update_team<T>(
    store: &MembershipStore,
    team_id: &str,
    mut apply: impl FnMut(&mut Team) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    for _ in 0..MAX_SAVE_ATTEMPTS {
        let mut team = store
            .find_team_by_id(team_id)?
            .ok_or(ServiceError::NotFound)?;
        let result = apply(&mut team)?;
        match store.save_team(&team) {
            Ok(_) => return Ok(result),
            Err(ServiceError::Conflict(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(ServiceError::Conflict(format!(
        "Team {} kept changing concurrently, giving up",
        team_id
    )))
}

fn update_project<T>(
    store: &MembershipStore,
    project_id: &str,
    mut apply: impl FnMut(&mut Project) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    for _ in 0..MAX_SAVE_ATTEMPTS {
        let mut project = store
            .find_project_by_id(project_id)?
            .ok_or(ServiceError::NotFound)?;
        let result = apply(&mut project)?;
        match store.save_project(&project) {
            Ok(_) => return Ok(result),
            Err(ServiceError::Conflict(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(ServiceError::Conflict(format!(
        "Project {} kept changing concurrently, giving up",
        project_id
    )))
}

fn update_task<T>(
    store: &MembershipStore,
    task_id: &str,
    mut apply: impl FnMut(&mut Task) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    for _ in 0..MAX_SAVE_ATTEMPTS {
        let mut task = store
            .find_task_by_id(task_id)?
            .ok_or(ServiceError::NotFound)?;
        let result = apply(&mut task)?;
        match store.save_task(&task) {
            Ok(_) => return Ok(result),
            Err(ServiceError::Conflict(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(ServiceError::Conflict(format!(
        "Task {} kept changing concurrently, giving up",
        task_id
    )))
}

// Team lifecycle and membership

// Create a new team with the creator as owner
pub fn create_team(
    store: &MembershipStore,
    data: &TeamData,
    creator: &Actor,
) -> Result<Team, ServiceError> {
    let team = Team::new(data.name.clone(), creator.id.clone());
    let saved = store.save_team(&team)?;
    info!("✅ Team created: {} by user: {}", saved.id, creator.id);
    Ok(saved)
}

// Add a user to a team. Fails when the user already holds a record.
pub fn add_team_member(
    store: &MembershipStore,
    team_id: &str,
    user_id: &str,
    role: TeamRole,
    invited_by: Option<String>,
) -> Result<TeamMember, ServiceError> {
    let member = update_team(store, team_id, |team| {
        if team.member(user_id).is_some() {
            return Err(ServiceError::AlreadyMember);
        }
        let member = TeamMember::new(user_id, role, invited_by.clone());
        team.members.push(member.clone());
        Ok(member)
    })?;

    info!("👥 User: {} added to team: {} with role: {:?}", user_id, team_id, role);
    Ok(member)
}

// Remove a user from a team. The owner can never be removed; removing a
// non-member is a no-op that writes nothing.
pub fn remove_team_member(
    store: &MembershipStore,
    team_id: &str,
    user_id: &str,
) -> Result<(), ServiceError> {
    for _ in 0..MAX_SAVE_ATTEMPTS {
        let mut team = store
            .find_team_by_id(team_id)?
            .ok_or(ServiceError::NotFound)?;
        if team.owner_id == user_id {
            return Err(ServiceError::OwnerProtected);
        }
        let before = team.members.len();
        team.members.retain(|m| m.user_id != user_id);
        if team.members.len() == before {
            debug!("User: {} was not a member of team: {}, nothing to remove", user_id, team_id);
            return Ok(());
        }
        match store.save_team(&team) {
            Ok(_) => {
                info!("🗑️ User: {} removed from team: {}", user_id, team_id);
                return Ok(());
            }
            Err(ServiceError::Conflict(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(ServiceError::Conflict(format!(
        "Team {} kept changing concurrently, giving up",
        team_id
    )))
}

// Change a member's role. The permission bundle is recomputed from the role
// table; the owner's record is protected.
pub fn update_team_member_role(
    store: &MembershipStore,
    team_id: &str,
    user_id: &str,
    new_role: TeamRole,
) -> Result<TeamMember, ServiceError> {
    let member = update_team(store, team_id, |team| {
        if team.owner_id == user_id {
            return Err(ServiceError::OwnerProtected);
        }
        let member = team
            .members
            .iter_mut()
            .find(|m| m.user_id == user_id)
            .ok_or(ServiceError::NotAMember)?;
        member.role = new_role;
        member.permissions = new_role.permissions();
        Ok(member.clone())
    })?;

    info!("🔄 User: {} in team: {} is now: {:?}", user_id, team_id, new_role);
    Ok(member)
}

// Project lifecycle and membership

// Create a project, optionally under a team. The creator becomes owner and
// lead member.
pub fn create_project(
    store: &MembershipStore,
    data: &ProjectData,
    creator: &Actor,
) -> Result<Project, ServiceError> {
    if let Some(team_id) = &data.team_id {
        if store.find_team_by_id(team_id)?.is_none() {
            return Err(ServiceError::NotFound);
        }
    }

    let project = Project::new(data.name.clone(), creator.id.clone(), data.team_id.clone());
    let saved = store.save_project(&project)?;
    info!("✅ Project created: {} by user: {} (team: {:?})", saved.id, creator.id, saved.team_id);
    Ok(saved)
}

// Add a user to a project, defaulting to the developer role
pub fn add_project_member(
    store: &MembershipStore,
    project_id: &str,
    user_id: &str,
    role: Option<ProjectRole>,
) -> Result<ProjectMember, ServiceError> {
    let role = role.unwrap_or_default();
    let member = update_project(store, project_id, |project| {
        if project.member(user_id).is_some() {
            return Err(ServiceError::AlreadyMember);
        }
        let member = ProjectMember::new(user_id, role);
        project.members.push(member.clone());
        Ok(member)
    })?;

    info!("👥 User: {} added to project: {} with role: {:?}", user_id, project_id, role);
    Ok(member)
}

// Remove a user from a project. Only the literal owner field is protected;
// lead members can be removed like anyone else. Removing a non-member is a
// no-op that writes nothing.
pub fn remove_project_member(
    store: &MembershipStore,
    project_id: &str,
    user_id: &str,
) -> Result<(), ServiceError> {
    for _ in 0..MAX_SAVE_ATTEMPTS {
        let mut project = store
            .find_project_by_id(project_id)?
            .ok_or(ServiceError::NotFound)?;
        if project.owner_id == user_id {
            return Err(ServiceError::OwnerProtected);
        }
        let before = project.members.len();
        project.members.retain(|m| m.user_id != user_id);
        if project.members.len() == before {
            debug!("User: {} was not a member of project: {}, nothing to remove", user_id, project_id);
            return Ok(());
        }
        match store.save_project(&project) {
            Ok(_) => {
                info!("🗑️ User: {} removed from project: {}", user_id, project_id);
                return Ok(());
            }
            Err(ServiceError::Conflict(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(ServiceError::Conflict(format!(
        "Project {} kept changing concurrently, giving up",
        project_id
    )))
}

pub fn update_project_member_role(
    store: &MembershipStore,
    project_id: &str,
    user_id: &str,
    new_role: ProjectRole,
) -> Result<ProjectMember, ServiceError> {
    let member = update_project(store, project_id, |project| {
        if project.owner_id == user_id {
            return Err(ServiceError::OwnerProtected);
        }
        let member = project
            .members
            .iter_mut()
            .find(|m| m.user_id == user_id)
            .ok_or(ServiceError::NotAMember)?;
        member.role = new_role;
        member.permissions = new_role.permissions();
        Ok(member.clone())
    })?;

    info!("🔄 User: {} in project: {} is now: {:?}", user_id, project_id, new_role);
    Ok(member)
}

pub fn archive_project(store: &MembershipStore, project_id: &str) -> Result<Project, ServiceError> {
    update_project(store, project_id, |project| {
        project.is_archived = true;
        Ok(project.clone())
    })
}

// Task lifecycle

// Create a task. The creator always starts as a watcher; an initial assignee
// joins the watchers as well. The team reference is copied from the project.
pub fn create_task(
    store: &MembershipStore,
    data: &TaskData,
    creator: &Actor,
) -> Result<Task, ServiceError> {
    let team_id = match &data.project_id {
        Some(project_id) => {
            let project = store
                .find_project_by_id(project_id)?
                .ok_or(ServiceError::NotFound)?;
            project.team_id
        }
        None => None,
    };

    let mut task = Task::new(
        data.title.clone(),
        creator.id.clone(),
        data.project_id.clone(),
        team_id,
    );
    if let Some(assignee) = &data.assigned_to {
        task.assigned_to = Some(assignee.clone());
        if !task.is_watcher(assignee) {
            task.watchers.push(assignee.clone());
        }
    }

    let saved = store.save_task(&task)?;
    info!("✅ Task created: {} by user: {}", saved.id, creator.id);
    Ok(saved)
}

// Assign (or unassign) a task. A new assignee is always added to the
// watchers so they see subsequent changes.
pub fn assign_task(
    store: &MembershipStore,
    task_id: &str,
    assignee: Option<String>,
) -> Result<Task, ServiceError> {
    let task = update_task(store, task_id, |task| {
        task.assigned_to = assignee.clone();
        if let Some(user_id) = &assignee {
            if !task.is_watcher(user_id) {
                task.watchers.push(user_id.clone());
            }
        }
        Ok(task.clone())
    })?;

    info!("🔄 Task: {} assigned to: {:?}", task_id, task.assigned_to);
    Ok(task)
}

pub fn update_task_title(
    store: &MembershipStore,
    task_id: &str,
    title: &str,
) -> Result<Task, ServiceError> {
    update_task(store, task_id, |task| {
        task.title = title.to_string();
        Ok(task.clone())
    })
}

// Idempotent watcher insert
pub fn add_task_watcher(
    store: &MembershipStore,
    task_id: &str,
    user_id: &str,
) -> Result<Task, ServiceError> {
    update_task(store, task_id, |task| {
        if !task.is_watcher(user_id) {
            task.watchers.push(user_id.to_string());
        }
        Ok(task.clone())
    })
}

// Invitations

// Create a team invitation. Rejects when the user is already a member or
// already has a pending invitation to the same team.
pub fn create_invitation(
    store: &MembershipStore,
    team: &Team,
    invited_user_id: &str,
    role: TeamRole,
    invited_by: &str,
) -> Result<TeamInvitation, ServiceError> {
    if team.member(invited_user_id).is_some() || team.owner_id == invited_user_id {
        return Err(ServiceError::AlreadyMember);
    }

    if store.has_pending_invitation(&team.id, invited_user_id)? {
        return Err(ServiceError::BadRequest(
            "An invitation for this user to this team already exists".to_string(),
        ));
    }

    let invitation = TeamInvitation::new(
        team.id.clone(),
        invited_user_id.to_string(),
        invited_by.to_string(),
        role,
    );
    store.save_invitation(&invitation)?;

    info!("📧 Invitation created: {} to team: {} for user: {}", invitation.id, team.id, invited_user_id);
    Ok(invitation)
}

// Accept or decline a pending invitation. Accepting adds the membership
// record with the inviter recorded on it; expired invitations flip to
// Expired and fail.
pub fn respond_invitation(
    store: &MembershipStore,
    invitation: &TeamInvitation,
    accept: bool,
) -> Result<TeamInvitation, ServiceError> {
    // Don't update if already accepted or declined
    if invitation.status != InvitationStatus::Pending {
        return Err(ServiceError::BadRequest(format!(
            "Invitation is already {}",
            match invitation.status {
                InvitationStatus::Accepted => "accepted",
                InvitationStatus::Declined => "declined",
                InvitationStatus::Expired => "expired",
                InvitationStatus::Pending => "pending",
            }
        )));
    }

    if invitation.is_expired() {
        let mut expired = invitation.clone();
        expired.status = InvitationStatus::Expired;
        store.save_invitation(&expired)?;
        return Err(ServiceError::BadRequest("Invitation has expired".to_string()));
    }

    let mut updated = invitation.clone();
    if accept {
        add_team_member(
            store,
            &invitation.team_id,
            &invitation.invited_user_id,
            invitation.role,
            Some(invitation.invited_by.clone()),
        )?;
        updated.status = InvitationStatus::Accepted;
    } else {
        updated.status = InvitationStatus::Declined;
    }
    store.save_invitation(&updated)?;

    info!("📧 Invitation: {} is now: {:?}", updated.id, updated.status);
    Ok(updated)
}
