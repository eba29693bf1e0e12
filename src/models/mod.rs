// tyr-service/src/models/mod.rs
use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// Role and permission tables
pub mod permissions;
pub use permissions::*;

// Invitation models
pub mod invitations;
pub use invitations::*;

// Authenticated identity handed to the core by the identity provider.
// Read-only here: the core never creates or mutates actors.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub global_role: GlobalRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, global_role: GlobalRole) -> Self {
        Self { id: id.into(), global_role }
    }

    pub fn is_admin(&self) -> bool {
        self.global_role == GlobalRole::Admin
    }
}

// Team models
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub is_active: bool,
    pub members: Vec<TeamMember>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    // Bumped by the store on every successful save (conditional update)
    pub version: u64,
}

impl Team {
    // Create a team with the creator recorded as owner and inserted as an
    // owner-role member
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        let owner_id = owner_id.into();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            owner_id: owner_id.clone(),
            is_active: true,
            members: vec![TeamMember::new(owner_id, TeamRole::Owner, None)],
            created_at: Utc::now(),
            version: 0,
        }
    }

    pub fn member(&self, user_id: &str) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TeamMember {
    pub user_id: String,
    pub role: TeamRole,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub joined_at: DateTime<Utc>,
    pub invited_by: Option<String>,
    pub permissions: TeamPermissions,
}

impl TeamMember {
    // The permission bundle always comes from the role table; records are
    // only built here so the two can never drift apart
    pub fn new(user_id: impl Into<String>, role: TeamRole, invited_by: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            joined_at: Utc::now(),
            invited_by,
            permissions: role.permissions(),
        }
    }
}

// Project models
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    // A project may be team-less and owned directly by a user
    pub team_id: Option<String>,
    pub is_archived: bool,
    pub members: Vec<ProjectMember>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Project {
    // The creator is recorded as owner and inserted as a lead member
    pub fn new(
        name: impl Into<String>,
        owner_id: impl Into<String>,
        team_id: Option<String>,
    ) -> Self {
        let owner_id = owner_id.into();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            owner_id: owner_id.clone(),
            team_id,
            is_archived: false,
            members: vec![ProjectMember::new(owner_id, ProjectRole::Lead)],
            created_at: Utc::now(),
            version: 0,
        }
    }

    pub fn member(&self, user_id: &str) -> Option<&ProjectMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProjectMember {
    pub user_id: String,
    pub role: ProjectRole,
    pub permissions: ProjectPermissions,
}

impl ProjectMember {
    pub fn new(user_id: impl Into<String>, role: ProjectRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            permissions: role.permissions(),
        }
    }
}

// Task model
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub project_id: Option<String>,
    // Copied from the project's team at creation for fast filtering
    pub team_id: Option<String>,
    pub created_by: String,
    pub assigned_to: Option<String>,
    // The creator is always a watcher; an assignee joins on assignment
    pub watchers: Vec<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        created_by: impl Into<String>,
        project_id: Option<String>,
        team_id: Option<String>,
    ) -> Self {
        let created_by = created_by.into();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            project_id,
            team_id,
            created_by: created_by.clone(),
            assigned_to: None,
            watchers: vec![created_by],
            created_at: Utc::now(),
            version: 0,
        }
    }

    pub fn is_watcher(&self, user_id: &str) -> bool {
        self.watchers.iter().any(|w| w == user_id)
    }
}

// Request payloads
#[derive(Serialize, Deserialize, Debug)]
pub struct TeamData {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProjectData {
    pub name: String,
    pub team_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TaskData {
    pub title: String,
    pub project_id: Option<String>,
    pub assigned_to: Option<String>,
}

// Custom error types
#[derive(Debug, PartialEq)]
pub enum ServiceError {
    InternalServerError,
    BadRequest(String),
    Unauthorized,
    NotFound,
    Forbidden,
    AlreadyMember,
    NotAMember,
    OwnerProtected,
    Conflict(String),
}

// Implement Display for ServiceError
impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceError::InternalServerError => write!(f, "Internal Server Error"),
            ServiceError::BadRequest(msg) => write!(f, "BadRequest: {}", msg),
            ServiceError::Unauthorized => write!(f, "Unauthorized"),
            ServiceError::NotFound => write!(f, "Not Found"),
            ServiceError::Forbidden => write!(f, "Forbidden"),
            ServiceError::AlreadyMember => write!(f, "Already a member"),
            ServiceError::NotAMember => write!(f, "Not a member"),
            ServiceError::OwnerProtected => write!(f, "Owner membership cannot be changed"),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
        }
    }
}

// Implement std::error::Error for ServiceError
impl std::error::Error for ServiceError {}

// Status-code mapping for the hosting actix service; the core itself only
// constructs the variants and never inspects responses.
impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::InternalServerError =>
                HttpResponse::InternalServerError().json("Internal Server Error"),
            ServiceError::BadRequest(ref message) =>
                HttpResponse::BadRequest().json(message),
            ServiceError::Unauthorized =>
                HttpResponse::Unauthorized().json("Unauthorized"),
            ServiceError::NotFound =>
                HttpResponse::NotFound().json("Not Found"),
            ServiceError::Forbidden =>
                HttpResponse::Forbidden().json("Forbidden: You don't have permission to access this resource"),
            ServiceError::AlreadyMember =>
                HttpResponse::Conflict().json("User is already a member"),
            ServiceError::NotAMember =>
                HttpResponse::NotFound().json("User is not a member"),
            ServiceError::OwnerProtected =>
                HttpResponse::BadRequest().json("The owner's membership cannot be changed or removed"),
            ServiceError::Conflict(ref message) =>
                HttpResponse::Conflict().json(message),
        }
    }
}
