// tyr-service/src/models/invitations.rs
use crate::models::TeamRole;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// Status for team invitations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InvitationStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "accepted")]
    Accepted,
    #[serde(rename = "declined")]
    Declined,
    #[serde(rename = "expired")]
    Expired,
}

// Team invitation model. Invitations target a known actor id; resolving
// emails to identities is the identity provider's job.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TeamInvitation {
    pub id: String,
    pub team_id: String,
    pub invited_user_id: String,
    pub invited_by: String,
    pub role: TeamRole,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
    pub status: InvitationStatus,
}

// Request to create a new invitation
#[derive(Serialize, Deserialize, Debug)]
pub struct CreateInvitationRequest {
    pub user_id: String,
    pub role: TeamRole,
}

impl TeamInvitation {
    // Create a new invitation with default values
    pub fn new(
        team_id: String,
        invited_user_id: String,
        invited_by: String,
        role: TeamRole,
    ) -> Self {
        let now = Utc::now();
        // Invitations expire after 7 days by default
        let expires_at = now + Duration::days(7);

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            team_id,
            invited_user_id,
            invited_by,
            role,
            created_at: now,
            expires_at,
            status: InvitationStatus::Pending,
        }
    }

    // Check if invitation is expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
