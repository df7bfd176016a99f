//! Trip invitation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::collaborator::{CollaboratorRole, UserRef};
use super::trip::TripId;

/// Lifecycle state of an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

/// A pending request for a user to join a trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "trip")]
    pub trip_id: TripId,
    #[serde(default)]
    pub trip_destination: Option<String>,
    pub inviter: UserRef,
    pub invitee_email: String,
    #[serde(default)]
    pub role: CollaboratorRole,
    pub status: InvitationStatus,
    pub sent_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Invitation {
    /// Status with passive expiry applied.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.status == InvitationStatus::Pending && now >= self.expires_at {
            InvitationStatus::Expired
        } else {
            self.status
        }
    }

    /// Only pending, unexpired invitations can be accepted or declined.
    #[must_use]
    pub fn is_actionable(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == InvitationStatus::Pending
    }
}

/// Payload for inviting someone to a trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitation {
    pub trip_id: TripId,
    pub email: String,
    pub role: CollaboratorRole,
}
