//! Pending action types.
//!
//! Each buffered mutation is one [`Action`] variant carrying its own typed
//! payload. The store keeps the wire name of the [`ActionType`] alongside
//! the JSON payload so rows can be decoded without inspecting the payload.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TitheError;

/// The closed set of mutation kinds that can be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Register a new member
    AddMember,
    /// Change a member's details
    UpdateMember,
    /// Remove a member
    DeleteMember,
    /// Record or correct a tithe amount
    UpdateTithe,
}

impl ActionType {
    /// All action types, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::AddMember,
        Self::UpdateMember,
        Self::DeleteMember,
        Self::UpdateTithe,
    ];

    /// Wire name, as stored in the database and used in JSON.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AddMember => "ADD_MEMBER",
            Self::UpdateMember => "UPDATE_MEMBER",
            Self::DeleteMember => "DELETE_MEMBER",
            Self::UpdateTithe => "UPDATE_TITHE",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::AddMember => "Add Member",
            Self::UpdateMember => "Update Member",
            Self::DeleteMember => "Delete Member",
            Self::UpdateTithe => "Update Tithe",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = TitheError;

    /// Accepts the wire name case-insensitively, with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| TitheError::InvalidAction(format!("unknown action type: {s}")))
    }
}

/// Payload for adding a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_on: Option<NaiveDate>,
}

impl AddMemberPayload {
    /// A payload carrying only the member's name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
            address: None,
            joined_on: None,
        }
    }
}

/// Payload for updating a member. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberPayload {
    pub member_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl UpdateMemberPayload {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.address.is_none()
    }
}

/// Payload for deleting a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMemberPayload {
    pub member_id: i64,
}

/// Payload for recording a member's tithe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTithePayload {
    pub member_id: i64,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A mutation intent, tagged by kind.
///
/// Serializes as `{"type": "UPDATE_TITHE", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddMember(AddMemberPayload),
    UpdateMember(UpdateMemberPayload),
    DeleteMember(DeleteMemberPayload),
    UpdateTithe(UpdateTithePayload),
}

impl Action {
    /// The kind of this action.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        match self {
            Self::AddMember(_) => ActionType::AddMember,
            Self::UpdateMember(_) => ActionType::UpdateMember,
            Self::DeleteMember(_) => ActionType::DeleteMember,
            Self::UpdateTithe(_) => ActionType::UpdateTithe,
        }
    }

    /// The member this action targets, if it targets an existing one.
    #[must_use]
    pub const fn member_id(&self) -> Option<i64> {
        match self {
            Self::AddMember(_) => None,
            Self::UpdateMember(p) => Some(p.member_id),
            Self::DeleteMember(p) => Some(p.member_id),
            Self::UpdateTithe(p) => Some(p.member_id),
        }
    }

    /// Serialize only the payload, without the type tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn payload_json(&self) -> Result<String, TitheError> {
        let json = match self {
            Self::AddMember(p) => serde_json::to_string(p)?,
            Self::UpdateMember(p) => serde_json::to_string(p)?,
            Self::DeleteMember(p) => serde_json::to_string(p)?,
            Self::UpdateTithe(p) => serde_json::to_string(p)?,
        };
        Ok(json)
    }

    /// Rebuild an action from its type and JSON payload.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAction` if the payload does not match the type.
    pub fn from_parts(action_type: ActionType, payload: &str) -> Result<Self, TitheError> {
        let invalid =
            |e: serde_json::Error| TitheError::InvalidAction(format!("bad {action_type} payload: {e}"));

        let action = match action_type {
            ActionType::AddMember => Self::AddMember(serde_json::from_str(payload).map_err(invalid)?),
            ActionType::UpdateMember => {
                Self::UpdateMember(serde_json::from_str(payload).map_err(invalid)?)
            }
            ActionType::DeleteMember => {
                Self::DeleteMember(serde_json::from_str(payload).map_err(invalid)?)
            }
            ActionType::UpdateTithe => Self::UpdateTithe(serde_json::from_str(payload).map_err(invalid)?),
        };
        Ok(action)
    }

    /// Check the payload for values that could never be applied remotely.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAction` describing the first problem found.
    pub fn validate(&self) -> Result<(), TitheError> {
        match self {
            Self::AddMember(p) if p.name.trim().is_empty() => Err(TitheError::InvalidAction(
                "member name must not be empty".to_string(),
            )),
            Self::UpdateMember(p) if p.is_empty() => Err(TitheError::InvalidAction(
                "member update must change at least one field".to_string(),
            )),
            Self::UpdateTithe(p) if !p.amount.is_finite() || p.amount < 0.0 => {
                Err(TitheError::InvalidAction(format!(
                    "tithe amount must be a non-negative number, got {}",
                    p.amount
                )))
            }
            _ => Ok(()),
        }
    }
}

/// A buffered action as held by the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingAction {
    /// Assigned by the store on first append
    pub id: Option<i64>,
    /// The mutation to replay
    #[serde(flatten)]
    pub action: Action,
    /// Milliseconds since the Unix epoch, used only for ordering
    pub timestamp: i64,
}

impl PendingAction {
    /// Create an unsaved action stamped with the given time.
    #[must_use]
    pub const fn new(action: Action, timestamp: i64) -> Self {
        Self {
            id: None,
            action,
            timestamp,
        }
    }

    /// Create an unsaved action stamped with the current time.
    #[must_use]
    pub fn now(action: Action) -> Self {
        Self::new(action, chrono::Utc::now().timestamp_millis())
    }

    /// The kind of the wrapped action.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        self.action.action_type()
    }
}
