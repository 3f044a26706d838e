//! Queue command implementation.
//!
//! Builds an [`Action`] from command-line arguments and hands it to the
//! coordinator.

use crate::cli::args::{OutputFormat, QueueCommands};
use crate::error::TitheError;
use crate::features::sync::{
    Action, ActionType, AddMemberPayload, DeleteMemberPayload, SyncCoordinator,
    UpdateMemberPayload, UpdateTithePayload,
};
use crate::output::format_queued;

/// Execute queue subcommands.
///
/// # Errors
///
/// Returns an error if the arguments do not form a valid action or the
/// action cannot be stored.
pub async fn queue(
    coordinator: &SyncCoordinator,
    cmd: QueueCommands,
    format: OutputFormat,
) -> Result<String, TitheError> {
    let action = build_action(cmd)?;
    action.validate()?;

    let stored = coordinator.queue_action(action).await?;
    format_queued(&stored, format)
}

fn build_action(cmd: QueueCommands) -> Result<Action, TitheError> {
    let action = match cmd {
        QueueCommands::AddMember {
            name,
            email,
            phone,
            address,
            joined_on,
        } => Action::AddMember(AddMemberPayload {
            name,
            email,
            phone,
            address,
            joined_on,
        }),
        QueueCommands::UpdateMember {
            member_id,
            name,
            email,
            phone,
            address,
        } => Action::UpdateMember(UpdateMemberPayload {
            member_id,
            name,
            email,
            phone,
            address,
        }),
        QueueCommands::DeleteMember { member_id } => {
            Action::DeleteMember(DeleteMemberPayload { member_id })
        }
        QueueCommands::UpdateTithe {
            member_id,
            amount,
            paid_on,
            note,
        } => Action::UpdateTithe(UpdateTithePayload {
            member_id,
            amount,
            paid_on,
            note,
        }),
        QueueCommands::Raw {
            action_type,
            payload,
        } => {
            let action_type: ActionType = action_type.parse()?;
            Action::from_parts(action_type, &payload)?
        }
    };

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sync::ActionQueue;

    fn coordinator() -> SyncCoordinator {
        SyncCoordinator::new(ActionQueue::open_in_memory().unwrap())
    }

    #[test]
    fn test_build_raw_action() {
        let action = build_action(QueueCommands::Raw {
            action_type: "update_tithe".to_string(),
            payload: r#"{"memberId":7,"amount":50}"#.to_string(),
        })
        .unwrap();

        assert_eq!(action.action_type(), ActionType::UpdateTithe);
        assert_eq!(action.member_id(), Some(7));
    }

    #[test]
    fn test_build_raw_unknown_type() {
        let err = build_action(QueueCommands::Raw {
            action_type: "ARCHIVE".to_string(),
            payload: "{}".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, TitheError::InvalidAction(_)));
    }

    #[tokio::test]
    async fn test_queue_stores_action() {
        let coordinator = coordinator();

        let output = queue(
            &coordinator,
            QueueCommands::DeleteMember { member_id: 5 },
            OutputFormat::Json,
        )
        .await
        .unwrap();

        assert!(output.contains("\"type\": \"DELETE_MEMBER\""));
        assert_eq!(coordinator.get_pending_actions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_queue_rejects_empty_update_without_storing() {
        let coordinator = coordinator();

        let err = queue(
            &coordinator,
            QueueCommands::UpdateMember {
                member_id: 5,
                name: None,
                email: None,
                phone: None,
                address: None,
            },
            OutputFormat::Pretty,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TitheError::InvalidAction(_)));
        assert!(coordinator.get_pending_actions().await.unwrap().is_empty());
    }
}
