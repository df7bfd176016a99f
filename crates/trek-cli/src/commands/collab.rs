use trek_core::models::{ensure_role_change_allowed, CollaboratorRole};

use crate::cli::CollabCommands;
use crate::commands::common::{normalize_trip_id, role_from_arg, CliContext};
use crate::error::CliError;

pub async fn run_collab(command: CollabCommands, context: &CliContext) -> Result<(), CliError> {
    let api = context.api()?;
    match command {
        CollabCommands::List { trip } => {
            let id = normalize_trip_id(&trip)?;
            let collaborators = api.list_collaborators(&id).await?;
            if collaborators.is_empty() {
                println!("No collaborators on trip {id}.");
            }
            for collaborator in &collaborators {
                println!(
                    "{:<24}  {:<5}  {}",
                    collaborator.user.id,
                    collaborator.role.as_str(),
                    collaborator.user.display_name()
                );
            }
            Ok(())
        }
        CollabCommands::Role { trip, user, role } => {
            let id = normalize_trip_id(&trip)?;
            let user = user.trim();
            let requested = role_from_arg(role);
            let collaborators = api.list_collaborators(&id).await?;
            let current = collaborators
                .iter()
                .find(|collaborator| collaborator.user.id == user)
                .map(|collaborator| collaborator.role)
                .ok_or_else(|| {
                    CliError::InvalidArgument(format!("{user} is not a collaborator on trip {id}"))
                })?;
            ensure_role_change_allowed(current, requested)?;

            let updated = api.update_collaborator_role(&id, user, requested).await?;
            println!(
                "{} is now {}",
                updated.user.display_name(),
                updated.role.as_str()
            );
            Ok(())
        }
        CollabCommands::Remove { trip, user } => {
            let id = normalize_trip_id(&trip)?;
            let user = user.trim();
            let collaborators = api.list_collaborators(&id).await?;
            let is_owner = collaborators.iter().any(|collaborator| {
                collaborator.user.id == user && collaborator.role == CollaboratorRole::Owner
            });
            if is_owner {
                return Err(CliError::Forbidden("remove the trip owner".to_string()));
            }
            api.remove_collaborator(&id, user).await?;
            println!("Removed {user} from trip {id}");
            Ok(())
        }
    }
}
