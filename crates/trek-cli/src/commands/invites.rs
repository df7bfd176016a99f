use chrono::Utc;
use trek_core::models::{InvitationStatus, NewInvitation};

use crate::cli::InviteCommands;
use crate::commands::common::{format_timestamp, normalize_trip_id, role_from_arg, CliContext};
use crate::error::CliError;

pub async fn run_invites(command: InviteCommands, context: &CliContext) -> Result<(), CliError> {
    let api = context.api()?;
    match command {
        InviteCommands::List { json } => {
            let invitations = api.list_invitations().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&invitations)?);
                return Ok(());
            }
            if invitations.is_empty() {
                println!("No invitations.");
                return Ok(());
            }
            let now = Utc::now();
            for invitation in &invitations {
                let status = match invitation.effective_status(now) {
                    InvitationStatus::Pending => "pending",
                    InvitationStatus::Accepted => "accepted",
                    InvitationStatus::Declined => "declined",
                    InvitationStatus::Expired => "expired",
                };
                let trip = invitation
                    .trip_destination
                    .as_deref()
                    .unwrap_or_else(|| invitation.trip_id.as_str());
                println!(
                    "{:<24}  {:<9}  {:<20}  from {} as {} (expires {})",
                    invitation.id,
                    status,
                    trip,
                    invitation.inviter.display_name(),
                    invitation.role.as_str(),
                    format_timestamp(invitation.expires_at)
                );
            }
            Ok(())
        }
        InviteCommands::Send { trip, email, role } => {
            let email = email.trim().to_string();
            if email.is_empty() || !email.contains('@') {
                return Err(CliError::InvalidArgument(format!(
                    "'{email}' is not a valid email address"
                )));
            }
            let invitation = api
                .send_invitation(&NewInvitation {
                    trip_id: normalize_trip_id(&trip)?,
                    email,
                    role: role_from_arg(role),
                })
                .await?;
            println!(
                "Invited {} ({})",
                invitation.invitee_email,
                invitation.role.as_str()
            );
            Ok(())
        }
        InviteCommands::Accept { id } => respond(context, &id, true).await,
        InviteCommands::Decline { id } => respond(context, &id, false).await,
    }
}

async fn respond(context: &CliContext, id: &str, accept: bool) -> Result<(), CliError> {
    let api = context.api()?;
    let id = id.trim();
    let invitations = api.list_invitations().await?;
    if let Some(invitation) = invitations.iter().find(|invitation| invitation.id == id) {
        if !invitation.is_actionable(Utc::now()) {
            return Err(CliError::InvalidArgument(format!(
                "Invitation {id} can no longer be answered"
            )));
        }
    }

    let invitation = api.respond_invitation(id, accept).await?;
    let verb = if accept { "Accepted" } else { "Declined" };
    let trip = invitation
        .trip_destination
        .as_deref()
        .unwrap_or_else(|| invitation.trip_id.as_str());
    println!("{verb} invitation to {trip}");
    Ok(())
}
