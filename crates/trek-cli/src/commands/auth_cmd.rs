use crate::auth::auth_client_for_profile;
use crate::cli::AuthCommands;
use crate::commands::common::{format_timestamp, CliContext};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, context: &CliContext) -> Result<(), CliError> {
    let profile_name = &context.profile_name;
    match command {
        AuthCommands::Login { email, password } => {
            let client = auth_client_for_profile(profile_name, context.require_api_url()?)?;
            let session = client.login(&email, &password).await?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in profile '{profile_name}' as {email_label}");
            Ok(())
        }
        AuthCommands::Register {
            name,
            email,
            password,
        } => {
            let client = auth_client_for_profile(profile_name, context.require_api_url()?)?;
            let session = client.register(&name, &email, &password).await?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Created account and signed in profile '{profile_name}' as {email_label}");
            Ok(())
        }
        AuthCommands::Status => {
            let Some(session) = context.credentials.session()? else {
                println!("Profile '{profile_name}' is not signed in.");
                return Ok(());
            };

            let label = session
                .user
                .email
                .as_deref()
                .or(session.user.name.as_deref())
                .unwrap_or(&session.user.id);
            let expiry = session
                .expires_at
                .and_then(|seconds| chrono::DateTime::from_timestamp(seconds, 0))
                .map_or_else(|| "no expiry".to_string(), format_timestamp);
            println!("Profile '{profile_name}' is signed in as {label} (expires {expiry})");

            if let Some(api_url) = context.api_url.as_deref() {
                let client = auth_client_for_profile(profile_name, api_url)?;
                match client.current_user().await {
                    Ok(user) => println!("Server confirmed user {}", user.id),
                    Err(error) => println!("Server check failed: {error}"),
                }
            }
            Ok(())
        }
        AuthCommands::Logout => {
            context.credentials.clear()?;
            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}
