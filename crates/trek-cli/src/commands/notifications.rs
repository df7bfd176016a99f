use trek_core::models::unread_count;

use crate::cli::NotificationCommands;
use crate::commands::common::{format_notification_lines, CliContext};
use crate::error::CliError;

pub async fn run_notifications(
    command: NotificationCommands,
    context: &CliContext,
) -> Result<(), CliError> {
    let api = context.api()?;
    match command {
        NotificationCommands::List { unread, json } => {
            let mut notifications = api.list_notifications().await?;
            let unread_total = unread_count(&notifications);
            if unread {
                notifications.retain(|notification| !notification.read);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&notifications)?);
                return Ok(());
            }
            println!("{unread_total} unread");
            for line in format_notification_lines(&notifications) {
                println!("{line}");
            }
            Ok(())
        }
        NotificationCommands::Read { id } => {
            api.mark_notification_read(id.trim()).await?;
            println!("Marked {} as read", id.trim());
            Ok(())
        }
        NotificationCommands::ReadAll => {
            api.mark_all_notifications_read().await?;
            println!("Marked all notifications as read");
            Ok(())
        }
        NotificationCommands::Settings {
            email,
            push,
            reminder_days,
        } => {
            let mut settings = api.notification_settings().await?;
            let changed = email.is_some() || push.is_some() || reminder_days.is_some();
            if let Some(email) = email {
                settings.email_enabled = email;
            }
            if let Some(push) = push {
                settings.push_enabled = push;
            }
            if let Some(days) = reminder_days {
                settings.trip_reminder_days = days;
            }
            if changed {
                settings = api.update_notification_settings(&settings).await?;
            }

            println!("Email:    {}", on_off(settings.email_enabled));
            println!("Push:     {}", on_off(settings.push_enabled));
            println!("Reminder: {} day(s) before departure", settings.trip_reminder_days);
            Ok(())
        }
    }
}

const fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
