use trek_core::api::TripSource;
use trek_core::cache::SharedCache;
use trek_core::models::NewTrip;
use trek_core::config::normalize_text_option;

use crate::cli::TripCommands;
use crate::commands::common::{
    format_listing_lines, format_packing_lines, format_progress, normalize_trip_id, parse_date,
    today, trip_to_list_item, CliContext, TripListItem,
};
use crate::config_profiles::ProfileSettings;
use crate::error::CliError;

pub async fn run_trips(command: TripCommands, context: &CliContext) -> Result<(), CliError> {
    let api = context.api()?;
    let cache = SharedCache::new();

    match command {
        TripCommands::List { all, json } => {
            let listing = cache.refresh_listing(&api).await?;
            if json {
                let today = today();
                let items = listing
                    .iter()
                    .filter(|trip| all || trip.is_upcoming(today))
                    .map(|trip| trip_to_list_item(trip, today))
                    .collect::<Vec<TripListItem>>();
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for line in format_listing_lines(&listing, all) {
                    println!("{line}");
                }
            }
            Ok(())
        }
        TripCommands::Show { id, json } => {
            let id = context.trip_id(id.as_deref())?;
            let trip = cache.load_trip(&api, &id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&trip)?);
                return Ok(());
            }

            println!("{} ({})", trip.destination, trip.id);
            if let Some(country) = trip.country.as_deref() {
                println!("Country:    {country}");
            }
            println!(
                "Dates:      {} → {} ({} days)",
                trip.start_date,
                trip.end_date,
                trip.duration_days()
            );
            if !trip.activities.is_empty() {
                println!("Activities: {}", trip.activities.join(", "));
            }
            if let Some(owner) = trip.owner.as_ref() {
                println!("Owner:      {}", owner.display_name());
            }
            for collaborator in &trip.collaborators {
                println!(
                    "            {} ({})",
                    collaborator.user.display_name(),
                    collaborator.role.as_str()
                );
            }
            println!("Packing:    {}", format_progress(trip.packing_list.progress()));
            for line in format_packing_lines(&trip.packing_list) {
                println!("  {line}");
            }
            Ok(())
        }
        TripCommands::Create {
            destination,
            country,
            start,
            end,
            activities,
        } => {
            let new_trip = NewTrip {
                destination: destination.trim().to_string(),
                country: normalize_text_option(country),
                start_date: parse_date(&start)?,
                end_date: parse_date(&end)?,
                activities: activities
                    .into_iter()
                    .filter_map(|activity| normalize_text_option(Some(activity)))
                    .collect(),
            };
            new_trip.validate()?;
            let trip = api.create_trip(&new_trip).await?;
            println!("{}", trip.id);
            Ok(())
        }
        TripCommands::Delete { id } => {
            let id = normalize_trip_id(&id)?;
            let trip = api.get_trip(&id).await?;
            if let Some(user_id) = context.user_id()? {
                if trip
                    .owner
                    .as_ref()
                    .is_some_and(|owner| owner.id != user_id)
                {
                    return Err(CliError::Forbidden(format!(
                        "delete trip {id}; only its owner can"
                    )));
                }
            }
            api.delete_trip(&id).await?;
            cache.invalidate_trip(&id);
            let mut settings = ProfileSettings::load()?;
            if settings.forget_trip(&id) {
                settings.store()?;
            }
            println!("Deleted trip {id} ({})", trip.destination);
            Ok(())
        }
    }
}
