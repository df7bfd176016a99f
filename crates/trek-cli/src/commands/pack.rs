use std::sync::Arc;

use trek_core::api::{HttpTripApi, PackingListApi};
use trek_core::cache::SharedCache;
use trek_core::models::{PackingItem, PackingList, Trip, TripId};
use trek_core::sync::{AlertSink, PackingSynchronizer, ToggleOutcome};

use crate::cli::PackCommands;
use crate::commands::common::{
    format_packing_lines, format_progress, parse_item_address, CliContext,
};
use crate::commands::export::run_export;
use crate::error::CliError;

/// Prints synchronizer alerts to stderr.
struct StderrAlerts;

impl AlertSink for StderrAlerts {
    fn alert(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

pub async fn run_pack(command: PackCommands, context: &CliContext) -> Result<(), CliError> {
    let api = Arc::new(context.api()?);
    let cache = SharedCache::new();

    match command {
        PackCommands::Show { trip, json } => {
            let id = context.trip_id(trip.as_deref())?;
            let trip = cache.load_trip(api.as_ref(), &id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&trip.packing_list)?);
            } else {
                print_packing_list(&trip);
            }
            Ok(())
        }
        PackCommands::Toggle { trip, items } => {
            let id = context.trip_id(trip.as_deref())?;
            let trip = load_editable_trip(context, &api, &cache, &id).await?;
            run_toggle(api, cache, trip, &items).await
        }
        PackCommands::Add {
            trip,
            category,
            name,
            quantity,
        } => {
            let id = context.trip_id(trip.as_deref())?;
            let trip = load_editable_trip(context, &api, &cache, &id).await?;
            let mut list = trip.packing_list.clone();
            let item = PackingItem::custom(name, quantity)?;
            let item_name = item.name.clone();
            list.add_item(&category, item)?;
            persist_list(&api, &cache, &id, &list).await?;
            println!("Added {item_name} to {}", category.trim());
            Ok(())
        }
        PackCommands::Remove { trip, item } => {
            let id = context.trip_id(trip.as_deref())?;
            let (category, index) = parse_item_address(&item)?;
            let trip = load_editable_trip(context, &api, &cache, &id).await?;
            let mut list = trip.packing_list.clone();
            let key = list
                .locate(&category, index)
                .ok_or_else(|| CliError::ItemNotFound {
                    category: category.clone(),
                    index,
                })?;
            let removed = list
                .remove_item(key)
                .ok_or(CliError::ItemNotFound { category, index })?;
            persist_list(&api, &cache, &id, &list).await?;
            println!("Removed {}", removed.name);
            Ok(())
        }
        PackCommands::Export {
            trip,
            format,
            output,
        } => {
            let id = context.trip_id(trip.as_deref())?;
            let trip = cache.load_trip(api.as_ref(), &id).await?;
            run_export(&trip, format, output.as_deref())
        }
    }
}

async fn run_toggle(
    api: Arc<HttpTripApi>,
    cache: SharedCache,
    trip: Trip,
    addresses: &[String],
) -> Result<(), CliError> {
    let parsed = addresses
        .iter()
        .map(|address| parse_item_address(address))
        .collect::<Result<Vec<_>, _>>()?;
    for (category, index) in &parsed {
        if trip.packing_list.get(category, *index).is_none() {
            return Err(CliError::ItemNotFound {
                category: category.clone(),
                index: *index,
            });
        }
    }

    let synchronizer = PackingSynchronizer::new(
        trip.id.clone(),
        trip.packing_list.clone(),
        api,
        cache.clone(),
        Arc::new(StderrAlerts),
    );

    let mut pending = Vec::new();
    for (category, index) in &parsed {
        match synchronizer.toggle(category, *index) {
            Some(toggle) => pending.push((format!("{category}:{index}"), toggle)),
            None => println!("{category}:{index} is already being updated; skipped"),
        }
    }

    let mut failed = 0usize;
    for (address, toggle) in pending {
        let key = toggle.key();
        let outcome = toggle.settle().await;
        let snapshot = synchronizer.snapshot();
        let name = snapshot
            .find(key)
            .map_or_else(|| address.clone(), |position| position.item.name.clone());
        match outcome {
            ToggleOutcome::Confirmed | ToggleOutcome::Superseded => {
                let packed = snapshot
                    .find(key)
                    .is_some_and(|position| position.item.packed);
                let state = if packed { "packed" } else { "unpacked" };
                println!("{name}: {state}");
            }
            ToggleOutcome::RolledBack => {
                failed += 1;
                println!("{name}: not saved");
            }
        }
    }

    let progress = cache
        .packing_progress(&trip.id)
        .unwrap_or_else(|| synchronizer.snapshot().progress());
    println!("{}", format_progress(progress));

    if failed > 0 {
        return Err(CliError::PackingUpdateFailed(failed));
    }
    Ok(())
}

async fn load_editable_trip(
    context: &CliContext,
    api: &HttpTripApi,
    cache: &SharedCache,
    id: &TripId,
) -> Result<Trip, CliError> {
    let trip = cache.load_trip(api, id).await?;
    if let Some(user_id) = context.user_id()? {
        if trip.role_of(&user_id).is_some() && !trip.can_edit(&user_id) {
            return Err(CliError::Forbidden(format!(
                "edit the packing list of trip {id}; you have view access"
            )));
        }
    }
    Ok(trip)
}

async fn persist_list(
    api: &HttpTripApi,
    cache: &SharedCache,
    id: &TripId,
    list: &PackingList,
) -> Result<(), CliError> {
    api.update_packing_list(id, list).await?;
    cache.patch_packing_list(id, list);
    Ok(())
}

fn print_packing_list(trip: &Trip) {
    println!(
        "{}: {}",
        trip.destination,
        format_progress(trip.packing_list.progress())
    );
    if trip.packing_list.is_empty() {
        println!("(packing list is empty)");
        return;
    }
    for line in format_packing_lines(&trip.packing_list) {
        println!("{line}");
    }
}
