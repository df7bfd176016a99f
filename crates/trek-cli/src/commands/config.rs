use std::env;

use trek_core::config::{normalize_api_url, normalize_text_option, API_URL_ENV};

use crate::cli::ConfigCommands;
use crate::commands::common::normalize_trip_id;
use crate::config_profiles::{settings_path, ProfileSettings};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            no_activate,
        } => run_config_init(profile.as_deref().or(global_profile), api_base_url, no_activate),
        ConfigCommands::Show => run_config_show(global_profile),
        ConfigCommands::UseTrip { id } => run_config_use_trip(global_profile, id.as_deref()),
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn run_config_init(
    profile_name: Option<&str>,
    api_base_url: Option<String>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut settings = ProfileSettings::load()?;
    let profile_name = settings.profile_name(profile_name);

    let api_base_url = normalize_text_option(api_base_url)
        .or_else(|| normalize_text_option(env::var(API_URL_ENV).ok()))
        .or_else(|| settings.profile(&profile_name).api_base_url)
        .map(|url| normalize_api_url(&url))
        .transpose()
        .map_err(|error| CliError::Config(format!("api_base_url: {error}")))?;

    let configured = api_base_url.is_some();
    let profile = settings.edit(&profile_name);
    if configured {
        profile.api_base_url = api_base_url;
    }
    if !no_activate {
        settings.active = Some(profile_name.clone());
    }

    let path = settings.store()?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );
    if configured {
        println!(
            "Run `trek auth login --email <email> --password <password>` to sign in profile '{profile_name}'."
        );
    } else {
        println!("Profile '{profile_name}' is missing: api_base_url");
    }

    Ok(())
}

pub fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let settings = ProfileSettings::load()?;
    let profile_name = settings.profile_name(global_profile);
    let profile = settings.profile(&profile_name);
    let resolved = profile
        .client_config()
        .resolve_api_base_url(None)
        .map_err(CliError::Config)?;

    println!("Config file:  {}", settings_path()?.display());
    println!("Profile:      {profile_name}");
    println!(
        "API base URL: {}",
        resolved.as_deref().unwrap_or("(not configured)")
    );
    if env::var(API_URL_ENV).is_ok() {
        println!("              (overridden by {API_URL_ENV})");
    }
    println!(
        "Current trip: {}",
        profile.current_trip.as_ref().map_or("(none)", |id| id.as_str())
    );
    Ok(())
}

pub fn run_config_use_trip(global_profile: Option<&str>, id: Option<&str>) -> Result<(), CliError> {
    let trip = id.map(normalize_trip_id).transpose()?;
    let mut settings = ProfileSettings::load()?;
    let profile_name = settings.profile_name(global_profile);
    settings.edit(&profile_name).current_trip.clone_from(&trip);
    settings.store()?;

    match trip {
        Some(trip) => println!("Profile '{profile_name}' now uses trip {trip}"),
        None => println!("Profile '{profile_name}' has no current trip"),
    }
    Ok(())
}
