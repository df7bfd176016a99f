use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use trek_core::api::HttpTripApi;
use trek_core::auth::BearerSource;
use trek_core::models::{
    CollaboratorRole, Notification, PackingList, PackingProgress, Trip, TripId, TripListing,
};

use crate::auth::{credentials_for_profile, ProfileCredentials};
use crate::cli::RoleArg;
use crate::config_profiles::ProfileSettings;
use crate::error::CliError;

/// Resolved profile, endpoint, and credentials for one invocation.
pub struct CliContext {
    pub profile_name: String,
    pub api_url: Option<String>,
    pub credentials: ProfileCredentials,
    /// Trip selected with `trek config use-trip`
    pub current_trip: Option<TripId>,
}

impl CliContext {
    pub fn resolve(
        global_profile: Option<&str>,
        api_url_override: Option<String>,
    ) -> Result<Self, CliError> {
        let settings = ProfileSettings::load()?;
        let profile_name = settings.profile_name(global_profile);
        let profile = settings.profile(&profile_name);
        let api_url = profile
            .client_config()
            .resolve_api_base_url(api_url_override)
            .map_err(CliError::Config)?;
        tracing::debug!(
            "Using profile '{}' with API {}",
            profile_name,
            api_url.as_deref().unwrap_or("(unset)")
        );

        Ok(Self {
            credentials: credentials_for_profile(&profile_name),
            profile_name,
            api_url,
            current_trip: profile.current_trip,
        })
    }

    /// Trip named on the command line, else the profile's current trip.
    pub fn trip_id(&self, explicit: Option<&str>) -> Result<TripId, CliError> {
        match explicit {
            Some(id) => normalize_trip_id(id),
            None => self.current_trip.clone().ok_or(CliError::NoTripSelected),
        }
    }

    pub fn require_api_url(&self) -> Result<&str, CliError> {
        self.api_url.as_deref().ok_or(CliError::ApiNotConfigured)
    }

    pub fn api(&self) -> Result<HttpTripApi, CliError> {
        let credentials: Arc<dyn BearerSource> = Arc::new(self.credentials.clone());
        Ok(HttpTripApi::new(self.require_api_url()?, credentials)?)
    }

    /// ID of the signed-in user, if a session is stored.
    pub fn user_id(&self) -> Result<Option<String>, CliError> {
        Ok(self.credentials.session()?.map(|session| session.user.id))
    }
}

#[derive(Debug, Serialize)]
pub struct TripListItem {
    pub id: String,
    pub destination: String,
    pub country: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub upcoming: bool,
    pub packed: usize,
    pub total: usize,
    pub percent: u8,
}

pub fn trip_to_list_item(trip: &Trip, today: NaiveDate) -> TripListItem {
    let progress = trip.packing_list.progress();
    TripListItem {
        id: trip.id.to_string(),
        destination: trip.destination.clone(),
        country: trip.country.clone(),
        start_date: trip.start_date,
        end_date: trip.end_date,
        days: trip.duration_days(),
        upcoming: trip.is_upcoming(today),
        packed: progress.packed,
        total: progress.total,
        percent: progress.percent(),
    }
}

pub fn format_trip_line(trip: &Trip) -> String {
    let progress = trip.packing_list.progress();
    let place = trip.country.as_deref().map_or_else(
        || trip.destination.clone(),
        |country| format!("{}, {country}", trip.destination),
    );
    format!(
        "{:<24}  {:<28}  {} → {}  {}",
        trip.id.as_str(),
        truncate(&place, 28),
        trip.start_date,
        trip.end_date,
        format_progress(progress)
    )
}

pub fn format_listing_lines(listing: &TripListing, include_past: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if listing.upcoming.is_empty() {
        lines.push("No upcoming trips.".to_string());
    } else {
        lines.push("Upcoming".to_string());
        lines.extend(listing.upcoming.iter().map(format_trip_line));
    }
    if include_past && !listing.past.is_empty() {
        lines.push(String::new());
        lines.push("Past".to_string());
        lines.extend(listing.past.iter().map(format_trip_line));
    }
    lines
}

pub fn format_progress(progress: PackingProgress) -> String {
    format!(
        "{}/{} packed ({}%)",
        progress.packed,
        progress.total,
        progress.percent()
    )
}

/// One line per item, prefixed with its `category:index` address.
pub fn format_packing_lines(list: &PackingList) -> Vec<String> {
    let mut lines = Vec::new();
    for (category, items) in list.categories() {
        lines.push(format!("{category}:"));
        for (index, item) in items.iter().enumerate() {
            let mark = if item.packed { "x" } else { " " };
            let quantity = item
                .quantity
                .map(|quantity| format!(" x{quantity}"))
                .unwrap_or_default();
            let custom = if item.is_custom { "  (custom)" } else { "" };
            lines.push(format!(
                "  [{mark}] {category}:{index:<3} {}{quantity}{custom}",
                item.name
            ));
        }
    }
    lines
}

pub fn format_notification_lines(notifications: &[Notification]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notifications
        .iter()
        .map(|notification| {
            let marker = if notification.read { " " } else { "*" };
            format!(
                "{marker} {:<24}  {:<10}  {}",
                notification.id,
                format_relative_time(notification.created_at.timestamp_millis(), now_ms),
                notification.message
            )
        })
        .collect()
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn normalize_trip_id(id: &str) -> Result<TripId, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyTripId)
    } else {
        Ok(TripId::new(trimmed))
    }
}

/// Parse `CATEGORY:INDEX`; the category itself may contain colons.
pub fn parse_item_address(raw: &str) -> Result<(String, usize), CliError> {
    let invalid = || CliError::InvalidItemAddress(raw.to_string());
    let (category, index) = raw.trim().rsplit_once(':').ok_or_else(invalid)?;
    let category = category.trim();
    if category.is_empty() {
        return Err(invalid());
    }
    let index = index.trim().parse::<usize>().map_err(|_| invalid())?;
    Ok((category.to_string(), index))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CliError::InvalidDate(raw.to_string()))
}

pub const fn role_from_arg(role: RoleArg) -> CollaboratorRole {
    match role {
        RoleArg::Edit => CollaboratorRole::Edit,
        RoleArg::View => CollaboratorRole::View,
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
