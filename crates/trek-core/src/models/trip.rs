//! Trip model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::collaborator::{Collaborator, CollaboratorRole, UserRef};
use super::packing::PackingList;
use crate::error::{Error, Result};

/// Server-issued trip identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(String);

impl TripId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TripId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TripId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A planned journey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(alias = "_id")]
    pub id: TripId,
    pub destination: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(with = "flexible_date")]
    pub start_date: NaiveDate,
    #[serde(with = "flexible_date")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub activities: Vec<String>,
    /// Weather snapshot captured when the trip was planned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<serde_json::Value>,
    /// Destination metadata (flag, currency, ...) as returned by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_info: Option<serde_json::Value>,
    #[serde(default, alias = "user", skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserRef>,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
    #[serde(default)]
    pub packing_list: PackingList,
}

impl Trip {
    /// A trip stays upcoming until its last day has passed.
    #[must_use]
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.end_date >= today
    }

    /// Inclusive length in days.
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Role of the given user on this trip, if any.
    #[must_use]
    pub fn role_of(&self, user_id: &str) -> Option<CollaboratorRole> {
        if self.owner.as_ref().is_some_and(|owner| owner.id == user_id) {
            return Some(CollaboratorRole::Owner);
        }
        self.collaborators
            .iter()
            .find(|collaborator| collaborator.user.id == user_id)
            .map(|collaborator| collaborator.role)
    }

    #[must_use]
    pub fn can_edit(&self, user_id: &str) -> bool {
        self.role_of(user_id).is_some_and(CollaboratorRole::can_edit)
    }
}

/// Payload for creating a trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub activities: Vec<String>,
}

impl NewTrip {
    pub fn validate(&self) -> Result<()> {
        if self.destination.trim().is_empty() {
            return Err(Error::InvalidInput(
                "trip destination must not be empty".to_string(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(Error::InvalidInput(
                "trip end date must not be before its start date".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial trip update; unset fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<String>>,
}

/// All trips visible to the current user, split by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripListing {
    #[serde(default)]
    pub upcoming: Vec<Trip>,
    #[serde(default)]
    pub past: Vec<Trip>,
}

impl TripListing {
    /// Split a flat list of trips around `today`, soonest first.
    #[must_use]
    pub fn partition(trips: Vec<Trip>, today: NaiveDate) -> Self {
        let (mut upcoming, mut past): (Vec<_>, Vec<_>) =
            trips.into_iter().partition(|trip| trip.is_upcoming(today));
        upcoming.sort_by_key(|trip| trip.start_date);
        past.sort_by_key(|trip| std::cmp::Reverse(trip.start_date));
        Self { upcoming, past }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trip> {
        self.upcoming.iter().chain(self.past.iter())
    }

    #[must_use]
    pub fn find(&self, id: &TripId) -> Option<&Trip> {
        self.iter().find(|trip| &trip.id == id)
    }

    pub fn find_mut(&mut self, id: &TripId) -> Option<&mut Trip> {
        self.upcoming
            .iter_mut()
            .chain(self.past.iter_mut())
            .find(|trip| &trip.id == id)
    }

    pub fn remove(&mut self, id: &TripId) -> Option<Trip> {
        if let Some(index) = self.upcoming.iter().position(|trip| &trip.id == id) {
            return Some(self.upcoming.remove(index));
        }
        let index = self.past.iter().position(|trip| &trip.id == id)?;
        Some(self.past.remove(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.upcoming.len() + self.past.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty() && self.past.is_empty()
    }
}

/// Accepts plain `YYYY-MM-DD` dates as well as full RFC 3339 timestamps.
mod flexible_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(raw: &str) -> Result<NaiveDate, String> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|timestamp| timestamp.date_naive())
            .map_err(|error| format!("invalid date '{raw}': {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn trip(id: &str, start: &str, end: &str) -> Trip {
        Trip {
            id: TripId::new(id),
            destination: "Lisbon".to_string(),
            country: Some("Portugal".to_string()),
            start_date: date(start),
            end_date: date(end),
            activities: vec!["hiking".to_string()],
            weather: None,
            destination_info: None,
            owner: None,
            collaborators: Vec::new(),
            packing_list: PackingList::new(),
        }
    }

    #[test]
    fn test_trip_parses_api_payload() {
        let raw = r#"{
            "_id": "t1",
            "destination": "Lisbon",
            "startDate": "2026-06-01T00:00:00.000Z",
            "endDate": "2026-06-05",
            "user": {"_id": "u1", "name": "Ana"},
            "collaborators": [{"user": {"_id": "u2"}, "role": "view"}],
            "packingList": {"clothing": [{"name": "T-shirt", "quantity": 3, "packed": false}]}
        }"#;
        let trip: Trip = serde_json::from_str(raw).unwrap();

        assert_eq!(trip.id.as_str(), "t1");
        assert_eq!(trip.start_date, date("2026-06-01"));
        assert_eq!(trip.duration_days(), 5);
        assert_eq!(trip.role_of("u1"), Some(CollaboratorRole::Owner));
        assert_eq!(trip.role_of("u2"), Some(CollaboratorRole::View));
        assert!(!trip.can_edit("u2"));
        assert_eq!(trip.packing_list.len(), 1);
    }

    #[test]
    fn test_listing_partitions_by_end_date() {
        let today = date("2026-05-10");
        let listing = TripListing::partition(
            vec![
                trip("past", "2026-01-01", "2026-01-05"),
                trip("ongoing", "2026-05-08", "2026-05-12"),
                trip("later", "2026-08-01", "2026-08-03"),
            ],
            today,
        );

        let upcoming = listing
            .upcoming
            .iter()
            .map(|trip| trip.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(upcoming, vec!["ongoing", "later"]);
        assert_eq!(listing.past.len(), 1);
        assert!(listing.find(&TripId::new("past")).is_some());
    }

    #[test]
    fn test_new_trip_validation() {
        let mut new_trip = NewTrip {
            destination: "Oslo".to_string(),
            country: None,
            start_date: date("2026-03-02"),
            end_date: date("2026-03-01"),
            activities: Vec::new(),
        };
        assert!(new_trip.validate().is_err());
        new_trip.end_date = date("2026-03-04");
        assert!(new_trip.validate().is_ok());
    }

    #[test]
    fn test_flexible_date_rejects_garbage() {
        assert!(flexible_date::parse("next tuesday").is_err());
    }
}
