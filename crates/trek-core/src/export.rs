//! Packing list export as reusable templates.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{PackingList, Trip};

/// Export output format shared by all clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Template item; packed state is dropped so the template starts fresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    pub is_custom: bool,
}

/// Serializable packing template used by JSON exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingTemplate {
    pub destination: String,
    pub activities: Vec<String>,
    pub categories: Vec<TemplateCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCategory {
    pub name: String,
    pub items: Vec<TemplateItem>,
}

/// Convert a trip's packing list into a template with sorted activities.
#[must_use]
pub fn trip_to_template(trip: &Trip) -> PackingTemplate {
    let mut activities = trip.activities.clone();
    activities.sort();

    PackingTemplate {
        destination: trip.destination.clone(),
        activities,
        categories: template_categories(&trip.packing_list),
    }
}

fn template_categories(list: &PackingList) -> Vec<TemplateCategory> {
    list.categories()
        .map(|(name, items)| TemplateCategory {
            name: name.to_string(),
            items: items
                .iter()
                .map(|item| TemplateItem {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    is_custom: item.is_custom,
                })
                .collect(),
        })
        .collect()
}

/// Render the packing template as pretty-printed JSON.
pub fn render_json_export(trip: &Trip) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&trip_to_template(trip))
}

/// Render the packing list as a Markdown check-list grouped by category.
#[must_use]
pub fn render_markdown_export(trip: &Trip) -> String {
    let mut output = String::new();
    let progress = trip.packing_list.progress();

    let _ = writeln!(output, "# Packing list: {}", trip.destination);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} - {} | {}/{} packed ({}%)",
        trip.start_date,
        trip.end_date,
        progress.packed,
        progress.total,
        progress.percent()
    );

    for (category, items) in trip.packing_list.categories() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", capitalize(category));
        for item in items {
            let mark = if item.packed { 'x' } else { ' ' };
            match item.quantity {
                Some(quantity) if quantity > 1 => {
                    let _ = writeln!(output, "- [{mark}] {} x{quantity}", item.name);
                }
                _ => {
                    let _ = writeln!(output, "- [{mark}] {}", item.name);
                }
            }
        }
    }

    output
}

/// Render a trip based on selected export format.
pub fn render_trip_export(trip: &Trip, format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(trip),
        ExportFormat::Markdown => Ok(render_markdown_export(trip)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(trip: &Trip, format: ExportFormat) -> String {
    let slug = trip
        .destination
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    format!("packing-{slug}-{}.{}", trip.start_date, format.extension())
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
