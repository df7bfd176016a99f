use std::path::{Path, PathBuf};

use trek_core::export::{render_trip_export, suggested_export_file_name, ExportFormat as Format};
use trek_core::Trip;

use crate::cli::ExportFormat;
use crate::error::CliError;

pub fn run_export(
    trip: &Trip,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let format = export_format(format);
    let rendered = render_trip_export(trip, format)?;

    if let Some(path) = output_path {
        let path = resolve_output_path(path, trip, format);
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

pub const fn export_format(format: ExportFormat) -> Format {
    match format {
        ExportFormat::Json => Format::Json,
        ExportFormat::Markdown => Format::Markdown,
    }
}

/// Directories get a generated file name.
pub fn resolve_output_path(path: &Path, trip: &Trip, format: Format) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(trip, format))
    } else {
        path.to_path_buf()
    }
}
