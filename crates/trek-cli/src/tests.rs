use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{NaiveDate, TimeZone, Utc};
use clap::Parser;
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use trek_core::auth::{AuthSession, AuthUser};
use trek_core::models::{
    CollaboratorRole, Notification, NotificationKind, PackingItem, PackingList, Trip, TripId,
    TripListing, UserRef,
};

use crate::auth::credentials_for_profile;
use crate::cli::{
    Cli, Commands, CompletionShell, ConfigCommands, ExportFormat, PackCommands, RoleArg,
};
use crate::commands::common::{
    format_listing_lines, format_notification_lines, format_packing_lines, format_relative_time,
    normalize_trip_id, parse_date, parse_item_address, role_from_arg, trip_to_list_item, truncate,
    CliContext,
};
use crate::commands::completions::run_completions;
use crate::commands::export::run_export;
use crate::commands::pack::run_pack;
use crate::error::CliError;

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn sample_trip(id: &str, start: &str, end: &str) -> Trip {
    let mut shirt = PackingItem::new("T-shirt", Some(3)).unwrap();
    shirt.packed = true;
    Trip {
        id: TripId::new(id),
        destination: "Lisbon".to_string(),
        country: Some("Portugal".to_string()),
        start_date: date(start),
        end_date: date(end),
        activities: Vec::new(),
        weather: None,
        destination_info: None,
        owner: Some(UserRef {
            id: "u1".to_string(),
            name: Some("Ana".to_string()),
            email: None,
        }),
        collaborators: Vec::new(),
        packing_list: PackingList::from_categories([
            (
                "clothing",
                vec![shirt, PackingItem::new("Rain jacket", None).unwrap()],
            ),
            ("essentials", vec![PackingItem::new("Wallet", None).unwrap()]),
        ]),
    }
}

fn unique_temp_path(prefix: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "{prefix}-{}.{extension}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos())
    ))
}

#[test]
fn parse_item_address_accepts_category_and_index() {
    assert_eq!(
        parse_item_address("clothing:2").unwrap(),
        ("clothing".to_string(), 2)
    );
    assert_eq!(
        parse_item_address(" carry-on: bag:0 ").unwrap(),
        ("carry-on: bag".to_string(), 0)
    );
}

#[test]
fn parse_item_address_rejects_malformed_input() {
    for raw in ["clothing", ":1", "clothing:-1", "clothing:x", ""] {
        assert!(
            matches!(
                parse_item_address(raw),
                Err(CliError::InvalidItemAddress(_))
            ),
            "{raw} should be rejected"
        );
    }
}

#[test]
fn parse_date_requires_iso_dates() {
    assert_eq!(parse_date(" 2026-07-01 ").unwrap(), date("2026-07-01"));
    assert!(matches!(
        parse_date("07/01/2026"),
        Err(CliError::InvalidDate(_))
    ));
}

#[test]
fn normalize_trip_id_rejects_empty() {
    assert_eq!(normalize_trip_id(" t1 ").unwrap(), TripId::new("t1"));
    assert!(matches!(normalize_trip_id("  "), Err(CliError::EmptyTripId)));
}

#[test]
fn role_argument_never_grants_ownership() {
    assert_eq!(role_from_arg(RoleArg::Edit), CollaboratorRole::Edit);
    assert_eq!(role_from_arg(RoleArg::View), CollaboratorRole::View);
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
}

#[test]
fn truncate_adds_ellipsis() {
    assert_eq!(truncate("Lisbon", 10), "Lisbon");
    assert_eq!(truncate("Rio de   Janeiro, Brazil", 12), "Rio de Ja...");
}

#[test]
fn packing_lines_show_addresses_and_marks() {
    let trip = sample_trip("t1", "2026-07-01", "2026-07-05");
    let lines = format_packing_lines(&trip.packing_list);
    assert_eq!(lines[0], "clothing:");
    assert!(lines[1].starts_with("  [x] clothing:0"));
    assert!(lines[1].ends_with("T-shirt x3"));
    assert!(lines[2].starts_with("  [ ] clothing:1"));
    assert_eq!(lines[3], "essentials:");
}

#[test]
fn listing_lines_hide_past_trips_by_default() {
    let listing = TripListing::partition(
        vec![
            sample_trip("past", "2025-01-01", "2025-01-03"),
            sample_trip("next", "2026-07-01", "2026-07-05"),
        ],
        date("2026-06-01"),
    );

    let short = format_listing_lines(&listing, false);
    assert_eq!(short.len(), 2);
    assert!(short[1].contains("next"));
    assert!(short[1].contains("1/3 packed (33%)"));

    let full = format_listing_lines(&listing, true);
    assert!(full.iter().any(|line| line == "Past"));
    assert!(full.iter().any(|line| line.contains("past")));
}

#[test]
fn trip_list_item_reports_progress() {
    let trip = sample_trip("t1", "2026-07-01", "2026-07-05");
    let item = trip_to_list_item(&trip, date("2026-06-01"));
    assert_eq!(item.days, 5);
    assert!(item.upcoming);
    assert_eq!((item.packed, item.total, item.percent), (1, 3, 33));
}

#[test]
fn notification_lines_mark_unread() {
    let created_at = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
    let notifications = vec![
        Notification {
            id: "n1".to_string(),
            kind: NotificationKind::Reminder,
            message: "Pack for Lisbon".to_string(),
            read: false,
            trip_id: Some(TripId::new("t1")),
            created_at,
        },
        Notification {
            id: "n2".to_string(),
            kind: NotificationKind::Invitation,
            message: "Bo invited you".to_string(),
            read: true,
            trip_id: None,
            created_at,
        },
    ];
    let lines = format_notification_lines(&notifications);
    assert!(lines[0].starts_with("* n1"));
    assert!(lines[0].ends_with("Pack for Lisbon"));
    assert!(lines[1].starts_with("  n2"));
}

#[test]
fn cli_parses_pack_toggle_with_multiple_items() {
    let cli = Cli::try_parse_from([
        "trek",
        "--profile",
        "work",
        "pack",
        "toggle",
        "--trip",
        "t1",
        "clothing:0",
        "essentials:0",
    ])
    .unwrap();
    assert_eq!(cli.profile.as_deref(), Some("work"));
    match cli.command {
        Some(Commands::Pack {
            command: PackCommands::Toggle { trip, items },
        }) => {
            assert_eq!(trip.as_deref(), Some("t1"));
            assert_eq!(items, vec!["clothing:0", "essentials:0"]);
        }
        _ => panic!("expected pack toggle"),
    }
}

#[test]
fn cli_parses_pack_show_without_a_trip() {
    let cli = Cli::try_parse_from(["trek", "pack", "show", "--json"]).unwrap();
    match cli.command {
        Some(Commands::Pack {
            command: PackCommands::Show { trip, json },
        }) => {
            assert_eq!(trip, None);
            assert!(json);
        }
        _ => panic!("expected pack show"),
    }

    let cli = Cli::try_parse_from(["trek", "config", "use-trip", "t9"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommands::UseTrip { id: Some(ref id) },
        }) if id == "t9"
    ));
}

#[test]
fn context_falls_back_to_the_current_trip() {
    let mut context =
        signed_in_context("tests-current-trip", "http://127.0.0.1:9/api".to_string());
    assert!(matches!(context.trip_id(None), Err(CliError::NoTripSelected)));
    assert!(matches!(context.trip_id(Some(" ")), Err(CliError::EmptyTripId)));

    context.current_trip = Some(TripId::new("t1"));
    assert_eq!(context.trip_id(None).unwrap(), TripId::new("t1"));
    assert_eq!(context.trip_id(Some(" t2 ")).unwrap(), TripId::new("t2"));
}

#[test]
fn cli_requires_items_for_toggle() {
    assert!(Cli::try_parse_from(["trek", "pack", "toggle", "--trip", "t1"]).is_err());
}

#[test]
fn run_export_writes_markdown_into_directory() {
    let directory = unique_temp_path("trek-export-test", "d");
    std::fs::create_dir_all(&directory).unwrap();
    let trip = sample_trip("t1", "2026-07-01", "2026-07-05");

    run_export(&trip, ExportFormat::Markdown, Some(&directory)).unwrap();

    let written = std::fs::read_dir(&directory)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect::<Vec<_>>();
    assert_eq!(written.len(), 1);
    let exported = std::fs::read_to_string(&written[0]).unwrap();
    assert!(exported.starts_with("# Packing list: Lisbon"));
    assert!(exported.contains("- [x] T-shirt x3"));

    let _ = std::fs::remove_dir_all(directory);
}

#[test]
fn run_export_writes_json_file() {
    let output_path = unique_temp_path("trek-export-test", "json");
    let trip = sample_trip("t1", "2026-07-01", "2026-07-05");

    run_export(&trip, ExportFormat::Json, Some(&output_path)).unwrap();

    let exported = std::fs::read_to_string(&output_path).unwrap();
    assert!(exported.contains("\"name\": \"Rain jacket\""));
    assert!(!exported.contains("\"packed\""));

    let _ = std::fs::remove_file(output_path);
}

#[test]
fn run_completions_writes_bash_script_file() {
    let output_path = unique_temp_path("trek-completions-test", "bash");

    run_completions(CompletionShell::Bash, Some(&output_path)).unwrap();

    let script = std::fs::read_to_string(&output_path).unwrap();
    assert!(script.contains("_trek()"));
    assert!(script.contains("complete -F _trek"));

    let _ = std::fs::remove_file(output_path);
}

#[test]
fn run_completions_names_file_inside_directory() {
    let directory = unique_temp_path("trek-completions-test", "d");
    std::fs::create_dir_all(&directory).unwrap();

    run_completions(CompletionShell::Fish, Some(&directory)).unwrap();

    let script = std::fs::read_to_string(directory.join("trek.fish")).unwrap();
    assert!(script.contains("complete -c trek"));

    let _ = std::fs::remove_dir_all(directory);
}

/// Serves the scripted responses in order, one connection each.
///
/// The handle yields every request received, in arrival order.
async fn spawn_scripted_server(
    responses: Vec<(&'static str, String)>,
) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status_line, body) in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            requests.push(read_request(&mut socket).await);
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
        requests
    });

    (format!("http://{address}/api"), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let Ok(read) = socket.read(&mut chunk).await else {
            break;
        };
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
        let raw = String::from_utf8_lossy(&buffer);
        if let Some(header_end) = raw.find("\r\n\r\n") {
            let content_length = raw[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

fn signed_in_context(profile_name: &str, api_url: String) -> CliContext {
    let credentials = credentials_for_profile(profile_name);
    credentials
        .set(AuthSession {
            token: "token".to_string(),
            expires_at: None,
            user: AuthUser {
                id: "u1".to_string(),
                name: Some("Ana".to_string()),
                email: None,
            },
        })
        .unwrap();
    CliContext {
        profile_name: profile_name.to_string(),
        api_url: Some(api_url),
        credentials,
        current_trip: None,
    }
}

#[tokio::test]
async fn pack_toggle_confirms_against_server() {
    let trip = sample_trip("t1", "2026-07-01", "2026-07-05");
    let trip_body = serde_json::to_string(&trip).unwrap();
    let (api_url, requests) = spawn_scripted_server(vec![
        ("200 OK", trip_body.clone()),
        ("200 OK", format!("{{\"trip\":{trip_body}}}")),
    ])
    .await;
    let context = signed_in_context("tests-pack-ok", api_url);

    run_pack(
        PackCommands::Toggle {
            trip: Some("t1".to_string()),
            items: vec!["clothing:1".to_string()],
        },
        &context,
    )
    .await
    .unwrap();

    let requests = requests.await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("GET /api/trips/t1 "));
    let (head, body) = requests[1].split_once("\r\n\r\n").unwrap();
    assert!(head.starts_with("PUT /api/trips/t1/packing-list "));
    assert!(head
        .lines()
        .any(|line| line.eq_ignore_ascii_case("authorization: Bearer token")));

    let sent: serde_json::Value = serde_json::from_str(body).unwrap();
    let sent_list: PackingList = serde_json::from_value(sent["packingList"].clone()).unwrap();
    let expected = trip
        .packing_list
        .with_packed(trip.packing_list.locate("clothing", 1).unwrap(), true)
        .unwrap();
    assert_eq!(sent_list, expected);
}

#[tokio::test]
async fn pack_toggle_reports_reverted_updates() {
    let trip = sample_trip("t1", "2026-07-01", "2026-07-05");
    let (api_url, _) = spawn_scripted_server(vec![
        ("200 OK", serde_json::to_string(&trip).unwrap()),
        (
            "500 Internal Server Error",
            r#"{"message":"database unavailable"}"#.to_string(),
        ),
    ])
    .await;
    let mut context = signed_in_context("tests-pack-fail", api_url);
    context.current_trip = Some(TripId::new("t1"));

    let result = run_pack(
        PackCommands::Toggle {
            trip: None,
            items: vec!["essentials:0".to_string()],
        },
        &context,
    )
    .await;
    assert!(matches!(result, Err(CliError::PackingUpdateFailed(1))));
}

#[tokio::test]
async fn pack_toggle_rejects_unknown_item_before_sending() {
    let trip = sample_trip("t1", "2026-07-01", "2026-07-05");
    let (api_url, _) =
        spawn_scripted_server(vec![("200 OK", serde_json::to_string(&trip).unwrap())]).await;
    let context = signed_in_context("tests-pack-missing", api_url);

    let result = run_pack(
        PackCommands::Toggle {
            trip: Some("t1".to_string()),
            items: vec!["clothing:9".to_string()],
        },
        &context,
    )
    .await;
    assert!(matches!(
        result,
        Err(CliError::ItemNotFound { index: 9, .. })
    ));
}

#[tokio::test]
async fn view_only_collaborator_cannot_toggle() {
    let mut trip = sample_trip("t1", "2026-07-01", "2026-07-05");
    trip.owner = Some(UserRef {
        id: "owner".to_string(),
        name: None,
        email: None,
    });
    trip.collaborators = vec![trek_core::models::Collaborator {
        user: UserRef {
            id: "u1".to_string(),
            name: None,
            email: None,
        },
        role: CollaboratorRole::View,
    }];
    let (api_url, _) =
        spawn_scripted_server(vec![("200 OK", serde_json::to_string(&trip).unwrap())]).await;
    let context = signed_in_context("tests-pack-view", api_url);

    let result = run_pack(
        PackCommands::Toggle {
            trip: Some("t1".to_string()),
            items: vec!["clothing:0".to_string()],
        },
        &context,
    )
    .await;
    assert!(matches!(result, Err(CliError::Forbidden(_))));
}
