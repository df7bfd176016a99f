use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "trek")]
#[command(about = "Plan trips and keep your packing list in sync from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// CLI profile name for API/auth configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Override the API base URL for this invocation
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Sign in, sign up, or sign out
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Manage trips
    #[command(alias = "trip")]
    Trips {
        #[command(subcommand)]
        command: TripCommands,
    },
    /// View and update a trip's packing list
    Pack {
        #[command(subcommand)]
        command: PackCommands,
    },
    /// Trip invitations
    #[command(alias = "invitations")]
    Invites {
        #[command(subcommand)]
        command: InviteCommands,
    },
    /// Trip collaborators
    #[command(alias = "collaborators")]
    Collab {
        #[command(subcommand)]
        command: CollabCommands,
    },
    /// Notifications and delivery settings
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RoleArg {
    Edit,
    View,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Trek API base URL (e.g. <https://api.example.com/api>)
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile configuration
    Show,
    /// Set the trip used when a command is not given one
    UseTrip {
        /// Trip ID; clears the current trip when omitted
        id: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Login with email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(long, value_name = "NAME")]
        name: String,
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for profile
    Status,
    /// Logout profile and clear stored session
    Logout,
}

#[derive(Subcommand)]
pub enum TripCommands {
    /// List upcoming and past trips with packing progress
    List {
        /// Include past trips
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single trip
    Show {
        /// Trip ID (defaults to the profile's current trip)
        id: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a trip
    Create {
        /// Destination city or place
        #[arg(long)]
        destination: String,
        /// Destination country
        #[arg(long)]
        country: Option<String>,
        /// First day (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        start: String,
        /// Last day (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        end: String,
        /// Activity tags (repeatable)
        #[arg(long = "activity", value_name = "TAG")]
        activities: Vec<String>,
    },
    /// Delete a trip you own
    Delete {
        /// Trip ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PackCommands {
    /// Show the packing list with item positions
    Show {
        /// Trip ID (defaults to the profile's current trip)
        #[arg(short, long, value_name = "ID")]
        trip: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle the packed state of one or more items
    Toggle {
        /// Trip ID (defaults to the profile's current trip)
        #[arg(short, long, value_name = "ID")]
        trip: Option<String>,
        /// Items as CATEGORY:INDEX (e.g. clothing:0)
        #[arg(required = true, value_name = "CATEGORY:INDEX")]
        items: Vec<String>,
    },
    /// Add a custom item
    Add {
        /// Trip ID (defaults to the profile's current trip)
        #[arg(short, long, value_name = "ID")]
        trip: Option<String>,
        /// Category name
        category: String,
        /// Item name
        name: String,
        /// Quantity
        #[arg(short, long)]
        quantity: Option<u32>,
    },
    /// Remove an item
    Remove {
        /// Trip ID (defaults to the profile's current trip)
        #[arg(short, long, value_name = "ID")]
        trip: Option<String>,
        /// Item as CATEGORY:INDEX
        #[arg(value_name = "CATEGORY:INDEX")]
        item: String,
    },
    /// Export the packing list as a template
    Export {
        /// Trip ID (defaults to the profile's current trip)
        #[arg(short, long, value_name = "ID")]
        trip: Option<String>,
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum InviteCommands {
    /// List invitations addressed to you
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Invite someone to a trip
    Send {
        /// Trip ID
        trip: String,
        /// Invitee email
        email: String,
        /// Role granted on acceptance
        #[arg(long, value_enum, default_value_t = RoleArg::Edit)]
        role: RoleArg,
    },
    /// Accept an invitation
    Accept {
        /// Invitation ID
        id: String,
    },
    /// Decline an invitation
    Decline {
        /// Invitation ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CollabCommands {
    /// List a trip's collaborators
    List {
        /// Trip ID
        trip: String,
    },
    /// Change a collaborator's role
    Role {
        /// Trip ID
        trip: String,
        /// Collaborator user ID
        user: String,
        /// New role
        #[arg(value_enum)]
        role: RoleArg,
    },
    /// Remove a collaborator
    Remove {
        /// Trip ID
        trip: String,
        /// Collaborator user ID
        user: String,
    },
}

#[derive(Subcommand)]
pub enum NotificationCommands {
    /// List notifications
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark one notification as read
    Read {
        /// Notification ID
        id: String,
    },
    /// Mark every notification as read
    ReadAll,
    /// Show or change delivery settings
    Settings {
        /// Enable or disable email delivery
        #[arg(long)]
        email: Option<bool>,
        /// Enable or disable push delivery
        #[arg(long)]
        push: Option<bool>,
        /// Days before departure to send a reminder
        #[arg(long, value_name = "DAYS")]
        reminder_days: Option<u32>,
    },
}
