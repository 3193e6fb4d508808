use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::input::BulkInputArgs;
use super::output::OutputArgs;
use crate::alerts::AlertState;
use crate::cases::CaseStatus;
use crate::sessions::SessionState;
use crate::settings::SettingsOverrides;
use crate::trusted_activities::ActivityType;
use crate::watchlists::WatchlistType;

#[derive(Parser)]
#[command(
    name = "incydr",
    about = "Command-line client for the Code42 Incydr API",
    version,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// API client id (overrides INCYDR_API_CLIENT_ID)
    #[arg(long, global = true)]
    pub api_client_id: Option<String>,

    /// API client secret (overrides INCYDR_API_CLIENT_SECRET)
    #[arg(long, global = true)]
    pub api_client_secret: Option<String>,

    /// Tenant API URL, e.g. https://api.us.code42.com (overrides INCYDR_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Records requested per page (overrides INCYDR_PAGE_SIZE)
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// Log level: trace, debug, info, warn or error (overrides INCYDR_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            api_client_id: self.api_client_id.clone(),
            api_client_secret: self.api_client_secret.clone(),
            url: self.url.clone(),
            page_size: self.page_size,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search file events
    #[command(subcommand)]
    FileEvents(FileEventsCommands),
    /// Search and triage alerts
    #[command(subcommand)]
    Alerts(AlertsCommands),
    /// Manage cases
    #[command(subcommand)]
    Cases(CasesCommands),
    /// Manage users
    #[command(subcommand)]
    Users(UsersCommands),
    /// Inspect devices
    #[command(subcommand)]
    Devices(DevicesCommands),
    /// Manage watchlists and their members
    #[command(subcommand)]
    Watchlists(WatchlistsCommands),
    /// Look up actors
    #[command(subcommand)]
    Actors(ActorsCommands),
    /// Manage endpoint agents
    #[command(subcommand)]
    Agents(AgentsCommands),
    /// Manage organizations
    #[command(subcommand)]
    Orgs(OrgsCommands),
    /// Manage legal hold matters and custodians
    #[command(subcommand)]
    LegalHold(LegalHoldCommands),
    /// Review sessions
    #[command(subcommand)]
    Sessions(SessionsCommands),
    /// Manage user risk profiles
    #[command(subcommand)]
    RiskProfiles(RiskProfilesCommands),
    /// Search the audit log
    #[command(subcommand)]
    AuditLog(AuditLogCommands),
    /// Manage trusted activities
    #[command(subcommand)]
    TrustedActivities(TrustedActivitiesCommands),
}

/// Start/end/checkpoint flags shared by resumable searches.
#[derive(Args, Debug, Clone)]
pub struct SearchWindowArgs {
    /// Start of the window: a date, an ISO duration (P7D) or 30d/12h/15m
    #[arg(long)]
    pub start: Option<String>,

    /// End of the window (absolute date)
    #[arg(long)]
    pub end: Option<String>,

    /// Resume from, and afterwards update, the named checkpoint
    #[arg(long)]
    pub checkpoint: Option<String>,
}

// ── file-events ────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum FileEventsCommands {
    /// Search file events
    Search(FileEventSearchArgs),
    /// List saved searches
    SavedSearches(OutputArgs),
}

#[derive(Args)]
pub struct FileEventSearchArgs {
    #[command(flatten)]
    pub window: SearchWindowArgs,

    /// Run a saved search by id
    #[arg(long, conflicts_with = "advanced_query")]
    pub saved_search: Option<String>,

    /// Raw JSON query body; '@path' reads it from a file
    #[arg(long)]
    pub advanced_query: Option<String>,

    /// TERM=VALUE; repeats of one term are OR-ed
    #[arg(long = "equals", value_name = "TERM=VALUE")]
    pub equals: Vec<String>,

    /// TERM=VALUE; repeats of one term are OR-ed
    #[arg(long = "not-equals", value_name = "TERM=VALUE")]
    pub not_equals: Vec<String>,

    /// Require TERM to be present
    #[arg(long, value_name = "TERM")]
    pub exists: Vec<String>,

    /// Require TERM to be absent
    #[arg(long, value_name = "TERM")]
    pub does_not_exist: Vec<String>,

    /// Combine filters with OR instead of AND
    #[arg(long)]
    pub match_any: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

// ── alerts ─────────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum AlertsCommands {
    /// Search alerts
    Search(AlertSearchArgs),
    /// Show one alert with its observations
    Show {
        alert_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Change the state of one or more alerts
    Update {
        #[arg(required = true)]
        alert_ids: Vec<String>,
        #[arg(long, value_enum)]
        state: AlertState,
        #[arg(long)]
        note: Option<String>,
    },
    /// Add a note to an alert
    AddNote {
        alert_id: String,
        #[arg(long)]
        note: String,
    },
}

#[derive(Args)]
pub struct AlertSearchArgs {
    #[command(flatten)]
    pub window: SearchWindowArgs,

    /// Alert states to include
    #[arg(long, value_enum)]
    pub state: Vec<AlertState>,

    /// Severities to include (LOW, MEDIUM, HIGH)
    #[arg(long)]
    pub severity: Vec<String>,

    #[arg(long)]
    pub rule_id: Vec<String>,

    /// Actor usernames to include
    #[arg(long)]
    pub actor: Vec<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

// ── cases ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum CasesCommands {
    /// List cases
    List(OutputArgs),
    /// Show one case
    Show {
        number: u64,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Create a case
    Create(CaseFields),
    /// Update a case
    Update {
        number: u64,
        #[command(flatten)]
        fields: CaseFields,
        #[arg(long, value_enum)]
        status: Option<CaseStatus>,
    },
    /// Delete a case
    Delete { number: u64 },
    /// File events attached to a case
    #[command(subcommand)]
    FileEvents(CaseFileEventsCommands),
}

#[derive(Args, Clone)]
pub struct CaseFields {
    #[arg(long)]
    pub name: Option<String>,
    /// Assignee user id or username
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub findings: Option<String>,
    /// Subject user id or username
    #[arg(long)]
    pub subject: Option<String>,
}

#[derive(Subcommand)]
pub enum CaseFileEventsCommands {
    /// List the file events on a case
    List {
        number: u64,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Attach a file event to a case
    Add { number: u64, event_id: String },
    /// Detach a file event from a case
    Remove { number: u64, event_id: String },
}

// ── users ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users
    List {
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        #[arg(long)]
        inactive: bool,
        #[arg(long)]
        blocked: Option<bool>,
        #[arg(long)]
        username: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show one user (id or username)
    Show {
        user: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List a user's devices
    Devices {
        user: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List a user's roles
    Roles {
        user: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Change a user's roles (ids or names)
    UpdateRoles {
        user: String,
        #[arg(long, value_delimiter = ',', required = true)]
        roles: Vec<String>,
        #[arg(long, value_enum, default_value_t = RoleMode::Replace)]
        mode: RoleMode,
    },
    /// Activate a user
    Activate { user: String },
    /// Deactivate a user
    Deactivate { user: String },
    /// Move a user to another organization
    Move {
        user: String,
        #[arg(long)]
        org_guid: String,
    },
    /// Activate every user listed in a file (column 'user')
    BulkActivate(BulkInputArgs),
    /// Deactivate every user listed in a file (column 'user')
    BulkDeactivate(BulkInputArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RoleMode {
    Replace,
    Add,
    Remove,
}

// ── devices ────────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum DevicesCommands {
    /// List devices
    List {
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        blocked: Option<bool>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show one device
    Show {
        device_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

// ── watchlists ─────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum WatchlistsCommands {
    /// List watchlists
    List(OutputArgs),
    /// Show a watchlist (id, type or title)
    Show {
        watchlist: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Create a watchlist
    Create {
        #[arg(long = "type", value_enum)]
        watchlist_type: WatchlistType,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a watchlist
    Delete { watchlist: String },
    /// List the actors on a watchlist
    ListMembers {
        watchlist: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Add actors (ids or names) to a watchlist
    Add(WatchlistMemberArgs),
    /// Remove actors (ids or names) from a watchlist
    Remove(WatchlistMemberArgs),
}

#[derive(Args)]
pub struct WatchlistMemberArgs {
    pub watchlist: String,

    /// Actor ids or names
    #[arg(long = "actor", required_unless_present = "file")]
    pub actors: Vec<String>,

    /// File of actors (column 'actor')
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = super::input::InputFormat::Csv)]
    pub file_format: super::input::InputFormat,
}

// ── actors ─────────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum ActorsCommands {
    /// Show an actor (id or name)
    Show {
        actor: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Search actors by name prefix
    Search {
        prefix: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

// ── agents ─────────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum AgentsCommands {
    /// List agents
    List {
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        healthy: Option<bool>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show one agent
    Show {
        agent_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Set or clear an agent's external reference
    Update {
        agent_id: String,
        #[arg(long, conflicts_with = "clear_external_reference")]
        external_reference: Option<String>,
        #[arg(long)]
        clear_external_reference: bool,
    },
    /// Activate every agent listed in a file (column 'agent_id')
    BulkActivate(BulkInputArgs),
    /// Deactivate every agent listed in a file (column 'agent_id')
    BulkDeactivate(BulkInputArgs),
}

// ── orgs ───────────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum OrgsCommands {
    /// List organizations
    List {
        /// List deactivated organizations instead
        #[arg(long)]
        inactive: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show an organization (guid or exact name)
    Show {
        org: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Create an organization
    Create(OrgFields),
    /// Update an organization
    Update {
        org_guid: String,
        #[command(flatten)]
        fields: OrgFields,
    },
    /// Activate an organization
    Activate { org_guid: String },
    /// Deactivate an organization
    Deactivate { org_guid: String },
}

#[derive(Args, Clone)]
pub struct OrgFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub ext_ref: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub parent_org_guid: Option<String>,
}

// ── legal-hold ─────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum LegalHoldCommands {
    /// List matters
    List {
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show one matter
    Show {
        matter_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Create a matter
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        policy_id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Deactivate a matter
    Deactivate { matter_id: String },
    /// Reactivate a matter
    Reactivate { matter_id: String },
    /// List a matter's custodians
    ListCustodians {
        matter_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Add a custodian (user id or username)
    AddCustodian {
        matter_id: String,
        #[arg(long)]
        user: String,
    },
    /// Remove a custodian (user id or username)
    RemoveCustodian {
        matter_id: String,
        #[arg(long)]
        user: String,
    },
}

// ── sessions ───────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum SessionsCommands {
    /// List sessions
    List {
        /// Actor id
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        has_alerts: Option<bool>,
        #[arg(long, value_enum)]
        state: Option<SessionState>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show one session
    Show {
        session_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Change a session's state and/or add a note
    Update {
        session_id: String,
        #[arg(long, value_enum)]
        state: Option<SessionState>,
        #[arg(long)]
        note: Option<String>,
    },
}

// ── risk-profiles ──────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum RiskProfilesCommands {
    /// List risk profiles
    List {
        #[arg(long)]
        manager_id: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        active: Option<bool>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show a risk profile (user id or username)
    Show {
        user: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Update notes and employment dates
    Update {
        user: String,
        #[arg(long)]
        notes: Option<String>,
        /// yyyy-MM-dd
        #[arg(long, conflicts_with = "clear_start_date")]
        start_date: Option<String>,
        /// yyyy-MM-dd
        #[arg(long, conflicts_with = "clear_end_date")]
        end_date: Option<String>,
        #[arg(long)]
        clear_start_date: bool,
        #[arg(long)]
        clear_end_date: bool,
    },
    /// Add cloud aliases
    AddCloudAliases {
        user: String,
        #[arg(required = true)]
        aliases: Vec<String>,
    },
    /// Remove cloud aliases
    RemoveCloudAliases {
        user: String,
        #[arg(required = true)]
        aliases: Vec<String>,
    },
}

// ── audit-log ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum AuditLogCommands {
    /// Search the audit log
    Search(AuditLogSearchArgs),
}

#[derive(Args)]
pub struct AuditLogSearchArgs {
    #[command(flatten)]
    pub window: SearchWindowArgs,

    #[arg(long)]
    pub event_type: Vec<String>,

    #[arg(long)]
    pub actor_id: Vec<String>,

    #[arg(long)]
    pub actor_name: Vec<String>,

    #[arg(long)]
    pub actor_ip: Vec<String>,

    #[arg(long)]
    pub affected_user_id: Vec<String>,

    #[arg(long)]
    pub affected_username: Vec<String>,

    /// Only print the number of matching events
    #[arg(long)]
    pub count: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

// ── trusted-activities ─────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum TrustedActivitiesCommands {
    /// List trusted activities
    List {
        #[arg(long = "type", value_enum)]
        activity_type: Option<ActivityType>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show one trusted activity
    Show {
        activity_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete a trusted activity
    Delete { activity_id: String },
}
