//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pms_domain::{HttpMethod, ListQuery, ReportType, Resource, UserType};

/// Property-management console.
#[derive(Parser, Debug)]
#[command(name = "pms", version, about)]
pub struct Cli {
    /// Settings file; defaults to `pms.toml` in the working directory.
    #[arg(long, short, global = true, env = "PMS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log: String,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Console commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Sign in and store the session tokens.
    Login {
        /// Account user name.
        #[arg(long, short)]
        username: String,
        /// Password; read from stdin when omitted.
        #[arg(long, env = "PMS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in as it.
    Register {
        /// Account user name.
        #[arg(long, short)]
        username: String,
        /// Email address.
        #[arg(long)]
        email: String,
        /// Password; read from stdin when omitted.
        #[arg(long, env = "PMS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// One of `admin`, `manager`, `owner`, `tenant`.
        #[arg(long, default_value = "owner", value_parser = parse_user_type)]
        user_type: UserType,
        /// Given name.
        #[arg(long, default_value = "")]
        first_name: String,
        /// Family name.
        #[arg(long, default_value = "")]
        last_name: String,
        /// Contact phone.
        #[arg(long)]
        phone: Option<String>,
    },
    /// Sign out and forget the session tokens.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Show connection and session details.
    Status,
    /// List a collection.
    List {
        /// Collection, e.g. `properties` or `accounting/transactions`.
        resource: Resource,
        #[command(flatten)]
        query: ListArgs,
    },
    /// Show one item.
    Get {
        /// Collection.
        resource: Resource,
        /// Item id.
        id: String,
    },
    /// Create an item from a JSON object.
    Create {
        /// Collection.
        resource: Resource,
        /// JSON body.
        #[arg(long, short)]
        data: String,
    },
    /// Change an item.
    Update {
        /// Collection.
        resource: Resource,
        /// Item id.
        id: String,
        /// JSON body.
        #[arg(long, short)]
        data: String,
        /// Send the whole item with PUT instead of a partial PATCH.
        #[arg(long)]
        replace: bool,
    },
    /// Delete an item.
    Delete {
        /// Collection.
        resource: Resource,
        /// Item id.
        id: String,
    },
    /// Call a custom action, e.g. `leases renew --id 3`.
    Action {
        /// Collection.
        resource: Resource,
        /// Action name.
        action: String,
        /// Item id, for actions on a single item.
        #[arg(long)]
        id: Option<String>,
        /// HTTP method.
        #[arg(long, default_value = "POST")]
        method: HttpMethod,
        /// JSON body.
        #[arg(long, short)]
        data: Option<String>,
    },
    /// Upload a file as multipart form data, e.g. a document.
    Upload {
        /// Collection.
        resource: Resource,
        /// File to send.
        file: PathBuf,
        /// Form field carrying the file.
        #[arg(long, default_value = "file")]
        file_field: String,
        /// Extra form fields as `name=value`.
        #[arg(long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
    },
    /// Generate and manage reports.
    #[command(subcommand)]
    Reports(ReportsCommand),
    /// Fill document templates and fetch the results.
    #[command(subcommand)]
    Templates(TemplatesCommand),
}

/// Paging and filters for `list`.
#[derive(clap::Args, Debug, Default, PartialEq, Eq)]
pub struct ListArgs {
    /// Page number, starting at 1.
    #[arg(long)]
    pub page: Option<u32>,
    /// Items per page.
    #[arg(long)]
    pub page_size: Option<u32>,
    /// Full-text search term.
    #[arg(long)]
    pub search: Option<String>,
    /// Ordering field; prefix with `-` for descending.
    #[arg(long)]
    pub ordering: Option<String>,
    /// Field filter as `name=value`; repeatable.
    #[arg(long = "filter", value_parser = parse_key_val)]
    pub filters: Vec<(String, String)>,
}

impl ListArgs {
    /// Converts the arguments into a listing query.
    #[must_use]
    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            page_size: self.page_size,
            search: self.search.clone(),
            ordering: self.ordering.clone(),
            filters: self.filters.clone(),
        }
    }
}

/// `reports` subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ReportsCommand {
    /// Generate a report.
    Generate {
        /// One of `financial_summary`, `property_performance`,
        /// `tenant_report`, `maintenance_report`.
        #[arg(value_parser = parse_report_type)]
        report_type: ReportType,
        /// First day covered (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,
        /// Last day covered (YYYY-MM-DD).
        #[arg(long)]
        end: NaiveDate,
        /// Restrict to a property; repeatable.
        #[arg(long = "property")]
        property_ids: Vec<u64>,
        /// Custom title.
        #[arg(long)]
        title: Option<String>,
    },
    /// List generated reports.
    List,
    /// List report templates.
    Templates,
    /// Delete a generated report.
    Delete {
        /// Report id.
        id: String,
    },
}

/// `templates` subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum TemplatesCommand {
    /// List active templates.
    List {
        /// Template category.
        #[arg(long)]
        category: Option<String>,
        /// Template type, e.g. `lease_agreement`.
        #[arg(long = "type")]
        template_type: Option<String>,
    },
    /// Show a template with its variables.
    Show {
        /// Template id.
        id: u64,
    },
    /// Describe the variables a template expects.
    Variables {
        /// Template id.
        id: u64,
    },
    /// Generate a document from a template.
    Generate {
        /// Template id.
        template_id: u64,
        /// Variable values as a JSON object.
        #[arg(long = "vars")]
        variables: Option<String>,
        /// Document title.
        #[arg(long)]
        title: Option<String>,
        /// Model the document belongs to, e.g. `lease`.
        #[arg(long, requires = "related_id")]
        related_model: Option<String>,
        /// Id of the related record.
        #[arg(long, requires = "related_model")]
        related_id: Option<u64>,
    },
    /// List generated documents.
    Generated {
        /// `draft`, `generated`, `signed` or `archived`.
        #[arg(long)]
        status: Option<String>,
        /// Template type.
        #[arg(long = "type")]
        template_type: Option<String>,
    },
    /// Save a generated document to disk.
    Download {
        /// Document id.
        id: u64,
        /// Target file; defaults to the server's file name.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Check template source without saving it.
    Validate {
        /// File holding the template source.
        file: PathBuf,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

fn parse_report_type(raw: &str) -> Result<ReportType, String> {
    serde_json::from_value(serde_json::Value::String(raw.replace('-', "_")))
        .map_err(|_| format!("unknown report type `{raw}`"))
}

fn parse_user_type(raw: &str) -> Result<UserType, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))
        .map_err(|_| format!("unknown user type `{raw}`"))
}
