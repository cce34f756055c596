//! Command tree. Each top-level subcommand corresponds to one dashboard page.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::api::normalize_base_url;
use crate::config::{AppConfig, SessionStoreKind};
use crate::error::{DashboardError, DashboardResult};
use crate::models::Id;

#[derive(Debug, Parser)]
#[command(name = "resto-admin", version)]
#[command(about = "Restaurant management dashboard")]
pub struct Cli {
    /// Backend base URL (overrides RESTO_API_BASE).
    #[arg(long, global = true)]
    pub api_base: Option<String>,
    /// Session store: keyring, file or memory.
    #[arg(long, global = true)]
    pub session_store: Option<String>,
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    pub page_size: Option<usize>,
    /// Request timeout in seconds; 0 keeps the transport default.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Apply flag values on top of the environment configuration.
    pub fn apply_overrides(&self, mut cfg: AppConfig) -> DashboardResult<AppConfig> {
        if let Some(base) = &self.api_base {
            cfg.api_base = normalize_base_url(base);
            if cfg.api_base.is_empty() {
                return Err(DashboardError::Config("--api-base is empty".into()));
            }
        }
        if let Some(kind) = &self.session_store {
            cfg.session_store = SessionStoreKind::parse(kind).ok_or_else(|| {
                DashboardError::Config(format!("unknown session store {kind:?}"))
            })?;
        }
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = dir.clone();
        }
        if let Some(size) = self.page_size {
            cfg.page_size = size.max(1);
        }
        if let Some(secs) = self.timeout_secs {
            cfg.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(cfg)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Exchange credentials for a session token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "RESTO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the current session: subject, roles, expiry.
    Whoami,
    /// Pages visible to the current user.
    Nav,
    #[command(subcommand)]
    Tables(TablesCommand),
    #[command(subcommand)]
    Reservations(ReservationsCommand),
    #[command(subcommand)]
    Orders(OrdersCommand),
    #[command(subcommand)]
    Billing(BillingCommand),
    #[command(subcommand)]
    Kitchen(KitchenCommand),
    #[command(subcommand)]
    Menu(MenuCommand),
    #[command(subcommand)]
    Employees(EmployeesCommand),
    #[command(subcommand)]
    Waiter(WaiterCommand),
    /// Today's counters and the monthly series.
    Reports {
        /// Print a text report with bar charts instead of JSON.
        #[arg(long)]
        text: bool,
    },
    /// Stream live order events as JSON lines.
    Live {
        /// Stop after this many events.
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Debug, Args)]
pub struct PageArg {
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Subcommand)]
pub enum TablesCommand {
    List(PageArg),
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "2")]
        capacity: String,
        #[arg(long, default_value = "AVAILABLE")]
        status: String,
    },
    Edit {
        id: Id,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        capacity: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    Remove {
        id: Id,
    },
}

// ---------------------------------------------------------------------------
// Reservations
// ---------------------------------------------------------------------------

#[derive(Debug, Args, Default)]
pub struct ReservationFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub party_size: Option<String>,
    /// ISO date-time; now when omitted on create.
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub table: Option<Id>,
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ReservationsCommand {
    List(PageArg),
    /// Table choices for a party, with derived availability.
    Options {
        #[arg(long, default_value = "2")]
        party_size: String,
    },
    Add(ReservationFields),
    Edit {
        id: Id,
        #[command(flatten)]
        fields: ReservationFields,
    },
    Remove {
        id: Id,
    },
    /// Export the invoice PDF of a completed reservation.
    Invoice {
        id: Id,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Also write the HTML rendering next to the PDF.
        #[arg(long)]
        html: bool,
    },
}

// ---------------------------------------------------------------------------
// Orders and billing
// ---------------------------------------------------------------------------

#[derive(Debug, Subcommand)]
pub enum OrdersCommand {
    List {
        /// ALL, NEW, IN_PROGRESS, COMPLETED or CANCELLED.
        #[arg(long, default_value = "ALL")]
        status: String,
        #[arg(long, default_value = "")]
        search: String,
        #[command(flatten)]
        page: PageArg,
    },
    Create {
        #[arg(long)]
        table: Option<Id>,
        #[arg(long)]
        customer: Option<String>,
        /// Line item as MENU_ITEM_ID[:QTY]; repeatable.
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        reservation: Option<Id>,
    },
    /// Export the invoice PDF of a single order.
    Invoice {
        id: Id,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long)]
        html: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum BillingCommand {
    /// Fetch the backend invoice for an order.
    Show { order_id: Id },
    Pay {
        invoice_id: Id,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "CASH")]
        method: String,
    },
}

// ---------------------------------------------------------------------------
// Kitchen, menu, employees, waiter
// ---------------------------------------------------------------------------

#[derive(Debug, Subcommand)]
pub enum KitchenCommand {
    List,
    Start { order_id: Id, item_id: Id },
    Done { order_id: Id, item_id: Id },
}

#[derive(Debug, Args, Default)]
pub struct MenuFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub available: Option<bool>,
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum MenuCommand {
    List(PageArg),
    Add(MenuFields),
    Edit {
        id: Id,
        #[command(flatten)]
        fields: MenuFields,
    },
    Remove {
        id: Id,
    },
}

#[derive(Debug, Args, Default)]
pub struct EmployeeFields {
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// Role id or name, e.g. ROLE_WAITER.
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long, env = "RESTO_EMPLOYEE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum EmployeesCommand {
    List(PageArg),
    Roles,
    Add {
        #[arg(long)]
        username: String,
        #[command(flatten)]
        fields: EmployeeFields,
    },
    Edit {
        id: Id,
        #[command(flatten)]
        fields: EmployeeFields,
    },
    Remove {
        id: Id,
    },
}

#[derive(Debug, Subcommand)]
pub enum WaiterCommand {
    Board,
    Serve { table_id: Id },
    /// Keep polling the board and print every refresh.
    Watch {
        /// Stop after this many refreshes.
        #[arg(long)]
        count: Option<u64>,
    },
}
