use clap::{Args, Parser, Subcommand};
use chrono::NaiveDate;
use serde::Deserialize;
use snafu::{ResultExt, ensure};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::Result;
use crate::error::{ConfigFileSnafu, ConfigParseSnafu, ConfigSnafu};
use crate::export::ExportFormat;
use crate::listing::{SortDirection, SortKey};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub session_file: PathBuf,
    pub export_dir: PathBuf,

    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,

    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_debounce_ms() -> u64 {
    600
}

fn default_per_page() -> u32 {
    10
}

impl Config {
    pub fn build(filename: &PathBuf) -> Result<Config> {
        let toml_string = fs::read_to_string(filename).context(ConfigFileSnafu)?;
        let config = Config::parse(toml_string.as_str())?;

        ensure!(
            config.export_dir.exists(),
            ConfigSnafu {
                msg: "Export directory does not exist.".to_string()
            }
        );

        Ok(config)
    }

    pub fn parse(toml_string: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(toml_string).context(ConfigParseSnafu)?;
        config.api_url = config.api_url.trim_end_matches('/').to_string();

        // Validate config values
        ensure!(
            config.api_url.len() > 0,
            ConfigSnafu {
                msg: "API URL is required.".to_string()
            }
        );
        ensure!(
            config.session_file.as_os_str().len() > 0,
            ConfigSnafu {
                msg: "Session file is required.".to_string()
            }
        );
        ensure!(
            (500..=800).contains(&config.search_debounce_ms),
            ConfigSnafu {
                msg: "Search debounce must be between 500 and 800 ms.".to_string()
            }
        );
        ensure!(
            config.per_page > 0,
            ConfigSnafu {
                msg: "Items per page is required.".to_string()
            }
        );

        Ok(config)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Pharmacy distribution back-office console
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, value_name = "config.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Signs in and stores the session token
    Login,

    /// Clears the stored session token
    Logout,

    /// Shows the signed in user
    Whoami,

    /// Lists organizations
    Orgs(ListArgs),

    /// Lists orders
    Orders(ListArgs),

    /// Lists orders awaiting review
    Pending(ListArgs),

    /// Shows a single order
    Order { id: String },

    /// Approves a pending order
    Approve(ApproveArgs),

    /// Rejects a pending order
    Reject {
        id: String,

        #[arg(short, long)]
        reason: String,
    },

    /// Shows a single organization
    Org { id: String },

    /// Registers a new organization, prompting for each field
    RegisterOrg,

    /// Updates the onboarding status of an organization
    OrgStatus { id: String, status: String },

    /// Lists products
    Products,

    /// Edits the unit type and batch size tags of a product
    ProductTags(ProductTagArgs),

    /// Shows order and organization totals
    Dashboard,

    /// Search as you type, one line per keystroke
    Search { list: ListKind },

    /// Exports a list to csv, xls or a printable document
    Export {
        list: ListKind,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[command(flatten)]
        filter: ListArgs,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum ListKind {
    Orgs,
    Orders,
    Pending,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<NaiveDate>,

    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: Option<NaiveDate>,

    #[arg(long)]
    pub min_price: Option<f64>,

    #[arg(long)]
    pub max_price: Option<f64>,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,

    #[arg(long, value_enum, default_value = "asc")]
    pub direction: SortDirection,

    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long)]
    pub per_page: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct ApproveArgs {
    pub id: String,

    /// Comma separated batch sizes, e.g. 10,20,30
    #[arg(long, default_value = "")]
    pub batch_sizes: String,

    #[arg(long, default_value = "")]
    pub mrp: String,

    #[arg(long, default_value = "")]
    pub size_code: String,

    #[arg(long, value_name = "YYYY-MM-DD", default_value = "")]
    pub delivery: String,
}

#[derive(Args, Debug, Clone)]
pub struct ProductTagArgs {
    pub id: String,

    #[arg(long)]
    pub add_unit: Vec<String>,

    #[arg(long)]
    pub remove_unit: Vec<String>,

    #[arg(long)]
    pub add_batch: Vec<String>,

    #[arg(long)]
    pub remove_batch: Vec<String>,
}
