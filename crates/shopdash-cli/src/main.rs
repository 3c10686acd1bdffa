//! shopdash - command line admin dashboard for DummyJSON-style store APIs.
//!
//! Logs in once, then lists and edits products, browses users and shows
//! dashboard statistics. Expired access tokens are refreshed transparently;
//! when the refresh itself fails the session ends and the user is asked to
//! log in again.

mod app;
mod output;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use shopdash_core::models::{ProductDraft, ProductFilters, ProductPatch, SortOrder, UserFilters};
use shopdash_core::{ApiError, Config};

/// Log file prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "shopdash.log";

#[derive(Parser)]
#[command(name = "shopdash", version)]
#[command(about = "Admin dashboard for DummyJSON-style store APIs")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the issued tokens
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Forget stored tokens and cached data
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show configuration, credential and cache status
    Status,

    /// Browse and edit products
    Products {
        #[command(subcommand)]
        command: ProductsCommand,
    },

    /// Browse users
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },

    /// Show dashboard statistics
    Stats {
        /// Ignore cached statistics
        #[arg(long)]
        refresh: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProductsCommand {
    /// List products
    List(ProductListArgs),

    /// Show one product
    Show { id: i64 },

    /// List product categories
    Categories {
        /// Ignore the cached category list
        #[arg(long)]
        refresh: bool,
    },

    /// Create a product
    Add(ProductAddArgs),

    /// Update fields of a product
    Update {
        id: i64,

        #[command(flatten)]
        fields: ProductUpdateArgs,
    },

    /// Delete a product
    Delete { id: i64 },
}

#[derive(Args)]
struct ProductListArgs {
    /// Full-text search (takes precedence over --category)
    #[arg(short, long)]
    search: Option<String>,

    /// Category slug, or "all"
    #[arg(short, long)]
    category: Option<String>,

    /// Field to sort by, e.g. price or rating
    #[arg(long)]
    sort_by: Option<String>,

    /// asc or desc
    #[arg(long)]
    order: Option<SortOrder>,

    /// Page size (defaults to the configured page size)
    #[arg(short, long)]
    limit: Option<u32>,

    #[arg(long, default_value_t = 0)]
    skip: u32,
}

#[derive(Args)]
struct ProductAddArgs {
    #[arg(long)]
    title: String,

    #[arg(long)]
    description: String,

    #[arg(long)]
    price: f64,

    #[arg(long)]
    brand: String,

    #[arg(long)]
    category: String,

    #[arg(long, default_value_t = 0)]
    stock: i64,

    /// Discount percentage (0-100)
    #[arg(long, default_value_t = 0.0)]
    discount: f64,

    #[arg(long)]
    thumbnail: Option<String>,

    /// Image URL (repeatable)
    #[arg(long = "image")]
    images: Vec<String>,
}

#[derive(Args)]
struct ProductUpdateArgs {
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    price: Option<f64>,

    #[arg(long)]
    brand: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    stock: Option<i64>,

    /// Discount percentage (0-100)
    #[arg(long)]
    discount: Option<f64>,

    #[arg(long)]
    thumbnail: Option<String>,

    /// Replace the image list (repeatable)
    #[arg(long = "image")]
    images: Vec<String>,
}

#[derive(Subcommand)]
enum UsersCommand {
    /// List users
    List {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        limit: Option<u32>,

        #[arg(long, default_value_t = 0)]
        skip: u32,
    },

    /// Show one user
    Show { id: i64 },
}

impl ProductListArgs {
    fn into_filters(self, page_size: u32) -> ProductFilters {
        ProductFilters {
            search: self.search,
            category: self.category,
            sort_by: self.sort_by,
            order: self.order,
            limit: self.limit.unwrap_or(page_size),
            skip: self.skip,
        }
    }
}

impl From<ProductAddArgs> for ProductDraft {
    fn from(args: ProductAddArgs) -> Self {
        ProductDraft {
            title: args.title,
            description: args.description,
            price: args.price,
            discount_percentage: args.discount,
            stock: args.stock,
            brand: args.brand,
            category: args.category,
            thumbnail: args.thumbnail.unwrap_or_default(),
            images: args.images,
        }
    }
}

impl From<ProductUpdateArgs> for ProductPatch {
    fn from(args: ProductUpdateArgs) -> Self {
        ProductPatch {
            title: args.title,
            description: args.description,
            price: args.price,
            discount_percentage: args.discount,
            stock: args.stock,
            brand: args.brand,
            category: args.category,
            thumbnail: args.thumbnail,
            images: (!args.images.is_empty()).then_some(args.images),
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// RUST_LOG controls the level (default warn); --verbose forces debug for
/// shopdash crates. When a log directory is available a daily-rolling file
/// is written alongside stderr. The returned guard must stay alive until
/// exit so buffered lines are flushed.
fn init_tracing(verbose: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = if verbose {
        EnvFilter::new("warn,shopdash=debug,shopdash_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_dir = config.cache_dir().ok();
    if let Some(ref dir) = log_dir {
        let _ = std::fs::create_dir_all(dir);
    }
    let _guard = init_tracing(cli.verbose, log_dir.as_deref());
    info!(api = %config.api_base_url, "shopdash starting");

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> Result<()> {
    let page_size = config.page_size;
    let mut app = App::new(config)?;

    match command {
        Command::Login { username } => app.login(username).await,
        Command::Logout => app.logout(),
        Command::Whoami => app.whoami().await,
        Command::Status => app.status(),
        Command::Products { command } => match command {
            ProductsCommand::List(args) => app.list_products(&args.into_filters(page_size)).await,
            ProductsCommand::Show { id } => app.show_product(id).await,
            ProductsCommand::Categories { refresh } => app.categories(refresh).await,
            ProductsCommand::Add(args) => app.add_product(&args.into()).await,
            ProductsCommand::Update { id, fields } => app.update_product(id, &fields.into()).await,
            ProductsCommand::Delete { id } => app.delete_product(id).await,
        },
        Command::Users { command } => match command {
            UsersCommand::List { search, limit, skip } => {
                let filters = UserFilters {
                    search,
                    limit: limit.unwrap_or(page_size),
                    skip,
                };
                app.list_users(&filters).await
            }
            UsersCommand::Show { id } => app.show_user(id).await,
        },
        Command::Stats { refresh, json } => app.stats(refresh, json).await,
    }
}

fn report_error(error: &anyhow::Error) {
    debug!(error = ?error, "Command failed");
    let session_expired = error
        .downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_session_expired);
    if session_expired {
        eprintln!("Session expired. Please log in again.");
    } else {
        eprintln!("Error: {:#}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_limit_falls_back_to_page_size() {
        let cli = Cli::parse_from(["shopdash", "products", "list", "--category", "laptops"]);
        let Command::Products { command: ProductsCommand::List(args) } = cli.command else {
            panic!("expected products list");
        };
        let filters = args.into_filters(25);
        assert_eq!(filters.limit, 25);
        assert_eq!(filters.category.as_deref(), Some("laptops"));
    }

    #[test]
    fn test_order_parses() {
        let cli = Cli::parse_from(["shopdash", "products", "list", "--sort-by", "price", "--order", "DESC"]);
        let Command::Products { command: ProductsCommand::List(args) } = cli.command else {
            panic!("expected products list");
        };
        assert_eq!(args.order, Some(SortOrder::Desc));
    }

    #[test]
    fn test_update_flags_map_to_patch() {
        let cli = Cli::parse_from(["shopdash", "products", "update", "4", "--price", "9.5", "--discount", "10"]);
        let Command::Products { command: ProductsCommand::Update { id, fields } } = cli.command else {
            panic!("expected products update");
        };
        let patch: ProductPatch = fields.into();
        assert_eq!(id, 4);
        assert_eq!(patch.price, Some(9.5));
        assert_eq!(patch.discount_percentage, Some(10.0));
        assert!(patch.title.is_none());
        assert!(patch.images.is_none());
    }

    #[test]
    fn test_update_images_replace_list() {
        let cli = Cli::parse_from([
            "shopdash", "products", "update", "4",
            "--image", "https://cdn.example.com/a.png",
            "--image", "https://cdn.example.com/b.png",
        ]);
        let Command::Products { command: ProductsCommand::Update { fields, .. } } = cli.command else {
            panic!("expected products update");
        };
        let patch: ProductPatch = fields.into();
        assert_eq!(
            patch.images,
            Some(vec![
                "https://cdn.example.com/a.png".to_string(),
                "https://cdn.example.com/b.png".to_string(),
            ])
        );
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::parse_from(["shopdash", "stats", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_session_expiry_is_detected_through_anyhow() {
        let err: anyhow::Error = ApiError::Refresh(shopdash_core::RefreshError::Abandoned).into();
        assert!(err.downcast_ref::<ApiError>().is_some_and(ApiError::is_session_expired));
    }
}
