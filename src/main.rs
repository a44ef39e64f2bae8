use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use issuedesk::api::{ApiGateway, HttpGateway};
use issuedesk::commands;
use issuedesk::commands::create::CreateArgs;
use issuedesk::commands::update::UpdateArgs;
use issuedesk::config::{Config, Overrides};
use issuedesk::db::Database;
use issuedesk::interrupt::{Interrupt, EXIT_INTERRUPTED};
use issuedesk::session::SessionStore;
use issuedesk::workflow::FeedbackForm;

#[derive(Parser)]
#[command(name = "issuedesk")]
#[command(about = "Terminal client for the issuedesk issue tracker")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/issuedesk/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8000/api/v1
    #[arg(long, global = true, env = "ISSUEDESK_API_URL")]
    api_url: Option<String>,

    /// Where the session token is kept
    #[arg(long, global = true, env = "ISSUEDESK_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log filter (error, warn, info, debug, trace or a directive list)
    #[arg(long, global = true, env = "ISSUEDESK_LOG", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        username: String,
        /// Password (prompted when omitted)
        #[arg(long, env = "ISSUEDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Issue counts by status
    Dashboard,

    /// List issues
    List {
        /// Filter by status (open, in_progress, resolved, closed, rejected)
        #[arg(short, long)]
        status: Option<String>,
        /// Filter by priority (low, medium, high, urgent)
        #[arg(short, long)]
        priority: Option<String>,
        /// Filter by category (bug, feature, improvement, question, other)
        #[arg(short, long)]
        category: Option<String>,
        /// Search title and description
        #[arg(short = 'q', long)]
        search: Option<String>,
        /// Maximum number of issues
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },

    /// Show issue details with comments and feedback
    Show {
        /// Issue ID
        id: i64,
    },

    /// File a new issue
    Create {
        /// Issue title
        title: String,
        /// Issue description
        #[arg(short, long)]
        description: String,
        /// Category (bug, feature, improvement, question, other)
        #[arg(short, long)]
        category: Option<String>,
        /// Priority (low, medium, high, urgent)
        #[arg(short, long)]
        priority: Option<String>,
        /// Department ID
        #[arg(long)]
        department: Option<i64>,
        /// Project ID
        #[arg(long)]
        project: Option<i64>,
        /// Assignee user ID
        #[arg(long)]
        assignee: Option<i64>,
        /// Ask the AI for a category before filing
        #[arg(long)]
        ai_suggest: bool,
    },

    /// Ask the AI for a category and tags without filing
    Suggest {
        /// Issue title
        title: String,
        /// Issue description
        description: String,
    },

    /// Update an issue
    Update {
        /// Issue ID
        id: i64,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// New priority
        #[arg(short, long)]
        priority: Option<String>,
        /// New status
        #[arg(short, long)]
        status: Option<String>,
        /// New department ID
        #[arg(long)]
        department: Option<i64>,
        /// New project ID
        #[arg(long)]
        project: Option<i64>,
        /// New assignee user ID
        #[arg(long)]
        assignee: Option<i64>,
    },

    /// Close an issue
    Close {
        /// Issue ID
        id: i64,
    },

    /// Reopen a closed issue
    Reopen {
        /// Issue ID
        id: i64,
    },

    /// Add a comment to an issue
    Comment {
        /// Issue ID
        id: i64,
        /// Comment text
        text: String,
    },

    /// Rate how an issue was handled
    Feedback {
        /// Issue ID
        id: i64,
        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: Option<u8>,
        /// Mark as not satisfied
        #[arg(long)]
        unsatisfied: bool,
        /// Free-form feedback
        #[arg(short = 'm', long)]
        content: Option<String>,
        /// What could be done better
        #[arg(long)]
        suggestions: Option<String>,
    },

    /// Delete an issue
    Delete {
        /// Issue ID
        id: i64,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Ask the backend to recompute an issue's AI fields
    Reanalyze {
        /// Issue ID
        id: i64,
    },
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn open_session(config: &Config) -> Result<SessionStore> {
    config.ensure_data_dir()?;
    let gateway: Arc<dyn ApiGateway> = Arc::new(
        HttpGateway::new(&config.api_url, config.timeout).context("Failed to build HTTP client")?,
    );
    let db = Database::open(&config.session_db_path()).context("Failed to open session store")?;
    Ok(SessionStore::new(gateway, db))
}

async fn dispatch(command: Commands, session: &mut SessionStore) -> Result<()> {
    match command {
        Commands::Login { username, password } => {
            commands::auth::login(session, &username, password.as_deref()).await
        }

        Commands::Logout => {
            commands::auth::logout(session);
            Ok(())
        }

        Commands::Whoami => commands::auth::whoami(session).await,

        Commands::Dashboard => commands::dashboard::run(session).await,

        Commands::List {
            status,
            priority,
            category,
            search,
            limit,
        } => {
            let filter = commands::list::build_filter(
                status.as_deref(),
                priority.as_deref(),
                category.as_deref(),
                search.as_deref(),
                limit,
            )?;
            commands::list::run(session, &filter).await
        }

        Commands::Show { id } => commands::show::run(session, id).await,

        Commands::Create {
            title,
            description,
            category,
            priority,
            department,
            project,
            assignee,
            ai_suggest,
        } => {
            let args = CreateArgs {
                title: &title,
                description: &description,
                category: category.as_deref(),
                priority: priority.as_deref(),
                department,
                project,
                assignee,
            };
            commands::create::run(session, &args, ai_suggest).await
        }

        Commands::Suggest { title, description } => {
            commands::create::suggest(session, &title, &description).await
        }

        Commands::Update {
            id,
            title,
            description,
            category,
            priority,
            status,
            department,
            project,
            assignee,
        } => {
            let args = UpdateArgs {
                title: title.as_deref(),
                description: description.as_deref(),
                category: category.as_deref(),
                priority: priority.as_deref(),
                status: status.as_deref(),
                department,
                project,
                assignee,
            };
            commands::update::run(session, id, &args).await
        }

        Commands::Close { id } => commands::status::close(session, id).await,

        Commands::Reopen { id } => commands::status::reopen(session, id).await,

        Commands::Comment { id, text } => commands::comment::run(session, id, &text).await,

        Commands::Feedback {
            id,
            rating,
            unsatisfied,
            content,
            suggestions,
        } => {
            let form = FeedbackForm {
                rating,
                is_satisfied: !unsatisfied,
                content,
                improvement_suggestions: suggestions,
            };
            commands::feedback::run(session, id, form).await
        }

        Commands::Delete { id, force } => commands::delete::run(session, id, force).await,

        Commands::Reanalyze { id } => commands::reanalyze::run(session, id).await,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    let config = Config::load(&Overrides {
        config_path: cli.config,
        api_url: cli.api_url,
        data_dir: cli.data_dir,
    })?;
    tracing::debug!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "config loaded");

    let mut session = open_session(&config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let interrupt = Interrupt::install().context("Failed to install Ctrl-C handler")?;
    let cancelled = interrupt.token();

    let outcome = runtime.block_on(async {
        tokio::select! {
            result = dispatch(cli.command, &mut session) => Some(result),
            _ = cancelled.cancelled() => None,
        }
    });

    match outcome {
        Some(result) => result,
        None => {
            eprintln!("Interrupted.");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}
