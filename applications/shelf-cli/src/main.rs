/// Shelf - command-line front end for the library backend
mod config;
mod retry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::CliConfig;
use retry::with_backoff;
use shelf_client::{AdminListQuery, BookQuery, Envelope, FileStore, MessageQuery, ShelfClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Browse, borrow and administer a Shelf library", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "SHELF_PASSWORD", hide_env_values = true)]
        password: String,
        /// Use the admin login endpoint
        #[arg(long)]
        admin: bool,
    },
    /// Log out and forget the session
    Logout,
    /// Show the stored session
    Whoami,
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "SHELF_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Request a password reset token
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password with a reset token
    ResetPassword {
        #[arg(short, long)]
        token: String,
        #[arg(short, long, env = "SHELF_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the logged-in user's profile
    Profile,
    /// Browse the catalogue
    Books {
        #[command(subcommand)]
        command: BookCommands,
    },
    /// Borrow a book
    Borrow { book_id: String },
    /// Return a borrowed book
    Return { book_id: String },
    /// List borrowings (defaults to the logged-in user)
    Borrowings {
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Admin console
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Check that the backend is up
    Health,
}

#[derive(Subcommand)]
enum BookCommands {
    /// List books
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        category: Option<String>,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show one book
    Show { book_id: String },
    /// List categories
    Categories,
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Dashboard statistics
    Dashboard,
    /// List members
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Suspend a member
    Suspend { user_id: String },
    /// Reactivate a suspended member
    Unsuspend { user_id: String },
    /// Recent admin activity
    Activity {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Contact messages
    Messages {
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Recycle the backend's database pool (if supported)
    ResetPool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelf=info,shelf_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref())?;
    let store = FileStore::open(&config.session_file).with_context(|| {
        format!(
            "Failed to open session file {}",
            config.session_file.display()
        )
    })?;
    let client = ShelfClient::new(config.api.clone(), Arc::new(store))?;

    tracing::debug!(api = %client.url("/"), "Client ready");

    run(&client, &config, cli.command).await
}

async fn run(client: &ShelfClient, config: &CliConfig, command: Commands) -> Result<()> {
    let response = match command {
        Commands::Login {
            email,
            password,
            admin,
        } => {
            if admin {
                client.auth().admin_login(&email, &password).await
            } else {
                client.auth().login(&email, &password).await
            }
        }
        Commands::Logout => client.auth().logout().await,
        Commands::Whoami => {
            whoami(client).await;
            return Ok(());
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            client
                .auth()
                .register(&name, &email, &password, &password)
                .await
        }
        Commands::ForgotPassword { email } => client.auth().forgot_password(&email).await,
        Commands::ResetPassword { token, password } => {
            client
                .auth()
                .reset_password(&token, &password, &password)
                .await
        }
        Commands::Profile => {
            let users = client.users();
            with_backoff(&config.retry, || users.profile()).await
        }
        Commands::Books { command } => books(client, config, command).await,
        Commands::Borrow { book_id } => client.borrowing().borrow(&book_id).await,
        Commands::Return { book_id } => client.borrowing().return_book(&book_id).await,
        Commands::Borrowings { user } => match user {
            Some(user) => client.borrowing().for_user(&user).await,
            None => client.borrowing().current().await,
        },
        Commands::Admin { command } => admin(client, config, command).await,
        Commands::Health => with_backoff(&config.retry, || client.health_check()).await,
    };

    print_envelope(&response?)
}

async fn books(
    client: &ShelfClient,
    config: &CliConfig,
    command: BookCommands,
) -> shelf_client::Result<Envelope> {
    match command {
        BookCommands::List {
            page,
            limit,
            category,
            search,
            sort,
        } => {
            let query = BookQuery {
                page,
                limit,
                category,
                search,
                sort,
            };
            let books = client.books();
            with_backoff(&config.retry, || books.list(&query)).await
        }
        BookCommands::Show { book_id } => client.books().get(&book_id).await,
        BookCommands::Categories => client.books().categories().await,
    }
}

async fn admin(
    client: &ShelfClient,
    config: &CliConfig,
    command: AdminCommands,
) -> shelf_client::Result<Envelope> {
    let admin = client.admin();
    match command {
        AdminCommands::Dashboard => with_backoff(&config.retry, || admin.dashboard()).await,
        AdminCommands::Users {
            page,
            limit,
            search,
            filter,
        } => {
            let query = AdminListQuery {
                page,
                limit,
                search,
                filter,
            };
            with_backoff(&config.retry, || admin.users(&query)).await
        }
        AdminCommands::Suspend { user_id } => admin.suspend_user(&user_id).await,
        AdminCommands::Unsuspend { user_id } => admin.unsuspend_user(&user_id).await,
        AdminCommands::Activity { limit } => admin.recent_activity(limit).await,
        AdminCommands::Messages { status, search } => {
            let query = MessageQuery {
                status,
                search,
                ..MessageQuery::default()
            };
            client.contact().messages(&query).await
        }
        AdminCommands::ResetPool => admin.reset_pool().await,
    }
}

async fn whoami(client: &ShelfClient) {
    let session = client.session().await;
    if session.access_token.is_none() {
        println!("Not logged in");
        return;
    }

    println!(
        "Logged in as user {}",
        session.user_id.as_deref().unwrap_or("(unknown)")
    );
    if client.is_super_admin() {
        println!("Role: super admin");
    } else if client.is_admin() {
        println!("Role: admin");
    }
}

fn print_envelope(envelope: &Envelope) -> Result<()> {
    let rendered = serde_json::to_string_pretty(envelope).context("Failed to render response")?;
    println!("{}", rendered);
    Ok(())
}
