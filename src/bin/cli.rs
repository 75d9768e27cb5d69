use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use microblog::{
    config::Settings,
    db,
    models::{CreateMicropostRequest, CreateUserRequest, Micropost, UpdateUserRequest, User},
    services::{token, TokenDigest, UserService},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "microblog-cli")]
#[command(about = "CLI tool for managing microblog users and posts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Micropost commands
    Post {
        #[command(subcommand)]
        command: PostCommands,
    },

    /// Remember-token utilities (no database needed)
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Change a user's name, email and password
    Update {
        /// Current email address of the user
        #[arg(short, long)]
        email: String,

        /// New display name (keeps the current one if omitted)
        #[arg(short, long)]
        name: Option<String>,

        /// New email address (keeps the current one if omitted)
        #[arg(long)]
        new_email: Option<String>,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Find users whose name contains a phrase
    Search {
        /// Phrase to look for, case-insensitive (lists everyone if omitted)
        phrase: Option<String>,
    },

    /// Show one user as JSON
    Show {
        #[arg(short, long)]
        email: String,
    },

    /// Delete a user with all of its posts and follow edges
    Delete {
        /// Email address of the user to delete
        #[arg(short, long)]
        email: String,
    },

    /// Check a password against the stored digest
    Authenticate {
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Make one user follow another
    Follow {
        /// Email of the follower
        #[arg(short, long)]
        email: String,

        /// Email of the user to follow
        #[arg(short, long)]
        target: String,
    },

    /// Remove a follow edge
    Unfollow {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        target: String,
    },

    /// List the users someone follows
    Following {
        #[arg(short, long)]
        email: String,
    },

    /// List someone's followers
    Followers {
        #[arg(short, long)]
        email: String,
    },

    /// Show the posts of followed users and the user's own
    Feed {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, default_value_t = 30)]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum PostCommands {
    /// Publish a micropost
    Create {
        /// Email of the author
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        content: String,
    },

    /// List a user's microposts
    List {
        #[arg(short, long)]
        email: String,

        /// Only posts containing this phrase, case-insensitive
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Delete a micropost by id
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Print a fresh remember token and its digest
    New,

    /// Digest a value
    Digest {
        value: String,

        /// sha1 or sha256 (defaults to REMEMBER_TOKEN_DIGEST, then sha1)
        #[arg(short, long)]
        algorithm: Option<TokenDigest>,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn confirm_password(prompt: &str) -> anyhow::Result<(String, String)> {
    let password = get_password(prompt)?;
    let confirm = get_password("Confirm password")?;
    Ok((password, confirm))
}

async fn require_user(user_service: &UserService, email: &str) -> anyhow::Result<User> {
    match user_service.find_user_by_email(email).await? {
        Some(user) => Ok(user),
        None => bail!("User '{}' not found", email),
    }
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users found.");
        return;
    }

    println!("{:<5} {:<30} {:<40} {:<20}", "ID", "Name", "Email", "Created");
    println!("{}", "-".repeat(95));
    for user in users {
        println!(
            "{:<5} {:<30} {:<40} {:<20}",
            user.id, user.name, user.email, user.created_at
        );
    }
}

fn print_microposts(microposts: &[Micropost]) {
    if microposts.is_empty() {
        println!("No microposts found.");
        return;
    }

    for micropost in microposts {
        println!(
            "#{:<5} user {:<5} {}  {}",
            micropost.id, micropost.user_id, micropost.created_at, micropost.content
        );
    }
}

fn run_token(command: TokenCommands) -> anyhow::Result<()> {
    let configured = Settings::token_digest_from_env()?;

    match command {
        TokenCommands::New => {
            let remember_token = token::new_remember_token();
            println!("Token:  {}", remember_token);
            println!("Digest: {}", configured.digest(&remember_token));
        }
        TokenCommands::Digest { value, algorithm } => {
            println!("{}", algorithm.unwrap_or(configured).digest(&value));
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<AppState> {
    let settings = Settings::from_env()?;

    // Connect to database
    let pool = db::create_pool(&settings)
        .await
        .context("Failed to open database")?;

    // Run migrations
    db::run_migrations(&pool).await?;

    Ok(AppState::new(pool, settings.token_digest))
}

async fn run_user(command: UserCommands, state: &AppState) -> anyhow::Result<()> {
    let user_service = state.user_service.as_ref();

    match command {
        UserCommands::Create {
            name,
            email,
            password,
        } => {
            let (password, password_confirm) = if let Some(pw) = password {
                (pw.clone(), pw)
            } else {
                confirm_password("Password")?
            };

            let request = CreateUserRequest {
                name,
                email,
                password,
                password_confirm: Some(password_confirm),
            };

            let user = user_service
                .create_user(request)
                .await
                .context("Failed to create user")?;
            println!("✅ User created successfully!");
            println!("  ID: {}", user.id);
            println!("  Name: {}", user.name);
            println!("  Email: {}", user.email);
        }

        UserCommands::Update {
            email,
            name,
            new_email,
            password,
        } => {
            let user = require_user(user_service, &email).await?;
            let (password, password_confirm) = if let Some(pw) = password {
                (pw.clone(), pw)
            } else {
                confirm_password("Password")?
            };

            let request = UpdateUserRequest {
                user_id: user.id,
                name: name.unwrap_or(user.name),
                email: new_email.unwrap_or(user.email),
                password,
                password_confirm: Some(password_confirm),
            };

            let updated = user_service
                .update_user(request)
                .await
                .context("Failed to update user")?;
            println!("✅ User '{}' updated successfully!", updated.email);
        }

        UserCommands::List { limit, offset } => {
            let users = user_service
                .fetch_users(&User::search(None), Some(limit), Some(offset))
                .await?;
            print_users(&users);
        }

        UserCommands::Search { phrase } => {
            let scope = User::search(phrase.as_deref());
            let users = user_service.fetch_users(&scope, None, None).await?;
            print_users(&users);
        }

        UserCommands::Show { email } => {
            let user = require_user(user_service, &email).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }

        UserCommands::Delete { email } => {
            let user = require_user(user_service, &email).await?;
            user_service
                .delete_user(user.id)
                .await
                .context("Failed to delete user")?;
            println!("✅ User '{}' deleted successfully!", email);
        }

        UserCommands::Authenticate { email, password } => {
            let password = match password {
                Some(pw) => pw,
                None => get_password("Password")?,
            };

            match user_service.authenticate(&email, &password).await {
                Ok(user) => println!("✅ Authenticated as '{}' (ID {})", user.name, user.id),
                Err(err) => {
                    eprintln!("❌ {}", err);
                    std::process::exit(1);
                }
            }
        }

        UserCommands::Follow { email, target } => {
            let user = require_user(user_service, &email).await?;
            let other = require_user(user_service, &target).await?;
            user_service.follow(&user, &other).await?;
            println!("✅ '{}' now follows '{}'", email, target);
        }

        UserCommands::Unfollow { email, target } => {
            let user = require_user(user_service, &email).await?;
            let other = require_user(user_service, &target).await?;
            user_service.unfollow(&user, &other).await?;
            println!("✅ '{}' no longer follows '{}'", email, target);
        }

        UserCommands::Following { email } => {
            let user = require_user(user_service, &email).await?;
            let users = user_service
                .fetch_users(&user.followed_users(), None, None)
                .await?;
            print_users(&users);
        }

        UserCommands::Followers { email } => {
            let user = require_user(user_service, &email).await?;
            let users = user_service
                .fetch_users(&user.followers(), None, None)
                .await?;
            print_users(&users);
        }

        UserCommands::Feed { email, limit } => {
            let user = require_user(user_service, &email).await?;
            let microposts = user_service
                .fetch_microposts(&user.feed(), Some(limit), None)
                .await?;
            print_microposts(&microposts);
        }
    }

    Ok(())
}

async fn run_post(command: PostCommands, state: &AppState) -> anyhow::Result<()> {
    let user_service = state.user_service.as_ref();

    match command {
        PostCommands::Create { email, content } => {
            let user = require_user(user_service, &email).await?;
            let micropost = state
                .micropost_service
                .post(CreateMicropostRequest {
                    user_id: user.id,
                    content,
                })
                .await
                .context("Failed to create micropost")?;
            println!("✅ Micropost #{} created", micropost.id);
        }

        PostCommands::List { email, filter } => {
            let user = require_user(user_service, &email).await?;
            let scope = user.filtered_microposts(filter.as_deref());
            let microposts = user_service.fetch_microposts(&scope, None, None).await?;
            print_microposts(&microposts);
        }

        PostCommands::Delete { id } => {
            state.micropost_service.delete(id).await?;
            println!("✅ Micropost #{} deleted", id);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "microblog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Token { command } => run_token(command),
        Commands::User { command } => {
            let state = connect().await?;
            run_user(command, &state).await
        }
        Commands::Post { command } => {
            let state = connect().await?;
            run_post(command, &state).await
        }
    }
}
