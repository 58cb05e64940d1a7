use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use habit_tracker::{
    ClientConfig, connect,
    handlers::{self, CommandResult},
    models::{Credentials, NewHabit, Registration},
};
use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "habit_tracker")]
#[command(about = "Track daily habits against a remote habit service", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the habit service (overrides HABITS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// File holding the session token (overrides HABITS_TOKEN_PATH)
    #[arg(long, global = true)]
    token_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account and store the session token
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },

    /// Store a bearer token obtained elsewhere
    Token { token: String },

    /// Forget the stored session
    Logout,

    /// Show stats and every habit
    List,

    /// Show stats only
    Stats,

    /// Create a habit
    Add {
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Hex colour, e.g. "#3b82f6"
        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        icon: Option<String>,
    },

    /// Toggle a habit's checkmark for today (or --date)
    Toggle {
        id: String,

        /// Calendar date as YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Delete a habit after confirmation
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().with_overrides(cli.api_url, cli.token_path);
    let controller = match connect(&config) {
        Ok(controller) => controller,
        Err(err) => {
            eprintln!("{err}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let result: CommandResult = match cli.command {
        Commands::Login { email, password } => {
            handlers::login(&controller, Credentials { email, password }).await
        }
        Commands::Signup {
            email,
            password,
            name,
        } => {
            handlers::signup(
                &controller,
                Registration {
                    email,
                    password,
                    name,
                },
            )
            .await
        }
        Commands::Token { token } => handlers::set_token(&controller, &token).await,
        Commands::Logout => handlers::logout(&controller).await,
        Commands::List => handlers::list(&controller).await,
        Commands::Stats => handlers::stats(&controller).await,
        Commands::Add {
            name,
            description,
            color,
            icon,
        } => {
            let mut input = NewHabit::new(name);
            if let Some(description) = description {
                input = input.with_description(description);
            }
            if let Some(color) = color {
                input = input.with_color(color);
            }
            if let Some(icon) = icon {
                input = input.with_icon(icon);
            }
            handlers::add(&controller, input).await
        }
        Commands::Toggle { id, date } => handlers::toggle(&controller, &id, date).await,
        Commands::Delete { id, yes } => {
            handlers::delete(&controller, &id, || {
                yes || confirm("Are you sure you want to delete this habit?")
            })
            .await
        }
    };

    match result {
        Ok(output) => {
            print!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            if let Some(notice) = failure.notice() {
                eprintln!("{notice}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn confirm(prompt: &str) -> bool {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "{prompt} [y/N] ");
    let _ = stderr.flush();

    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
