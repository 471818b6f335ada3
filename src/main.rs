use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;

/// dokira - clinic portal for doctors and patients
#[derive(Parser)]
#[command(name = "dokira")]
#[command(about = "Doctor and patient portal server", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Server host address (overrides config file)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run database migrations
    Migrate,
    /// Drop every table and recreate them with migrations
    Reset,
    /// Manage doctor and patient accounts
    #[command(subcommand)]
    Account(AccountCommands),
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Create an active account
    Create {
        #[arg(long, value_enum)]
        role: cli::account::Role,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Doctors only
        #[arg(long)]
        speciality: Option<String>,
    },
    /// Allow an account to sign in again
    Activate {
        #[arg(long, value_enum)]
        role: cli::account::Role,
        #[arg(long)]
        email: String,
    },
    /// Refuse sign in and invalidate open sessions
    Deactivate {
        #[arg(long, value_enum)]
        role: cli::account::Role,
        #[arg(long)]
        email: String,
    },
    /// Replace an account password
    SetPassword {
        #[arg(long, value_enum)]
        role: cli::account::Role,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = dokira::Config::load(cli.config.clone())?;

    dokira::observability::init_tracing(
        "dokira",
        env!("CARGO_PKG_VERSION"),
        &config.observability.log_level,
    )?;

    match cli.command {
        Commands::Serve { host, port } => {
            config.validate().map_err(|e| anyhow::anyhow!(e))?;
            cli::server::serve(config, host, port).await
        }
        Commands::Migrate => cli::server::migrate(config).await,
        Commands::Reset => cli::server::reset(config).await,
        Commands::Account(command) => match command {
            AccountCommands::Create {
                role,
                email,
                password,
                first_name,
                last_name,
                speciality,
            } => {
                cli::account::create(
                    config,
                    cli::account::CreateInput {
                        role,
                        email,
                        password,
                        first_name,
                        last_name,
                        speciality,
                    },
                )
                .await
            }
            AccountCommands::Activate { role, email } => {
                cli::account::set_active(config, role, email, true).await
            }
            AccountCommands::Deactivate { role, email } => {
                cli::account::set_active(config, role, email, false).await
            }
            AccountCommands::SetPassword {
                role,
                email,
                password,
            } => cli::account::set_password(config, role, email, password).await,
        },
    }
}
