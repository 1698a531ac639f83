use std::io::IsTerminal;

use clap::{Args, Parser, Subcommand};

use partnerdash::affiliate::{
    CommissionQuery, CommissionStatus, CommissionType, IndustryType, OrganizationFilter,
    OrganizationStatus, UpdateAffiliateRequest,
};
use partnerdash::auth::UpdateProfileRequest;
use partnerdash::cli::{commands, output};
use partnerdash::{App, ClientError};

#[derive(Parser)]
#[command(name = "partnerdash", version, about = "Affiliate partner dashboard for the command line")]
struct Cli {
    /// Path to a config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with an affiliate account
    Signin {
        #[arg(long)]
        email: String,

        #[arg(long, env = "PARTNERDASH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Signout,

    /// Show the current session
    Status,

    /// View or edit your user profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// View or edit the affiliate account
    Affiliate {
        #[command(subcommand)]
        action: AffiliateAction,
    },

    /// List organizations you have referred
    Organizations {
        /// Match name, business name or contact email
        #[arg(long)]
        search: Option<String>,

        /// ACTIVE, INACTIVE, SUSPENDED or TRIAL
        #[arg(long)]
        status: Option<OrganizationStatus>,

        /// DENTAL, WELLNESS, HOSPITALITY, BEAUTY, FITNESS or MEDICAL
        #[arg(long)]
        industry: Option<IndustryType>,
    },

    /// List commissions
    Commissions {
        /// Only commissions from this year
        #[arg(long)]
        year: Option<i32>,

        /// CALCULATED, APPROVED, PAID or DISPUTED
        #[arg(long)]
        status: Option<CommissionStatus>,

        /// SETUP_FEE, SUBSCRIPTION_SALE or MONTHLY_RECURRING
        #[arg(long = "type")]
        commission_type: Option<CommissionType>,

        /// Match the organization's name or business name
        #[arg(long)]
        search: Option<String>,
    },

    /// Show commission totals
    Summary {
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show your profile
    Show,
    /// Update your profile
    Update(ProfileUpdateArgs),
}

#[derive(Args)]
#[group(required = true, multiple = true)]
struct ProfileUpdateArgs {
    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    #[arg(long)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum AffiliateAction {
    /// Show the affiliate account
    Show,
    /// Update the affiliate account
    Update(AffiliateUpdateArgs),
}

#[derive(Args)]
#[group(required = true, multiple = true)]
struct AffiliateUpdateArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    business_name: Option<String>,

    /// Primary contact email
    #[arg(long)]
    email: Option<String>,

    /// Primary contact phone
    #[arg(long)]
    phone: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PARTNERDASH_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli).await {
        output::print_error(&e, json);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let app = App::from_config(cli.config.as_deref()).await?;
    let json = cli.json;

    match cli.command {
        Commands::Signin { email, password } => {
            commands::run_signin(&app, &email, &password, json).await
        }
        Commands::Signout => commands::run_signout(&app, json).await,
        Commands::Status => commands::run_status(&app, json).await,
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::run_profile_show(&app, json).await,
            ProfileAction::Update(args) => {
                let update = UpdateProfileRequest {
                    first_name: args.first_name,
                    last_name: args.last_name,
                    password: args.password,
                };
                commands::run_profile_update(&app, &update, json).await
            }
        },
        Commands::Affiliate { action } => match action {
            AffiliateAction::Show => commands::run_affiliate_show(&app, json).await,
            AffiliateAction::Update(args) => {
                let update = UpdateAffiliateRequest {
                    name: args.name,
                    business_name: args.business_name,
                    primary_contact_email: args.email,
                    primary_contact_phone: args.phone,
                };
                commands::run_affiliate_update(&app, &update, json).await
            }
        },
        Commands::Organizations {
            search,
            status,
            industry,
        } => {
            let filter = OrganizationFilter {
                search,
                status,
                industry,
            };
            commands::run_organizations(&app, &filter, json).await
        }
        Commands::Commissions {
            year,
            status,
            commission_type,
            search,
        } => {
            let query = CommissionQuery {
                year,
                status,
                commission_type,
                search,
            };
            commands::run_commissions(&app, &query, json).await
        }
        Commands::Summary { year } => commands::run_summary(&app, year, json).await,
    }
}
