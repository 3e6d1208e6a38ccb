pub mod client;
pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::database::models::LabelKind;

#[derive(Parser)]
#[command(name = "recipe")]
#[command(about = "Recipe CLI - command-line client for the Recipe API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, env = "RECIPE_SERVER_URL", help = "Server URL (overrides the saved server)")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Select and inspect the API server")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Account and token management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "List or create ingredients")]
    Ingredient {
        #[command(subcommand)]
        cmd: commands::label::LabelCommands,
    },

    #[command(about = "List or create tags")]
    Tag {
        #[command(subcommand)]
        cmd: commands::label::LabelCommands,
    },

    #[command(about = "List or create recipes")]
    Recipe {
        #[command(subcommand)]
        cmd: commands::recipe::RecipeCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Saved CLI state plus the per-invocation server override
pub struct Session {
    pub config: config::CliConfig,
    server_override: Option<String>,
}

impl Session {
    pub fn load(server_override: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            config: config::CliConfig::load()?,
            server_override,
        })
    }

    pub fn server_url(&self) -> &str {
        self.server_override.as_deref().unwrap_or(&self.config.server_url)
    }

    pub fn client(&self) -> anyhow::Result<client::ApiClient> {
        client::ApiClient::new(self.server_url(), self.config.token.clone())
    }

    /// Client for endpoints that need a token; fails early when logged out
    pub fn authed_client(&self) -> anyhow::Result<client::ApiClient> {
        if self.config.token.is_none() {
            anyhow::bail!("Not logged in; run `recipe user login` first");
        }
        self.client()
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let session = Session::load(cli.server)?;

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, session, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, session, output_format).await,
        Commands::Ingredient { cmd } => commands::label::handle(LabelKind::Ingredient, cmd, session, output_format).await,
        Commands::Tag { cmd } => commands::label::handle(LabelKind::Tag, cmd, session, output_format).await,
        Commands::Recipe { cmd } => commands::recipe::handle(cmd, session, output_format).await,
    }
}
