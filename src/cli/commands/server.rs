use clap::Subcommand;

use crate::cli::utils::{output_object, output_success};
use crate::cli::{OutputFormat, Session};

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Save the server URL used by later commands")]
    Use {
        #[arg(help = "Server URL, e.g. http://localhost:3000")]
        url: String,
    },

    #[command(about = "Show the selected server")]
    Current,

    #[command(about = "Show server information from API root endpoint")]
    Info,

    #[command(about = "Check server health status from API /health endpoint")]
    Health,
}

pub async fn handle(cmd: ServerCommands, mut session: Session, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Use { url } => {
            let parsed = url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("Server URL must use http or https");
            }
            session.config.server_url = url.trim_end_matches('/').to_string();
            // A token is only meaningful for the server that issued it
            session.config.clear_session();
            session.config.save()?;
            output_success(&output_format, &format!("Using server {}", session.config.server_url), None)
        }
        ServerCommands::Current => output_object(
            &output_format,
            &serde_json::json!({
                "server": session.server_url(),
                "email": &session.config.email,
                "logged_in": session.config.token.is_some(),
            }),
        ),
        ServerCommands::Info => {
            let info = session.client()?.get("/").await?;
            output_object(&output_format, &info)
        }
        ServerCommands::Health => {
            let health = session.client()?.get("/health").await?;
            output_object(&output_format, &health)
        }
    }
}
