use clap::Subcommand;
use serde_json::{json, Map, Value};

use crate::cli::utils::{output_object, output_success};
use crate::cli::{OutputFormat, Session};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create an account")]
    Create {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RECIPE_PASSWORD")]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },

    #[command(about = "Obtain a token and save it for later commands")]
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RECIPE_PASSWORD")]
        password: String,
    },

    #[command(about = "Revoke the saved token")]
    Logout,

    #[command(about = "Show the logged in user")]
    Whoami,

    #[command(about = "Change name and/or password of the logged in user")]
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
}

pub async fn handle(cmd: UserCommands, mut session: Session, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create { email, password, name } => {
            let mut body = json!({ "email": &email, "password": password });
            if let Some(name) = name {
                body["name"] = json!(name);
            }
            let user = session.client()?.post("/api/user/create", &body).await?;
            output_success(&output_format, &format!("Created user {}", email), Some(user))
        }
        UserCommands::Login { email, password } => {
            let data = session
                .client()?
                .post("/api/user/token", &json!({ "email": &email, "password": password }))
                .await?;
            let token = data
                .get("token")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow::anyhow!("Server response did not include a token"))?;

            session.config.token = Some(token.to_string());
            session.config.email = Some(email.clone());
            session.config.save()?;
            output_success(&output_format, &format!("Logged in as {}", email), None)
        }
        UserCommands::Logout => {
            if session.config.token.is_some() {
                // The token may already be expired or revoked; forget it either way
                if let Err(e) = session.client()?.delete("/api/user/token").await {
                    tracing::warn!("Token revocation failed: {}", e);
                }
            }
            session.config.clear_session();
            session.config.save()?;
            output_success(&output_format, "Logged out", None)
        }
        UserCommands::Whoami => {
            let me = session.authed_client()?.get("/api/user/me").await?;
            output_object(&output_format, &me)
        }
        UserCommands::Update { name, password } => {
            let mut body = Map::new();
            if let Some(name) = name {
                body.insert("name".into(), json!(name));
            }
            if let Some(password) = password {
                body.insert("password".into(), json!(password));
            }
            if body.is_empty() {
                anyhow::bail!("Nothing to update; pass --name and/or --password");
            }
            let me = session.authed_client()?.patch("/api/user/me", &body).await?;
            output_object(&output_format, &me)
        }
    }
}
