use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_rows, output_success};
use crate::cli::{OutputFormat, Session};
use crate::database::models::LabelKind;

#[derive(Subcommand)]
pub enum LabelCommands {
    #[command(about = "List your own entries, newest name first")]
    List {
        #[arg(long, help = "Only entries used by at least one recipe")]
        assigned_only: bool,
    },

    #[command(about = "Create an entry")]
    Create {
        #[arg(help = "Name")]
        name: String,
    },
}

pub async fn handle(
    kind: LabelKind,
    cmd: LabelCommands,
    session: Session,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let path = format!("/api/recipe/{}", kind.table());
    let client = session.authed_client()?;

    match cmd {
        LabelCommands::List { assigned_only } => {
            let path = if assigned_only { format!("{}?assigned_only=1", path) } else { path };
            let rows = client.get(&path).await?;
            output_rows(&output_format, kind.table(), &rows)
        }
        LabelCommands::Create { name } => {
            let label = client.post(&path, &json!({ "name": &name })).await?;
            let id = label.get("id").cloned().unwrap_or_default();
            output_success(&output_format, &format!("Created {} {} ({})", kind, name, id), Some(label))
        }
    }
}
