use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_rows, output_success};
use crate::cli::{OutputFormat, Session};

#[derive(Subcommand)]
pub enum RecipeCommands {
    #[command(about = "List your recipes, optionally filtered by ingredient or tag ids")]
    List {
        #[arg(long, value_delimiter = ',', help = "Ingredient ids, e.g. 1,2")]
        ingredients: Vec<i64>,
        #[arg(long, value_delimiter = ',', help = "Tag ids, e.g. 3")]
        tags: Vec<i64>,
    },

    #[command(about = "Create a recipe")]
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0)]
        time_minutes: i64,
        #[arg(long, default_value = "0.00")]
        price: String,
        #[arg(long)]
        link: Option<String>,
        #[arg(long = "ingredient", help = "Ingredient id (repeatable)")]
        ingredients: Vec<i64>,
        #[arg(long = "tag", help = "Tag id (repeatable)")]
        tags: Vec<i64>,
    },
}

pub async fn handle(cmd: RecipeCommands, session: Session, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = session.authed_client()?;

    match cmd {
        RecipeCommands::List { ingredients, tags } => {
            let rows = client.get(&list_path(&ingredients, &tags)).await?;
            output_rows(&output_format, "recipes", &rows)
        }
        RecipeCommands::Create {
            name,
            time_minutes,
            price,
            link,
            ingredients,
            tags,
        } => {
            let body = json!({
                "name": &name,
                "time_minutes": time_minutes,
                "price": price,
                "link": link,
                "ingredients": ingredients,
                "tags": tags,
            });
            let recipe = client.post("/api/recipe/recipes", &body).await?;
            let id = recipe.get("id").cloned().unwrap_or_default();
            output_success(&output_format, &format!("Created recipe {} ({})", name, id), Some(recipe))
        }
    }
}

fn list_path(ingredients: &[i64], tags: &[i64]) -> String {
    let join = |ids: &[i64]| ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
    let mut params = Vec::new();
    if !ingredients.is_empty() {
        params.push(format!("ingredients={}", join(ingredients)));
    }
    if !tags.is_empty() {
        params.push(format!("tags={}", join(tags)));
    }

    if params.is_empty() {
        "/api/recipe/recipes".to_string()
    } else {
        format!("/api/recipe/recipes?{}", params.join("&"))
    }
}
