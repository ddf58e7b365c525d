mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foundation::FieldId;
use tracing_subscriber::EnvFilter;

use crate::commands::read_input;
use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Field boundary editing and analysis tool")]
struct Args {
    /// Field store file (default: $FIELDMAP_STORE or data/fields.json)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Turn a drawn shape (JSON) into persisted boundary text
    Normalize {
        /// Shape JSON, a file path, or - for stdin
        shape: String,
    },

    /// Decode persisted boundary text and print its display ring and bounds
    Inspect {
        /// Boundary text, a file path, or - for stdin
        #[arg(conflicts_with = "field")]
        coordinates: Option<String>,

        /// Inspect the boundary stored for this field instead
        #[arg(long)]
        field: Option<String>,
    },

    /// Replay an editor event script against a stored field
    Session {
        #[arg(long)]
        field: String,

        /// Event script JSON, a file path, or - for stdin
        #[arg(long)]
        script: String,

        /// Do not write the resulting boundary back to the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage field records
    Fields {
        #[command(subcommand)]
        action: FieldsAction,
    },

    /// Submit a field to the analysis backend
    Analyze {
        #[arg(long)]
        field: String,

        /// Backend base URL (default: $BACKEND_API_URL or http://localhost:8000)
        #[arg(long)]
        backend: Option<String>,

        /// Print the full backend response instead of a summary
        #[arg(long)]
        raw: bool,
    },

    /// Show the latest analysis stored by the backend for a field
    Recent {
        #[arg(long)]
        field: String,

        /// Backend base URL (default: $BACKEND_API_URL or http://localhost:8000)
        #[arg(long)]
        backend: Option<String>,

        /// Print the full stored analysis instead of a summary
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Subcommand, Debug)]
enum FieldsAction {
    /// List stored fields
    List,
    /// Upsert fields from a JSON object or array
    Import { input: String },
    /// Delete a field
    Remove { id: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(store) = args.store {
        config.store = store;
    }

    match args.command {
        Command::Normalize { shape } => {
            let encoded = commands::normalize_shape(&read_input(&shape)?)?;
            println!("{encoded}");
        }
        Command::Inspect { coordinates, field } => {
            let text = match (coordinates, field) {
                (Some(arg), _) => read_input(&arg)?,
                (None, Some(id)) => stored_coordinates(&config, &FieldId::new(id))?,
                (None, None) => return Err("inspect needs boundary text or --field".to_string()),
            };
            print_json(&commands::inspect_boundary(&text)?)?;
        }
        Command::Session {
            field,
            script,
            dry_run,
        } => {
            let report = commands::run_session(
                &config.store,
                &FieldId::new(field),
                &read_input(&script)?,
                &config.editor,
                !dry_run,
            )?;
            print_json(&report.to_json())?;
        }
        Command::Fields { action } => match action {
            FieldsAction::List => {
                let fields = commands::list_fields(&config.store)?;
                print_json(&serde_json::to_value(&fields).map_err(|e| e.to_string())?)?;
            }
            FieldsAction::Import { input } => {
                let n = commands::import_fields(&config.store, &read_input(&input)?)?;
                println!("imported {n} field(s) into {}", config.store.display());
            }
            FieldsAction::Remove { id } => {
                let id = FieldId::new(id);
                if !commands::remove_field(&config.store, &id)? {
                    return Err(format!("field not found: {id}"));
                }
                println!("removed {id}");
            }
        },
        Command::Analyze {
            field,
            backend,
            raw,
        } => {
            if let Some(url) = backend {
                config.analysis.base_url = url;
            }
            let resp =
                commands::analyze_field(&config.store, &FieldId::new(field), config.analysis)
                    .await?;
            if raw {
                print_json(&serde_json::to_value(&resp).map_err(|e| e.to_string())?)?;
            } else {
                print_json(&commands::summarize_analysis(&resp))?;
            }
        }
        Command::Recent {
            field,
            backend,
            raw,
        } => {
            if let Some(url) = backend {
                config.analysis.base_url = url;
            }
            let id = FieldId::new(field);
            let Some(resp) = commands::recent_analysis(&id, config.analysis).await? else {
                return Err(format!("no analysis found for field {id}"));
            };
            if raw {
                print_json(&serde_json::to_value(&resp).map_err(|e| e.to_string())?)?;
            } else {
                print_json(&commands::summarize_analysis(&resp))?;
            }
        }
    }
    Ok(())
}

fn stored_coordinates(config: &AppConfig, id: &FieldId) -> Result<String, String> {
    commands::list_fields(&config.store)?
        .into_iter()
        .find(|f| &f.id == id)
        .ok_or_else(|| format!("field not found: {id}"))?
        .coordinates
        .ok_or_else(|| format!("field {id} has no stored boundary"))
}

fn print_json(value: &serde_json::Value) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}
