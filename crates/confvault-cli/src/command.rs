//! Command line surface and dispatch
//!
//! Every command prints one JSON document on success. Failures are rendered
//! by [`render_error`] with the engine's error code.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use confvault_common::{ConfVaultError, ErrorCode};
use confvault_config::{ConfigurationEditor, ContentChange, LockManager, PublishTracker};
use confvault_migration::{Migrator, MigratorTrait};
use confvault_persistence::{
    Conds, ConfigurationStore, HistoryLog, NewConfiguration, PageRequest,
};

#[derive(Debug, Parser)]
#[command(name = "confvault", version, about = "Versioned configuration management")]
pub struct Cli {
    /// Configuration file (default: conf/application.yml)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    #[arg(long = "db-url", env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply (or roll back) the schema migrations
    Migrate {
        #[arg(long)]
        rollback: bool,
    },
    /// Create a configuration
    Create(CreateArgs),
    /// Show one configuration
    Show { id: i64 },
    /// List configurations, newest first
    List(ListArgs),
    /// Replace the content of a configuration held by `--uid`
    Edit(EditArgs),
    /// Acquire the edit lock
    Lock {
        id: i64,
        #[arg(long)]
        uid: i64,
    },
    /// Release the edit lock
    Unlock {
        id: i64,
        #[arg(long)]
        uid: i64,
    },
    /// Browse the change history
    History(HistoryArgs),
    /// Publish a history snapshot as the live content
    Publish {
        id: i64,
        #[arg(long)]
        history: i64,
        #[arg(long)]
        uid: i64,
    },
    /// Delete a configuration; its history is kept
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct ContentArgs {
    #[arg(long, conflicts_with = "file")]
    pub content: Option<String>,
    /// Read the content from a file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl ContentArgs {
    fn read(&self) -> anyhow::Result<Option<String>> {
        match (&self.content, &self.file) {
            (Some(content), _) => Ok(Some(content.clone())),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("failed to read {}", path.display())),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub format: String,
    #[arg(long, default_value = "")]
    pub version: String,
    #[arg(long = "resource-id", default_value_t = 0)]
    pub external_resource_id: i64,
    #[arg(long)]
    pub uid: i64,
    #[command(flatten)]
    pub content: ContentArgs,
}

#[derive(Debug, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u64,
    #[arg(long, default_value_t = 10)]
    pub size: u64,
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Equality condition, repeatable; values are read as JSON scalars, else as text
    #[arg(long = "where", value_name = "FIELD=VALUE", value_parser = parse_condition)]
    pub conditions: Vec<(String, Value)>,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: i64,
    #[arg(long)]
    pub uid: i64,
    #[arg(long)]
    pub version: String,
    #[arg(long = "change-log", default_value = "")]
    pub change_log: String,
    /// Replace the format tag
    #[arg(long)]
    pub format: Option<String>,
    #[command(flatten)]
    pub content: ContentArgs,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Configuration whose history is listed
    #[arg(required_unless_present = "entry")]
    pub config_id: Option<i64>,
    /// Show a single history entry with its configuration
    #[arg(long = "entry", conflicts_with = "config_id")]
    pub entry: Option<i64>,
    #[command(flatten)]
    pub page: PageArgs,
}

/// Parse `field=value`; `value` is taken as a JSON scalar when it parses as one
pub fn parse_condition(s: &str) -> Result<(String, Value), String> {
    let (field, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::String(_))) => v,
        _ => Value::String(raw.to_string()),
    };
    Ok((field.to_string(), value))
}

fn conds_from(conditions: &[(String, Value)]) -> anyhow::Result<Conds> {
    let map: serde_json::Map<String, Value> = conditions.iter().cloned().collect();
    Ok(Conds::from_json(&map)?)
}

/// The engine's components over one connection pool
#[derive(Clone, Debug)]
pub struct App {
    db: DatabaseConnection,
    store: ConfigurationStore,
    history: HistoryLog,
    locks: LockManager,
    editor: ConfigurationEditor,
    publisher: PublishTracker,
}

impl App {
    pub fn new(db: DatabaseConnection, stale_after: Option<std::time::Duration>) -> Self {
        let mut locks = LockManager::new(db.clone());
        if let Some(stale_after) = stale_after {
            locks = locks.with_stale_after(stale_after);
        }
        Self {
            store: ConfigurationStore::new(db.clone()),
            history: HistoryLog::new(db.clone()),
            editor: ConfigurationEditor::new(db.clone()),
            publisher: PublishTracker::new(db.clone()),
            locks,
            db,
        }
    }

    pub async fn run(&self, command: Command) -> anyhow::Result<Value> {
        tracing::debug!(?command, "Running command");

        let output = match command {
            Command::Migrate { rollback } => {
                if rollback {
                    Migrator::down(&self.db, None).await?;
                } else {
                    Migrator::up(&self.db, None).await?;
                }
                json!({ "migrated": !rollback, "rolledBack": rollback })
            }
            Command::Create(args) => {
                let id = self
                    .store
                    .create(NewConfiguration {
                        external_resource_id: args.external_resource_id,
                        name: args.name,
                        content: args.content.read()?.unwrap_or_default(),
                        format: args.format,
                        version: args.version,
                        uid: args.uid,
                    })
                    .await?;
                json!({ "id": id })
            }
            Command::Show { id } => match self.store.get_by_id(id).await? {
                Some(config) => {
                    let mut value = serde_json::to_value(&config)?;
                    value["fileName"] = json!(config.file_name());
                    value
                }
                None => return Err(ConfVaultError::ConfigurationNotExist(id).into()),
            },
            Command::List(args) => {
                let conds = conds_from(&args.conditions)?;
                serde_json::to_value(self.store.list_page(&conds, args.page.request()).await?)?
            }
            Command::Edit(args) => {
                let content = args
                    .content
                    .read()?
                    .context("either --content or --file is required")?;
                let mut change =
                    ContentChange::new(content, args.version).with_change_log(args.change_log);
                if let Some(format) = args.format {
                    change = change.with_format(format);
                }
                let history_id = self.editor.update_content(args.id, args.uid, change).await?;
                json!({ "id": args.id, "historyId": history_id })
            }
            Command::Lock { id, uid } => serde_json::to_value(self.locks.acquire(id, uid).await?)?,
            Command::Unlock { id, uid } => {
                self.locks.release(id, uid).await?;
                json!({ "id": id, "released": true })
            }
            Command::History(args) => match (args.entry, args.config_id) {
                (Some(entry), _) => serde_json::to_value(
                    self.history.get_with_configuration(entry).await?,
                )?,
                (None, Some(config_id)) => {
                    let conds = Conds::new().with("configuration_id", config_id);
                    serde_json::to_value(
                        self.history.list_page(&conds, args.page.request()).await?,
                    )?
                }
                (None, None) => anyhow::bail!("a configuration id or --entry is required"),
            },
            Command::Publish { id, history, uid } => {
                serde_json::to_value(self.publisher.publish(id, history, uid).await?)?
            }
            Command::Delete { id } => {
                let deleted = self.store.delete(id).await?;
                json!({ "id": id, "deleted": deleted })
            }
        };

        Ok(output)
    }
}

/// JSON rendering of a failed command
pub fn render_error(err: &anyhow::Error) -> Value {
    let code: ErrorCode<'static> = match err.downcast_ref::<ConfVaultError>() {
        Some(e) => e.error_code(),
        None => ErrorCode {
            code: 1,
            message: "command failed",
        },
    };
    let mut value = json!({
        "code": code.code,
        "message": code.message,
        "error": format!("{err:#}"),
    });
    if let Some(holder) = err
        .downcast_ref::<ConfVaultError>()
        .and_then(ConfVaultError::current_holder)
    {
        value["currentHolder"] = json!(holder);
    }
    value
}
