use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use folio::{
    AuthGate, Identity, NewProject, ProjectUpdate, ProjectsSnapshot,
    config::FolioConfig,
    contact::{ContactMessage, ContactRelay, EmailJsRelay},
};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Manage the projects shown on a portfolio site")]
struct Cli {
    /// Path to config file (defaults to ~/.folio/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Admin email, required for add/update/delete
    #[arg(long, env = "FOLIO_EMAIL")]
    email: Option<String>,

    /// Admin password
    #[arg(long, env = "FOLIO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show every visible project
    List,
    /// Create a project
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        image: String,
        /// Repeat for each technology, in display order
        #[arg(long = "tech")]
        tech_stack: Vec<String>,
        #[arg(long)]
        live_url: String,
        #[arg(long)]
        github_url: String,
    },
    /// Change some fields of a project
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<String>,
        /// Replaces the whole tech stack when given
        #[arg(long = "tech")]
        tech_stack: Vec<String>,
        #[arg(long)]
        live_url: Option<String>,
        #[arg(long)]
        github_url: Option<String>,
    },
    /// Remove a project (built-in projects stay hidden on this device)
    Delete { id: String },
    /// Send a message through the contact relay
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        message: String,
    },
}

/// Log filter used when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> &'static str {
    if verbose { "folio=debug,info" } else { "info" }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn sign_in(
    config: &FolioConfig,
    email: Option<&str>,
    password: Option<&str>,
) -> anyhow::Result<Option<Identity>> {
    let (Some(email), Some(password)) = (email, password) else {
        return Ok(None);
    };
    let gate = config.auth_gate()?;
    gate.sign_in(email, password)
        .await
        .context("Sign-in failed")?;
    Ok(gate.current_identity())
}

async fn send_contact(config: &FolioConfig, message: ContactMessage) -> anyhow::Result<()> {
    let relay = EmailJsRelay::new(&config.contact)?;
    relay.send(&message).await?;
    println!("Message sent.");
    Ok(())
}

fn print_projects(snapshot: &ProjectsSnapshot) {
    if snapshot.projects.is_empty() {
        println!("No projects.");
    }
    for project in &snapshot.projects {
        println!("{}  {}", project.id, project.title);
        println!("    {}", project.description);
        if !project.tech_stack.is_empty() {
            println!("    [{}]", project.tech_stack.join(", "));
        }
        println!("    live: {}  code: {}", project.live_url, project.github_url);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = match &cli.config {
        Some(path) => FolioConfig::load_from(path)?,
        None => FolioConfig::load()?,
    }
    .with_env_overrides()?;

    if let Command::Contact {
        name,
        from,
        message,
    } = cli.command
    {
        let message = ContactMessage {
            name,
            email: from,
            message,
        };
        return send_contact(&config, message).await;
    }

    let store = config.open_store().await?;
    if cli.verbose {
        store.subscribe(|snapshot| {
            eprintln!(
                "[{} projects{}]",
                snapshot.projects.len(),
                if snapshot.loading { ", loading" } else { "" }
            );
        });
    }
    store.refresh().await;

    if matches!(cli.command, Command::List) {
        print_projects(&store.list());
        return Ok(());
    }

    let identity = sign_in(&config, cli.email.as_deref(), cli.password.as_deref()).await?;

    match cli.command {
        Command::Add {
            title,
            description,
            image,
            tech_stack,
            live_url,
            github_url,
        } => {
            let draft = NewProject {
                title,
                description,
                image,
                tech_stack,
                live_url,
                github_url,
            };
            draft.validate()?;
            let project = store.add(identity.as_ref(), draft).await?;
            println!("Added {} ({})", project.title, project.id);
        }
        Command::Update {
            id,
            title,
            description,
            image,
            tech_stack,
            live_url,
            github_url,
        } => {
            let update = ProjectUpdate {
                title,
                description,
                image,
                tech_stack: (!tech_stack.is_empty()).then_some(tech_stack),
                live_url,
                github_url,
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update: pass at least one field");
            }
            store.update(identity.as_ref(), &id, update).await?;
            println!("Updated {}", id);
        }
        Command::Delete { id } => {
            store.delete(identity.as_ref(), &id).await?;
            println!("Deleted {}", id);
        }
        Command::List | Command::Contact { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_info() {
        assert_eq!(default_filter(false), "info");
        assert!(default_filter(true).starts_with("folio=debug"));
        assert!(default_filter(true).ends_with(",info"));
    }
}
