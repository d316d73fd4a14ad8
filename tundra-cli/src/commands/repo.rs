//! Repo command handlers
//!
//! Handles listing, inspecting and creating managed repos, and retrying the
//! run for a repo's current commit.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use tundra_client::{EngineClient, StoreClient};
use tundra_core::domain::repo::{Repo, RepoSpec};
use tundra_core::domain::run::{RunRecord, STATUS_RUN_NOT_FOUND};
use tundra_core::dto::engine::CreateRun;

use crate::config::Config;
use crate::types::{DEFAULT_NAMESPACE, RepoRef};

/// Repo subcommands
#[derive(Subcommand)]
pub enum RepoCommands {
    /// List all managed repos
    List,
    /// Show a repo with its run history
    Show {
        /// Repo name, or namespace/name
        name: String,

        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },
    /// Put a repository under management
    Create {
        /// Repo name
        name: String,

        /// Clone URL of the repository
        #[arg(long)]
        url: String,

        /// Branch to track
        #[arg(long, default_value = "main")]
        branch: String,

        /// Cluster binding runs deploy to
        #[arg(long, default_value = "")]
        cluster: String,

        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },
    /// Start a new run for the repo's current commit
    Retry {
        /// Repo name, or namespace/name
        name: String,

        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },
}

/// Routes repo subcommands to their respective handlers
pub async fn handle_repo_command(command: RepoCommands, config: &Config) -> Result<()> {
    let store = config.store();

    match command {
        RepoCommands::List => list_repos(&store).await,
        RepoCommands::Show { name, namespace } => {
            show_repo(&store, RepoRef::parse(&name), &namespace).await
        }
        RepoCommands::Create {
            name,
            url,
            branch,
            cluster,
            namespace,
        } => {
            let spec = RepoSpec {
                url,
                branch,
                cluster,
            };
            create_repo(&store, &namespace, &name, spec).await
        }
        RepoCommands::Retry { name, namespace } => {
            retry_run(&store, &config.engine(), RepoRef::parse(&name), &namespace).await
        }
    }
}

async fn list_repos(store: &StoreClient) -> Result<()> {
    let mut repos = store.list_repos().await?;

    if repos.is_empty() {
        println!("{}", "No repos found.".yellow());
        return Ok(());
    }

    repos.sort_by_key(|r| r.id());
    println!("{}", format!("Found {} repo(s):", repos.len()).bold());
    println!();
    println!(
        "  {:<32} {:<16} {:<9} {}",
        "REPO".bold(),
        "BRANCH".bold(),
        "COMMIT".bold(),
        "LATEST RUN".bold()
    );

    for repo in repos {
        let latest = repo
            .status
            .runs
            .latest()
            .map(run_status)
            .unwrap_or_else(|| "-".dimmed());

        println!(
            "  {:<32} {:<16} {:<9} {}",
            repo.id().to_string().cyan(),
            repo.spec.branch,
            repo.status.commit_sha.as_deref().unwrap_or("-"),
            latest
        );
    }

    Ok(())
}

async fn show_repo(store: &StoreClient, repo: RepoRef, namespace: &str) -> Result<()> {
    let id = repo.resolve(namespace);
    let repo = store
        .get_repo(&id)
        .await
        .with_context(|| format!("Failed to load repo {}", id))?;

    print_repo_details(&repo);
    Ok(())
}

async fn create_repo(store: &StoreClient, namespace: &str, name: &str, spec: RepoSpec) -> Result<()> {
    spec.source_repo()
        .context("Clone URL must name an owner and a repository")?;

    let repo = store.create_repo(namespace, name, spec).await?;

    println!("{}", "✓ Repo created successfully!".green().bold());
    println!("  Repo:   {}", repo.id().to_string().cyan());
    println!("  URL:    {}", repo.spec.url);
    println!("  Branch: {}", repo.spec.branch.bold());

    Ok(())
}

/// Starts another run for the commit the controller last deployed
///
/// The new run goes through the same history rule the controller uses, so
/// the oldest entry drops off once the history is full.
async fn retry_run(
    store: &StoreClient,
    engine: &EngineClient,
    repo: RepoRef,
    namespace: &str,
) -> Result<()> {
    let id = repo.resolve(namespace);
    let mut repo = store
        .get_repo(&id)
        .await
        .with_context(|| format!("Failed to load repo {}", id))?;

    let (sha, req) = retry_request(&repo)?;

    let run = engine
        .create_run(&req)
        .await
        .context("Failed to create run")?;

    repo.status
        .runs
        .record(RunRecord::started(run.object_ref(), &sha));
    store
        .patch_status(&id, &repo.status)
        .await
        .context("Run created but status could not be saved")?;

    println!("{}", "✓ Run started successfully!".green().bold());
    println!("  Run:    {}", run.name.cyan());
    println!("  Commit: {}", sha);

    Ok(())
}

/// Builds the run request for the repo's recorded commit
fn retry_request(repo: &Repo) -> Result<(String, CreateRun)> {
    let Some(sha) = repo.status.commit_sha.clone() else {
        bail!(
            "Repo {} has no deployed commit yet; wait for the controller to trigger a first run",
            repo.id()
        );
    };

    let req = CreateRun::for_repo(repo, &sha);
    Ok((sha, req))
}

fn run_status(run: &RunRecord) -> ColoredString {
    if run.completed && run.succeeded {
        run.status.green()
    } else if run.status == STATUS_RUN_NOT_FOUND {
        run.status.dimmed()
    } else if run.completed {
        run.status.red()
    } else {
        run.status.yellow()
    }
}

/// Print detailed repo information
fn print_repo_details(repo: &Repo) {
    println!("{}", "Repo Details:".bold());
    println!("  Repo:    {}", repo.id().to_string().cyan());
    println!("  UID:     {}", repo.metadata.uid.to_string().dimmed());
    println!("  URL:     {}", repo.spec.url);
    println!("  Branch:  {}", repo.spec.branch.bold());
    if !repo.spec.cluster.is_empty() {
        println!("  Cluster: {}", repo.spec.cluster);
    }
    println!(
        "  Commit:  {}",
        repo.status.commit_sha.as_deref().unwrap_or("-")
    );
    if let Some(engine_ref) = &repo.status.engine_ref {
        println!(
            "  Binding: {}/{}",
            engine_ref.namespace, engine_ref.name
        );
    }

    if let Some(config) = &repo.status.config {
        println!("\n{}", "Manifest:".bold());
        for step in &config.steps {
            println!("  {} {} ({})", "▸".cyan(), step.path, step.executor.as_str().dimmed());
        }
    }

    println!("\n{}", "Runs:".bold());
    if repo.status.runs.is_empty() {
        println!("  {}", "No runs yet.".yellow());
        return;
    }

    for run in &repo.status.runs {
        println!(
            "  {} {:<40} {:<9} {:<12} {}",
            "▸".cyan(),
            run.run_ref.name,
            run.commit_sha,
            run_status(run),
            run.triggered_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use tundra_core::domain::repo::{ObjectMeta, RepoStatus};
    use uuid::Uuid;

    use super::*;

    fn repo(commit: Option<&str>) -> Repo {
        Repo {
            metadata: ObjectMeta {
                name: "web".to_string(),
                namespace: "apps".to_string(),
                uid: Uuid::new_v4(),
                resource_version: 4,
                generation: 1,
            },
            spec: RepoSpec {
                url: "https://github.com/acme/web.git".to_string(),
                branch: "main".to_string(),
                cluster: "prod".to_string(),
            },
            status: RepoStatus {
                commit_sha: commit.map(str::to_string),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_retry_targets_recorded_commit() {
        let (sha, req) = retry_request(&repo(Some("abc1234"))).unwrap();
        assert_eq!(sha, "abc1234");
        assert_eq!(req.generate_name, "web-abc1234-");
        assert_eq!(req.namespace, "apps");
    }

    #[test]
    fn test_retry_without_commit_fails() {
        let err = retry_request(&repo(None)).unwrap_err();
        assert!(err.to_string().contains("no deployed commit"));
    }
}
