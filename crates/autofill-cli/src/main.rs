//! Badge Autofill CLI
//!
//! The `autofill` command runs the detectives against a project record kept
//! in a JSON file.
//!
//! ## Commands
//!
//! - `run`: gather evidence, propose answers and commit the trustworthy ones
//! - `plan`: show the detective execution order
//! - `status`: parse a criterion status value

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use autofill_core::{AutofillReport, Chief, ChiefConfig, CriterionStatus, RunMode};
use clap::{Parser, Subcommand};
use evidence_source::{EvidenceSource, WebSource};
use project_state::MemoryProject;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "autofill")]
#[command(version = autofill_core::VERSION)]
#[command(about = "Infer best-practices badge answers from a project's public artifacts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the detectives against a project file
    Run {
        /// Project record (JSON object of field → value)
        #[arg(short, long)]
        project: PathBuf,

        /// Write committed changes back to the project file
        #[arg(long)]
        write: bool,

        /// Only compute these fields (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Failure policy (production, development, test)
        #[arg(long, env = "AUTOFILL_ENV")]
        mode: Option<RunMode>,

        /// Detectives run concurrently per dependency level
        #[arg(long, env = "AUTOFILL_FANOUT")]
        fanout: Option<usize>,

        /// Print the full run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the detective execution order
    Plan {
        /// Only plan for these fields (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a criterion status value
    Status {
        /// Value to parse, e.g. "met", "N/A", "?"
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    autofill_core::telemetry::init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Run {
            project,
            write,
            only,
            mode,
            fanout,
            json,
        } => {
            let mut config = ChiefConfig::from_env();
            if let Some(mode) = mode {
                config = config.with_mode(mode);
            }
            if let Some(fanout) = fanout {
                config = config.with_fanout(fanout);
            }
            let source: Arc<dyn EvidenceSource> =
                Arc::new(WebSource::from_env().context("Failed to build HTTP client")?);
            let chief = Chief::with_default_detectives(source, config)
                .context("Invalid detective configuration")?;
            let report = cmd_run(&chief, &project, write, &only).await?;
            print_report(&report, json)
        }
        Commands::Plan { only, json } => cmd_plan(&only, json),
        Commands::Status { value } => cmd_status(&value),
    }
}

fn needed_fields(only: &[String]) -> Option<BTreeSet<String>> {
    let fields: BTreeSet<String> = only
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    (!fields.is_empty()).then_some(fields)
}

fn load_project(path: &Path) -> Result<MemoryProject> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read project file: {:?}", path))?;
    MemoryProject::from_json(&text)
        .with_context(|| format!("Project file is not a JSON object: {:?}", path))
}

/// Run the chief on the project at `path`; persist only with `write`.
async fn cmd_run(chief: &Chief, path: &Path, write: bool, only: &[String]) -> Result<AutofillReport> {
    let mut project = load_project(path)?;
    let needed = needed_fields(only);

    let report = chief
        .autofill(&mut project, needed.as_ref())
        .await
        .context("Autofill run failed")?;

    if write && !report.applied.is_empty() {
        let text = project.to_json_pretty()?;
        std::fs::write(path, text + "\n")
            .with_context(|| format!("Failed to write project file: {:?}", path))?;
        info!(path = ?path, changes = report.applied.len(), "Project file updated");
    }
    Ok(report)
}

fn print_report(report: &AutofillReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("run {}", report.run_id);
    if report.applied.is_empty() {
        println!("No changes.");
    }
    for change in &report.applied {
        println!(
            "  {} = {:?} (was {:?}, confidence {})",
            change.field,
            change.new_value,
            change.old_value.as_deref().unwrap_or(""),
            change.confidence.value()
        );
    }
    let skipped = report
        .changeset
        .iter()
        .filter(|(field, _)| !report.applied.iter().any(|c| &c.field == *field))
        .count();
    if skipped > 0 {
        println!("{} proposal(s) not committed", skipped);
    }
    for failure in &report.failures {
        println!("  skipped {}: {}", failure.detective, failure.reason);
    }
    Ok(())
}

fn cmd_plan(only: &[String], json: bool) -> Result<()> {
    let catalog = autofill_core::FieldCatalog::standard();
    let detectives = autofill_core::default_detectives(&catalog)?;
    let plan = autofill_core::DetectivePlan::build(detectives)?;
    let plan = match needed_fields(only) {
        Some(needed) => plan.restrict(&plan.needed_outputs(Some(&needed), &BTreeSet::new())),
        None => plan,
    };

    let steps = plan.steps();
    if json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }
    for step in steps {
        println!("{:>2}. [level {}] {}", step.position + 1, step.level, step.detective);
        println!("      inputs:  {}", step.inputs.join(", "));
        println!("      outputs: {}", step.outputs.join(", "));
        if !step.depends_on.is_empty() {
            println!("      after:   {}", step.depends_on.join(", "));
        }
    }
    Ok(())
}

fn cmd_status(value: &str) -> Result<()> {
    let status = CriterionStatus::parse(value).with_context(|| format!("Not a status: {:?}", value))?;
    println!("canonical: {}", status);
    println!("ordinal:   {}", status.ordinal());
    println!(
        "automation: {}",
        if status.is_unknown() { "rejected" } else { "accepted" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_source::MemorySource;
    use serde_json::json;

    fn chief(source: MemorySource) -> Chief {
        let config = ChiefConfig::default()
            .with_mode(RunMode::Test)
            .with_fanout(1);
        Chief::with_default_detectives(Arc::new(source), config).unwrap()
    }

    fn github_source() -> MemorySource {
        MemorySource::new().with_json(
            "github:repo:acme/widget",
            &json!({"name": "widget", "description": "Widget", "license": {"key": "mit"}}),
        )
    }

    fn project_file(dir: &tempfile::TempDir, value: serde_json::Value) -> PathBuf {
        let path = dir.path().join("project.json");
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_needed_fields_ignores_blanks() {
        assert_eq!(needed_fields(&[]), None);
        assert_eq!(needed_fields(&[" ".to_string()]), None);
        let needed = needed_fields(&["license".to_string(), " build_status ".to_string()]).unwrap();
        assert!(needed.contains("build_status"));
    }

    #[tokio::test]
    async fn test_run_without_write_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_file(&dir, json!({"repo_url": "https://github.com/acme/widget"}));
        let before = std::fs::read_to_string(&path).unwrap();

        let report = cmd_run(&chief(github_source()), &path, false, &[]).await.unwrap();

        assert!(report.applied.iter().any(|c| c.field == "license"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_run_with_write_persists_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_file(&dir, json!({"repo_url": "https://github.com/acme/widget", "license": null}));

        let first = cmd_run(&chief(github_source()), &path, true, &[]).await.unwrap();
        assert!(!first.applied.is_empty());

        let saved = MemoryProject::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.fields().get("license").map(String::as_str), Some("MIT"));
        assert!(!saved.fields().contains_key("repo_files"));

        let second = cmd_run(&chief(github_source()), &path, true, &[]).await.unwrap();
        assert!(second.applied.is_empty());
    }

    #[tokio::test]
    async fn test_write_keeps_fields_it_does_not_own() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_file(
            &dir,
            json!({
                "id": 42,
                "badge": true,
                "tags": ["a", "b"],
                "meta": {"k": 1},
                "repo_url": "https://github.com/acme/widget"
            }),
        );

        let report = cmd_run(&chief(github_source()), &path, true, &[]).await.unwrap();
        assert!(!report.applied.is_empty());

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["id"], json!(42));
        assert_eq!(saved["badge"], json!(true));
        assert_eq!(saved["tags"], json!(["a", "b"]));
        assert_eq!(saved["meta"], json!({"k": 1}));
        assert_eq!(saved["license"], json!("MIT"));
    }

    #[tokio::test]
    async fn test_run_only_limits_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_file(&dir, json!({"repo_url": "https://github.com/acme/widget"}));

        let report = cmd_run(&chief(github_source()), &path, false, &["sites_https_status".to_string()])
            .await
            .unwrap();

        let fields: Vec<&str> = report.applied.iter().map(|c| c.field.as_str()).collect();
        assert!(fields.contains(&"sites_https_status"));
        assert!(!fields.contains(&"license"));
    }

    #[tokio::test]
    async fn test_run_rejects_non_object_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_file(&dir, json!(["not", "an", "object"]));
        assert!(cmd_run(&chief(MemorySource::new()), &path, false, &[]).await.is_err());
    }

    #[test]
    fn test_status_and_plan_commands() {
        assert!(cmd_status("n/a").is_ok());
        assert!(cmd_status("maybe").is_err());
        assert!(cmd_plan(&["build_status".to_string()], true).is_ok());
    }
}
