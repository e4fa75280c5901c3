//! Scopewire CLI - run injection passes over YAML scene manifests

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

use scopewire::ast::Manifest;
use scopewire::error::{FixSuggestion, WireError};
use scopewire::{
    run_pass, validate_bindings, ContainerId, Injected, MemoryHost, NodeId, PassConfig, PassOutcome, PassTarget,
    StructureTree,
};

#[derive(Parser)]
#[command(name = "scopewire")]
#[command(about = "Scopewire - scope-hierarchy binding resolver")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run injection passes over a manifest
    Run {
        /// Path to the scene manifest (.yaml)
        manifest: PathBuf,

        /// Only pass over this live container (default: every container, then every instance)
        #[arg(long, conflicts_with = "template")]
        container: Option<String>,

        /// Template pass rooted at this node
        #[arg(long)]
        template: Option<String>,

        /// Disable partition isolation
        #[arg(long)]
        no_isolation: bool,

        /// Config file (defaults to ./scopewire.toml, then the user config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate bindings without resolving anything
    Validate {
        /// Path to the scene manifest (.yaml)
        manifest: PathBuf,
    },
}

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Status {
    Clean = 0,
    Errors = 1,
    Pending = 2,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            manifest,
            container,
            template,
            no_isolation,
            config,
            json,
        } => run_manifest(&manifest, container, template, no_isolation, config.as_deref(), json),
        Commands::Validate { manifest } => validate_manifest(&manifest),
    };

    match result {
        Ok(status) => ExitCode::from(status as u8),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.downcast_ref::<WireError>().and_then(|w| w.fix_suggestion()) {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            ExitCode::from(Status::Errors as u8)
        }
    }
}

fn load_host(path: &Path) -> anyhow::Result<MemoryHost> {
    let manifest = Manifest::from_file(path)?;
    let host = MemoryHost::from_manifest(&manifest)
        .with_context(|| format!("while loading '{}'", path.display()))?;
    Ok(host)
}

#[derive(Serialize)]
struct PassReport {
    target: String,
    #[serde(flatten)]
    outcome: PassOutcome,
    assignments: Vec<AssignmentView>,
}

#[derive(Serialize)]
struct AssignmentView {
    site: String,
    owner: String,
    values: Vec<String>,
}

fn targets(
    host: &MemoryHost,
    container: Option<String>,
    template: Option<String>,
) -> Result<Vec<(String, PassTarget)>, WireError> {
    if let Some(name) = template {
        let node = host
            .find_node(&name)
            .ok_or_else(|| WireError::UnknownPassRoot { root: name.clone() })?;
        return Ok(vec![(name, PassTarget::Template(node))]);
    }
    if let Some(name) = container {
        let id = host
            .container_named(&name)
            .ok_or_else(|| WireError::UnknownPassRoot { root: name.clone() })?;
        return Ok(vec![(name, PassTarget::Container(id))]);
    }
    let containers = host.containers();
    let mut targets: Vec<(String, PassTarget)> = containers
        .iter()
        .map(|id| (host.container_name(*id).to_string(), PassTarget::Container(*id)))
        .collect();
    // Container passes prune instances; each outermost instance gets its own pass
    for id in containers {
        targets.extend(
            instance_roots(host, id)
                .into_iter()
                .map(|node| (host.node_name(node).to_string(), PassTarget::Template(node))),
        );
    }
    Ok(targets)
}

/// Outermost template-instance roots of a container, in pre-order
fn instance_roots(host: &MemoryHost, container: ContainerId) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeId> = host.container_roots(container).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if host.is_instance_root(node) {
            found.push(node);
            continue;
        }
        stack.extend(host.children(node).iter().rev().copied());
    }
    found
}

fn run_manifest(
    manifest: &Path,
    container: Option<String>,
    template: Option<String>,
    no_isolation: bool,
    config: Option<&Path>,
    json: bool,
) -> anyhow::Result<Status> {
    let mut config = PassConfig::load(config)?;
    if no_isolation {
        config = config.without_isolation();
    }
    let mut host = load_host(manifest)?;

    let mut status = Status::Clean;
    let mut reports = Vec::new();
    for (name, target) in targets(&host, container, template)? {
        host.clear_assignments();
        let outcome = run_pass(&mut host, target, &config)?;
        status = status.max(match &outcome {
            PassOutcome::GenerationPending { .. } => Status::Pending,
            PassOutcome::Completed(result) if !result.is_clean() => Status::Errors,
            PassOutcome::Completed(_) => Status::Clean,
        });

        let assignments = host
            .assignments()
            .iter()
            .map(|a| AssignmentView {
                site: a.site.label(),
                owner: host.describe(a.site.unit.into()),
                values: match &a.value {
                    Injected::Single(obj) => vec![host.describe(*obj)],
                    Injected::Collection(objs) => objs.iter().map(|o| host.describe(*o)).collect(),
                },
            })
            .collect();
        let report = PassReport {
            target: name,
            outcome,
            assignments,
        };
        if !json {
            print_report(&report);
        }
        reports.push(report);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(status)
}

fn print_report(report: &PassReport) {
    println!("{} Pass over {}", "→".cyan(), report.target.cyan().bold());
    for a in &report.assignments {
        println!(
            "  {} {} on {} = {}",
            "✓".green(),
            a.site,
            a.owner,
            a.values.join(", ")
        );
    }

    match &report.outcome {
        PassOutcome::GenerationPending { types } => {
            let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
            println!(
                "  {} Stand-in generation requested for {}; rebuild and run again",
                "…".yellow(),
                names.join(", ")
            );
        }
        PassOutcome::Completed(result) => {
            for error in &result.errors {
                println!("  {} {}", "✗".red(), error);
                if let Some(fix) = error.suggestion() {
                    println!("    {} {}", "Fix:".yellow(), fix);
                }
            }
            for warning in &result.warnings {
                println!("  {} {}", "⚠".yellow(), warning);
            }
            let stats = &result.stats;
            println!(
                "  Scopes: {} | Bindings: {} | Sites: {} | Injected: {} | Suppressed: {} | Globals: {}",
                stats.scopes, stats.bindings, stats.sites, stats.injected, stats.suppressed, stats.globals
            );
        }
    }
}

fn validate_manifest(path: &Path) -> anyhow::Result<Status> {
    let mut host = load_host(path)?;

    let mut roots: Vec<(String, PassTarget)> = host
        .containers()
        .into_iter()
        .map(|id| (host.container_name(id).to_string(), PassTarget::Container(id)))
        .collect();
    let manifest = Manifest::from_file(path)?;
    for root in manifest
        .templates
        .iter()
        .map(|t| &t.root)
        .chain(manifest.sessions.iter().map(|s| &s.root))
    {
        if let Some(node) = host.find_node(&root.name) {
            roots.push((root.name.clone(), PassTarget::Template(node)));
        }
    }

    let mut total = 0;
    for (name, target) in roots {
        let errors = validate_bindings(&mut host, target)?;
        for error in &errors {
            println!("  {} [{}] {}", "✗".red(), name, error);
            if let Some(fix) = error.suggestion() {
                println!("    {} {}", "Fix:".yellow(), fix);
            }
        }
        total += errors.len();
    }

    if total > 0 {
        println!("{} {} invalid binding(s) in '{}'", "✗".red(), total, path.display());
        return Ok(Status::Errors);
    }
    println!("{} Manifest '{}' is valid", "✓".green(), path.display());
    println!("  Nodes: {}", host.node_count());
    Ok(Status::Clean)
}
