//! Zome Scenario CLI
//!
//! The `zome-scenario` command runs built-in scenario suites against an
//! application package described by a TOML scenario config.
//!
//! ## Commands
//!
//! - `run`: Execute a suite and write the run report
//! - `validate`: Check a scenario config and its package without running
//! - `list`: Show built-in suites and zome kinds

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use zome_scenario::suites::{self, Suite};
use zome_scenario::{RunReport, Scenario, ScenarioConfig, TapReporter, ZomeRegistry};

#[derive(Parser)]
#[command(name = "zome-scenario")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scenario-based integration tests for zome call APIs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a suite against the configured application
    Run {
        /// Scenario config (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Built-in suite to run
        #[arg(short, long, default_value = "matchmaking")]
        suite: String,

        /// Write the JSON run report to this path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Print TAP to stdout instead of a summary
        #[arg(long)]
        tap: bool,
    },

    /// Validate a scenario config and its application package
    Validate {
        /// Scenario config (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// List built-in suites and zome kinds
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    zome_scenario::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            config,
            suite,
            report,
            tap,
        } => {
            let run = cmd_run(&config, &suite, tap).await?;
            if let Some(path) = report {
                run.write_json(&path)?;
                info!(path = %path.display(), "Report written");
            }
            if run.exit_code() != 0 {
                std::process::exit(run.exit_code());
            }
            Ok(())
        }
        Commands::Validate { config } => cmd_validate(&config, cli.json),
        Commands::List => cmd_list(cli.json),
    }
}

fn configure(config_path: &Path) -> Result<Scenario> {
    let config = ScenarioConfig::load(config_path)
        .with_context(|| format!("Failed to load scenario config {:?}", config_path))?;
    Scenario::configure(config, &ZomeRegistry::with_builtins())
        .with_context(|| format!("Invalid scenario {:?}", config_path))
}

fn find_suite(name: &str) -> Result<&'static Suite> {
    suites::find(name).with_context(|| {
        let known: Vec<&str> = suites::builtin().iter().map(|s| s.name).collect();
        format!("Unknown suite {:?} (known: {})", name, known.join(", "))
    })
}

async fn cmd_run(config_path: &Path, suite_name: &str, tap: bool) -> Result<RunReport> {
    let suite = find_suite(suite_name)?;
    let mut scenario = configure(config_path)?;
    (suite.register)(&mut scenario);

    info!(suite = %suite.name, cases = scenario.case_names().len(), "Running suite");

    if tap {
        let mut reporter = TapReporter::new(std::io::stdout());
        Ok(scenario.run_with_reporter(&mut reporter).await)
    } else {
        let report = scenario.run().await;
        print!("{}", report.render_summary());
        Ok(report)
    }
}

fn cmd_validate(config_path: &Path, as_json: bool) -> Result<()> {
    let scenario = configure(config_path)?;
    let config = scenario.config();
    let package = scenario.package();

    if as_json {
        let agents: Vec<_> = config
            .agents
            .iter()
            .map(|a| json!({ "name": a.name, "id": a.agent_id() }))
            .collect();
        let output = json!({
            "scenario": config.name,
            "package": { "name": package.name, "version": package.version },
            "zomes": package.zomes,
            "agents": agents,
            "isolation": config.isolation,
            "case_timeout_secs": config.case_timeout_secs,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("✓ Scenario {:?} is valid", config.name);
    println!("  Package: {} v{}", package.name, package.version);
    for zome in &package.zomes {
        println!("  Zome:    {} ({})", zome.name, zome.kind);
    }
    for agent in &config.agents {
        println!("  Agent:   {} {}", agent.name, agent.agent_id());
    }
    Ok(())
}

fn cmd_list(as_json: bool) -> Result<()> {
    let registry = ZomeRegistry::with_builtins();
    if as_json {
        let suites: Vec<_> = suites::builtin()
            .iter()
            .map(|s| json!({ "name": s.name, "description": s.description }))
            .collect();
        let output = json!({ "suites": suites, "zome_kinds": registry.kinds() });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Suites:");
    for suite in suites::builtin() {
        println!("  {:<16} {}", suite.name, suite.description);
    }
    println!("Zome kinds:");
    for kind in registry.kinds() {
        println!("  {}", kind);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_scenario(dir: &Path) -> PathBuf {
        std::fs::write(
            dir.join("game-matchmaking.dna.json"),
            r#"{"name": "game-matchmaking", "zomes": [{"name": "main", "kind": "matchmaking"}]}"#,
        )
        .unwrap();
        let path = dir.join("scenario.toml");
        std::fs::write(
            &path,
            r#"
name = "cli"
application = "game-matchmaking.dna.json"

[[agents]]
name = "alice"

[[agents]]
name = "bob"
"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "zome-scenario",
            "--verbose",
            "run",
            "--config",
            "s.toml",
            "--report",
            "out.json",
            "--tap",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                config,
                suite,
                report,
                tap,
            } => {
                assert_eq!(config, PathBuf::from("s.toml"));
                assert_eq!(suite, "matchmaking");
                assert_eq!(report, Some(PathBuf::from("out.json")));
                assert!(tap);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_requires_config() {
        assert!(Cli::try_parse_from(["zome-scenario", "validate"]).is_err());
        assert!(Cli::try_parse_from(["zome-scenario", "list", "--json"]).is_ok());
    }

    #[tokio::test]
    async fn test_cmd_run_builtin_suite() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_scenario(dir.path());

        let report = cmd_run(&config, "matchmaking", false).await.unwrap();
        assert_eq!(report.exit_code(), 0, "{}", report.render_summary());
        assert_eq!(report.scenario, "cli");
    }

    #[tokio::test]
    async fn test_cmd_run_unknown_suite() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_scenario(dir.path());
        let err = cmd_run(&config, "chess", false).await.unwrap_err();
        assert!(err.to_string().contains("Unknown suite"));
    }

    #[test]
    fn test_cmd_validate() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_scenario(dir.path());
        cmd_validate(&config, false).unwrap();
        cmd_validate(&config, true).unwrap();

        std::fs::remove_file(dir.path().join("game-matchmaking.dna.json")).unwrap();
        let err = cmd_validate(&config, false).unwrap_err();
        assert!(format!("{:#}", err).contains("not found"));
    }

    #[test]
    fn test_cmd_list() {
        cmd_list(false).unwrap();
        cmd_list(true).unwrap();
    }
}
