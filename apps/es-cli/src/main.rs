use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use es_app::{
    AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, project_service, query,
    run_service,
};
use es_solver::SolverChoice;
use tracing::Level;

#[derive(Parser)]
#[command(name = "esflow")]
#[command(about = "esflow - energy system network to linear program compiler", long_about = None)]
struct Cli {
    /// Debug logging and solver output
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Print per-phase timings
    #[arg(long, global = true)]
    timing: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SolveArgs {
    /// LP backend (clarabel or highs)
    #[arg(long, default_value = "clarabel")]
    solver: SolverChoice,
    /// Solver time limit in seconds
    #[arg(long)]
    time_limit: Option<f64>,
    /// Skip cache and force re-run
    #[arg(long)]
    no_cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax, references and physical consistency
    Validate {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// List systems in a project
    Systems {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Compile and solve one system
    Run {
        /// Path to the project file
        project_path: PathBuf,
        /// System ID to run
        system_id: String,
        #[command(flatten)]
        solve: SolveArgs,
        /// Also write the compiled LP to this file
        #[arg(long)]
        lp: Option<PathBuf>,
    },
    /// Compile and solve several systems in parallel
    RunAll {
        /// Path to the project file
        project_path: PathBuf,
        /// System IDs (all systems when omitted)
        system_ids: Vec<String>,
        #[command(flatten)]
        solve: SolveArgs,
    },
    /// Compile one system and write its LP file without solving
    WriteLp {
        /// Path to the project file
        project_path: PathBuf,
        /// System ID to compile
        system_id: String,
        /// Output LP file
        output: PathBuf,
    },
    /// List cached runs for a system
    Runs {
        /// Path to the project file
        project_path: PathBuf,
        /// System ID to list runs for
        system_id: String,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export the flows of one bus or node of a run as CSV
    Export {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Bus or node label
        label: String,
        /// Output CSV file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
    if cli.timing {
        es_core::timing::enable_timing();
    }

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Systems { project_path } => cmd_systems(&project_path),
        Commands::Run {
            project_path,
            system_id,
            solve,
            lp,
        } => {
            let mut options = run_options(&solve, cli.verbose);
            options.lp_path = lp;
            cmd_run(&project_path, &system_id, options)
        }
        Commands::RunAll {
            project_path,
            system_ids,
            solve,
        } => cmd_run_all(&project_path, &system_ids, run_options(&solve, cli.verbose)),
        Commands::WriteLp {
            project_path,
            system_id,
            output,
        } => cmd_write_lp(&project_path, &system_id, &output),
        Commands::Runs {
            project_path,
            system_id,
        } => cmd_runs(&project_path, &system_id),
        Commands::ShowRun {
            project_path,
            run_id,
        } => cmd_show_run(&project_path, &run_id),
        Commands::Export {
            project_path,
            run_id,
            label,
            output,
        } => cmd_export(&project_path, &run_id, &label, output.as_deref()),
    }
}

fn run_options(args: &SolveArgs, verbose: bool) -> RunOptions {
    RunOptions {
        use_cache: !args.no_cache,
        solver: args.solver,
        verbose,
        time_limit_s: args.time_limit,
        ..RunOptions::default()
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(project_path, &project)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_systems(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let systems = project_service::list_systems(&project);

    if systems.is_empty() {
        println!("No systems found in project");
    } else {
        println!("Systems in project:");
        for sys in systems {
            println!(
                "  {} - {} ({} timesteps, {} buses, {} nodes, {} flows, {} storages)",
                sys.id,
                sys.name,
                sys.timesteps,
                sys.bus_count,
                sys.node_count,
                sys.flow_count,
                sys.storage_count
            );
        }
    }
    Ok(())
}

fn cmd_run(project_path: &Path, system_id: &str, options: RunOptions) -> AppResult<()> {
    println!("Running system: {}", system_id);

    let request = RunRequest {
        project_path,
        system_id,
        options,
    };

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event: RunProgressEvent| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Run completed: {}", response.run_id);
    }
    if let Some(lp) = &request.options.lp_path {
        println!("  LP file: {}", lp.display());
    }

    response.timing.perf_stats().print_summary();

    let (manifest, data) = run_service::load_run(project_path, &response.run_id)?;
    print_summary(&query::get_run_summary(&manifest, &data));
    Ok(())
}

fn cmd_run_all(project_path: &Path, system_ids: &[String], options: RunOptions) -> AppResult<()> {
    let items = es_app::run_all(project_path, system_ids, &options)?;
    let mut failures = 0usize;
    for item in &items {
        match &item.result {
            Ok(response) => {
                let meta = &response.manifest.meta;
                println!(
                    "✓ {}: {} objective={} ({}{:.3}s)",
                    item.system_id,
                    meta.status,
                    format_objective(meta.objective),
                    if response.loaded_from_cache { "cached, " } else { "" },
                    response.timing.total_time_s
                );
            }
            Err(err) => {
                failures += 1;
                println!("✗ {}: {}", item.system_id, err);
            }
        }
    }
    println!("{} of {} systems succeeded", items.len() - failures, items.len());
    Ok(())
}

fn cmd_write_lp(project_path: &Path, system_id: &str, output: &Path) -> AppResult<()> {
    let stats = run_service::write_lp(project_path, system_id, output)?;
    println!("✓ Wrote {}", output.display());
    println!(
        "  {} variables, {} constraints, {} nonzeros",
        stats.variables, stats.constraints, stats.nonzeros
    );
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn stage_label(stage: RunStage) -> &'static str {
    match stage {
        RunStage::LoadingProject => "load",
        RunStage::ResolvingProfiles => "profiles",
        RunStage::CheckingCache => "cache",
        RunStage::LoadingCachedResult => "cache-load",
        RunStage::Compiling => "compile",
        RunStage::WritingLp => "write-lp",
        RunStage::Solving => "solve",
        RunStage::SavingResults => "save",
        RunStage::Completed => "done",
    }
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        stage_label(event.stage),
        event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn format_objective(objective: Option<f64>) -> String {
    objective.map_or_else(|| "-".to_string(), |v| format!("{:.6}", v))
}

fn print_summary(summary: &es_app::RunSummary) {
    println!("  Status: {}", summary.status);
    println!("  Objective: {}", format_objective(summary.objective));
    println!("  Timesteps: {}", summary.timesteps);
    println!("  Flows: {}", summary.flow_count);
    println!("  Storages: {}", summary.storage_count);
    println!("  Investments: {}", summary.investment_count);
}

fn cmd_runs(project_path: &Path, system_id: &str) -> AppResult<()> {
    let runs = run_service::list_runs(project_path, system_id)?;

    if runs.is_empty() {
        println!("No cached runs found for system: {}", system_id);
    } else {
        println!("Cached runs for system '{}':", system_id);
        for manifest in runs {
            println!(
                "  {} ({}, {}, {})",
                manifest.run_id, manifest.timestamp, manifest.meta.solver, manifest.meta.status
            );
        }
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, data) = run_service::load_run(project_path, run_id)?;
    let summary = query::get_run_summary(&manifest, &data);

    println!("\nRun Summary:");
    println!("  System: {}", summary.system_id);
    println!("  Solver: {} ({})", manifest.meta.solver, manifest.solver_version);
    println!("  Solve time: {:.3}s", manifest.meta.solve_time_s);
    let stats = &manifest.meta.stats;
    println!(
        "  Problem: {} variables, {} constraints, {} nonzeros",
        stats.variables, stats.constraints, stats.nonzeros
    );
    print_summary(&summary);

    println!("\nLabels:");
    for label in query::list_labels(&data) {
        println!("  {}", label);
    }

    if !data.investments.is_empty() {
        println!("\nInvestments:");
        for inv in &data.investments {
            println!(
                "  {}: +{:.4} (existing {:.4}, total {:.4})",
                inv.owner,
                inv.added,
                inv.existing,
                inv.total()
            );
        }
    }

    Ok(())
}

fn cmd_export(
    project_path: &Path,
    run_id: &str,
    label: &str,
    output: Option<&Path>,
) -> AppResult<()> {
    let (manifest, data) = run_service::load_run(project_path, run_id)?;

    if let Some(path) = output {
        es_results::export_node_csv(path, &manifest, &data, label)?;
        println!(
            "✓ Exported {} flows of '{}' to {}",
            data.flows_of(label).len(),
            label,
            path.display()
        );
    } else {
        es_results::write_node_csv(io::stdout().lock(), &manifest, &data, label)?;
    }

    Ok(())
}
