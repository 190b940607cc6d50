//! Bringup CLI - schematic bring-up analysis from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use bringup::{
    AnalyzeOptions, BringupCore, BringupReport, RiskLevel, SchematicDocument, Severity,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "bringup")]
#[command(about = "Circuit-schematic bring-up analysis tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a schematic document and print a bring-up report
    Analyze {
        /// Path to a schematic document (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if findings at this severity or higher exist
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,

        /// Label attachment tolerance in sheet units
        #[arg(long, default_value_t = 2)]
        tolerance: i64,
    },

    /// List available analysis checks
    Checks {
        /// Show check descriptions
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Critical,
    High,
    Medium,
    Low,
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Analyze {
            file,
            format,
            fail_on,
            tolerance,
        } => handle_analyze(&file, format, fail_on, tolerance),
        Commands::Checks { verbose } => {
            handle_checks(verbose);
            0
        }
    };

    process::exit(exit_code);
}

fn handle_analyze(
    file: &PathBuf,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
    tolerance: i64,
) -> i32 {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", file.display(), e);
            return 1;
        }
    };

    let doc: SchematicDocument = match serde_json::from_str(&text) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: invalid schematic document: {}", e);
            return 1;
        }
    };

    let options = AnalyzeOptions {
        label_tolerance: tolerance,
        ..AnalyzeOptions::default()
    };

    match BringupCore::analyze(&doc, &options) {
        Ok(report) => {
            match format {
                OutputFormat::Human => output_human(&report),
                OutputFormat::Json => output_json(&report),
            }
            if let Some(severity) = fail_on {
                if should_fail(&report, &severity) {
                    return 1;
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn should_fail(report: &BringupReport, severity: &FailOnSeverity) -> bool {
    let floor = match severity {
        FailOnSeverity::Critical => Severity::Critical,
        FailOnSeverity::High => Severity::High,
        FailOnSeverity::Medium => Severity::Medium,
        FailOnSeverity::Low => Severity::Low,
    };
    report.findings.iter().any(|f| f.severity >= floor)
        || report
            .analysis_results
            .iter()
            .any(|r| r.is_failure() && r.severity >= floor)
}

fn output_human(report: &BringupReport) {
    println!("\nBring-up report ({})", report.run_id);
    println!("{}", "─".repeat(60));
    println!("  Circuit type: {}", report.circuit_type);
    if let Some(ref main) = report.main_component {
        println!("  Main component: {}", main);
    }
    println!(
        "  Plan source: {} (confidence {:.2})",
        report.plan_source.as_str(),
        report.plan_confidence
    );

    if report.findings.is_empty() {
        println!("\n  No design findings");
    } else {
        println!("\n  Findings:");
        for severity in [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ] {
            for finding in report.findings.iter().filter(|f| f.severity == severity) {
                println!("    [{}] {}", severity.as_str().to_uppercase(), finding.summary);
                if let Some(ref location) = finding.location {
                    println!("      Location: {}", location);
                }
            }
        }
    }

    if !report.analysis_results.is_empty() {
        println!("\n  Analysis checks:");
        for result in &report.analysis_results {
            println!("    {:?}: {} - {}", result.status, result.check, result.summary);
            for issue in &result.issues {
                println!("      - {}", issue);
            }
        }
    }

    if !report.checklist.is_empty() {
        println!("\n  Bench checklist:");
        for step in &report.checklist {
            println!("    {}. {}", step.sequence, step.title);
        }
    }

    let risk = &report.overall_risk;
    println!("\n  Summary:");
    println!("    Risk score:  {}/100 ({:?})", risk.score, risk.level);
    println!("    Findings:    {}", risk.total_findings);
    println!("    Blockers:    {}", risk.blocker_count);
    if !risk.blockers.is_empty() {
        for blocker in &risk.blockers {
            println!("      - {}", blocker);
        }
    }
    if risk.can_attempt_bringup {
        println!("    Bring-up can be attempted");
    } else {
        println!("    Fix blockers before attempting bring-up");
    }
    if risk.level == RiskLevel::Critical {
        println!("    Critical issues present");
    }
}

fn output_json(report: &BringupReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize report: {}", e),
    }
}

fn handle_checks(verbose: bool) {
    let registry = bringup::AnalysisRegistry::with_default_checks();
    println!("Available analysis checks:\n");
    for name in registry.names() {
        println!("  {}", name);
        if verbose {
            if let Some(check) = registry.get(name) {
                println!("    {}", check.description());
            }
        }
        println!();
    }
}
