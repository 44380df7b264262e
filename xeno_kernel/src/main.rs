/// Xeno kernel — Scenario Runner
///
/// Loads a scenario file (first CLI argument, or the bundled fixtures),
/// runs every scenario twice through the engine and reports expectation
/// mismatches and determinism. Exits 1 on any failure.
///
/// Logging via RUST_LOG (default `info`); `RUST_LOG=xeno_kernel=debug`
/// traces every call.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use xeno_kernel::scenario::{parse_scenarios, run_scenario};

const DEFAULT_PATHS: [&str; 2] = [
    "tests/fixtures/scenarios.json",
    "xeno_kernel/tests/fixtures/scenarios.json",
];

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();

    let path = match std::env::args().nth(1) {
        Some(p) => p,
        None => match DEFAULT_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => (*p).to_string(),
            None => {
                error!("no scenario file given and no bundled fixtures found");
                return ExitCode::FAILURE;
            }
        },
    };

    let data = match fs::read_to_string(&path) {
        Ok(d) => d,
        Err(err) => {
            error!(%path, %err, "failed to read scenario file");
            return ExitCode::FAILURE;
        }
    };
    let scenarios = match parse_scenarios(&data) {
        Ok(s) => s,
        Err(err) => {
            error!(%path, %err, "failed to parse scenario file");
            return ExitCode::FAILURE;
        }
    };
    info!(%path, count = scenarios.len(), "loaded scenarios");

    let mut passed = 0;
    for scenario in &scenarios {
        match run_scenario(scenario) {
            Ok(report) if report.passed() => {
                passed += 1;
                println!(
                    "[PASS] {}: calls={}, hash={}",
                    report.name,
                    report.receipts.len(),
                    report.state_hash
                );
            }
            Ok(report) => {
                println!("[FAIL] {}:", report.name);
                if !report.deterministic {
                    println!("  Determinism fail: replay produced a different hash");
                }
                for m in &report.mismatches {
                    println!(
                        "  #{} {}: expected {:?}, got {:?}",
                        m.sequence, m.function, m.expected, m.actual
                    );
                }
            }
            Err(err) => {
                println!("[FAIL] {}: call refused: {}", scenario.name, err);
            }
        }
    }

    println!("\n===========================================");
    println!("Results: {}/{} passed", passed, scenarios.len());
    if passed == scenarios.len() {
        println!("[OK] All scenarios PASSED.");
        ExitCode::SUCCESS
    } else {
        println!("[FAIL] Some scenarios failed.");
        ExitCode::FAILURE
    }
}
