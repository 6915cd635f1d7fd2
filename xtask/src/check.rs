use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Embedded target the codec must keep building for.
const EMBEDDED_TARGET: &str = "thumbv7em-none-eabihf";

/// One `cargo` invocation that must succeed.
struct Step {
    label: &'static str,
    args: Vec<&'static str>,
}

impl Step {
    fn new(label: &'static str, args: &[&'static str]) -> Self {
        Self {
            label,
            args: args.to_vec(),
        }
    }
}

pub fn run(host_only: bool) -> Result<()> {
    println!();
    println!("{}", "🔍 Checking febd-spi builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    let mut steps = vec![
        Step::new("host (std)", &["check", "-p", "febd-spi"]),
        Step::new(
            "host, serde feature",
            &["check", "-p", "febd-spi", "--features", "serde", "--all-targets"],
        ),
    ];
    if !host_only {
        steps.push(Step::new(
            "no_std (thumbv7em)",
            &[
                "check",
                "-p",
                "febd-spi",
                "--target",
                EMBEDDED_TARGET,
                "--no-default-features",
                "--features",
                "defmt",
            ],
        ));
    }

    for step in &steps {
        run_step(step)?;
    }

    // Clippy and rustfmt report but do not fail the run
    println!("{}", "  Running clippy lints...".cyan());
    let clippy_start = Instant::now();
    let clippy = Command::new("cargo")
        .args(["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
        .output()
        .context("Failed to run clippy")?;
    if clippy.status.success() {
        println!(
            "{}",
            format!(
                "  ✓ Clippy passed in {:.2}s",
                clippy_start.elapsed().as_secs_f64()
            )
            .green()
        );
    } else {
        eprintln!("{}", "  ⚠ Clippy warnings found".yellow().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&clippy.stderr));
    }
    println!();

    println!("{}", "  Checking code formatting...".cyan());
    let fmt = Command::new("cargo")
        .args(["fmt", "--all", "--check"])
        .output()
        .context("Failed to run cargo fmt")?;
    if fmt.status.success() {
        println!("{}", "  ✓ Formatting check passed".green());
    } else {
        eprintln!("{}", "  ⚠ Formatting issues found".yellow().bold());
        eprintln!("     Run 'cargo fmt --all' to fix");
    }
    println!();

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

fn run_step(step: &Step) -> Result<()> {
    println!("{}", format!("  Checking {}...", step.label).cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(&step.args)
        .output()
        .with_context(|| format!("Failed to check {}", step.label))?;

    if !output.status.success() {
        eprintln!("{}", format!("  ✗ {} check failed", step.label).red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("{} check failed", step.label);
    }

    println!(
        "{}",
        format!(
            "  ✓ {} passed in {:.2}s",
            step.label,
            start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
    Ok(())
}
