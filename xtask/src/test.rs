use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running febd-spi tests...".cyan().bold());
    println!();

    let total_start = Instant::now();

    if !integration_only {
        suite("unit tests", &["test", "-p", "febd-spi", "--lib", "--features", "serde"])?;
    }
    if !unit_only {
        suite(
            "integration tests",
            &["test", "-p", "febd-spi", "--tests", "--features", "serde"],
        )?;
    }

    // Doc tests only warn
    println!("{}", "  Running doc tests...".cyan());
    let doc_start = Instant::now();
    let doc = cargo(&["test", "-p", "febd-spi", "--doc"]).context("Failed to run doc tests")?;
    if doc.status.success() {
        println!(
            "{}",
            format!(
                "  ✓ Doc tests passed {} in {:.2}s",
                extract_test_summary(&String::from_utf8_lossy(&doc.stdout)),
                doc_start.elapsed().as_secs_f64()
            )
            .green()
        );
    } else {
        eprintln!("{}", "  ⚠ Doc tests failed".yellow().bold());
    }
    println!();

    println!(
        "{}",
        format!(
            "✓ All tests completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

fn cargo(args: &[&str]) -> std::io::Result<Output> {
    Command::new("cargo").args(args).output()
}

fn suite(name: &str, args: &[&str]) -> Result<()> {
    println!("{}", format!("  Running {name}...").cyan());
    let start = Instant::now();

    let output = cargo(args).with_context(|| format!("Failed to run {name}"))?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !output.status.success() {
        eprintln!("{}", format!("  ✗ {name} failed").red().bold());
        eprintln!();
        for line in stdout.lines() {
            eprintln!("  {line}");
        }
        anyhow::bail!("{name} failed");
    }

    println!(
        "{}",
        format!(
            "  ✓ {name} passed {} in {:.2}s",
            extract_test_summary(&stdout),
            start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
    Ok(())
}

/// Sum every "test result:" line, since `--tests` runs one binary per file.
fn extract_test_summary(output: &str) -> String {
    let mut passed = 0u64;
    let mut failed = 0u64;
    let mut found = false;
    for line in output.lines() {
        let Some(summary) = line.split("test result:").nth(1) else {
            continue;
        };
        found = true;
        for part in summary.split(';') {
            let mut words = part.split_whitespace().rev();
            let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                continue;
            };
            let Ok(count) = count.parse::<u64>() else {
                continue;
            };
            match kind {
                "passed" => passed = passed.saturating_add(count),
                "failed" => failed = failed.saturating_add(count),
                _ => {}
            }
        }
    }
    if found {
        format!("({passed} passed; {failed} failed)")
    } else {
        "(summary not available)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::extract_test_summary;

    #[test]
    fn sums_results_across_binaries() {
        let out = "\
test result: ok. 5 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out
test result: ok. 7 passed; 0 failed; 1 ignored; 0 measured; 0 filtered out";
        assert_eq!(extract_test_summary(out), "(12 passed; 0 failed)");
    }

    #[test]
    fn missing_summary_is_reported() {
        assert_eq!(extract_test_summary("nothing here"), "(summary not available)");
    }
}
