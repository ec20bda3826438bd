//! Console rendering of test results

use colored::Colorize;
use serde::Serialize;

use crate::common::Result;
use crate::testing::{RunSummary, TestCaseResult, TestStatus};

const RULE_WIDTH: usize = 60;

pub fn print_banner() {
    let rule = "=".repeat(RULE_WIDTH);
    println!("{}", rule.cyan());
    println!("{}", "    LOAD BALANCER FUNCTIONAL TEST RUNNER".yellow().bold());
    println!("{}\n", rule.cyan());
}

/// One line per result, in the order given
pub fn print_results(results: &[TestCaseResult]) {
    println!("\n{}", "Results:".cyan());
    for result in results {
        let secs = format!("({:.2}s)", result.duration.as_secs_f64());
        match result.status {
            TestStatus::Pass => {
                println!("  {} {} {}", "✓".green(), result.name.white().bold(), secs.dimmed());
            }
            TestStatus::Fail => {
                println!("  {} {} {}", "✗".red(), result.name.white().bold(), secs.dimmed());
                if let Some(error) = &result.error {
                    println!("      {}", error.red());
                }
            }
        }
    }
}

pub fn print_summary(summary: &RunSummary) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{}", rule.cyan());
    println!("{}", "TEST EXECUTION SUMMARY".yellow().bold());
    println!("{}", rule.cyan());
    println!("Total Test Cases: {}", summary.total);
    println!("{}", format!("Passed: {}", summary.passed).green());
    let failed = format!("Failed: {}", summary.failed);
    if summary.failed > 0 {
        println!("{}", failed.red());
    } else {
        println!("{}", failed);
    }
    println!(
        "Execution Time: {:.2} seconds",
        summary.elapsed.as_secs_f64()
    );

    if summary.all_passed() {
        println!("\n{} {}\n", "✓".green().bold(), "All Tests Passed".green().bold());
    } else {
        println!("\n{} {}\n", "✗".red().bold(), "Some Tests Failed".red().bold());
    }
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a RunSummary,
    results: &'a [TestCaseResult],
}

/// Results and summary as a single JSON document
pub fn print_json(results: &[TestCaseResult], summary: &RunSummary) -> Result<()> {
    let report = Report { summary, results };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
