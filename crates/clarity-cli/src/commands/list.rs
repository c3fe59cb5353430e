//! List command - show registered suites and their tests without running them

use crate::LoadArgs;
use anyhow::Result;
use colored::*;

/// Run the list command
pub fn run(args: LoadArgs, json: bool) -> Result<()> {
    let config = super::load_config(&args)?;
    if !config.color() {
        colored::control::set_override(false);
    }
    super::load_libraries(&config, &args)?;

    {
        let registry = clarity::registry();

        if json {
            let suites: Vec<_> = registry
                .suites()
                .iter()
                .map(|suite| {
                    let tests: Vec<&str> = suite.tests().iter().map(|t| t.name()).collect();
                    serde_json::json!({
                        "name": suite.name(),
                        "tests": tests,
                        "fixtures": suite.fixture_count(),
                    })
                })
                .collect();
            println!("{}", serde_json::json!({ "suites": suites }));
        } else if registry.is_empty() {
            println!("{}", "No test suites registered.".yellow());
        } else {
            for suite in registry.suites() {
                println!(
                    "{} ({} test{})",
                    suite.name().bold(),
                    suite.len(),
                    if suite.len() == 1 { "" } else { "s" }
                );
                for test in suite.tests() {
                    println!("  {}", test.name());
                }
            }
        }
    }

    super::unload_libraries();
    Ok(())
}
