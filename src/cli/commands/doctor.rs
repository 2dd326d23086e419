//! Doctor command - verify credentials, paths and configuration.

use crate::cli::Output;
use crate::config::{credential_present, Settings};
use console::style;
use std::path::{Path, PathBuf};

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&PathBuf>) -> anyhow::Result<()> {
    Output::header("Newscast Doctor");
    println!();

    let mut checks = Vec::new();

    let credentials = check_credentials(settings);
    print_section("Credentials", &credentials);
    checks.extend(credentials);

    let paths = check_paths(settings);
    print_section("Output", &paths);
    checks.extend(paths);

    let mut config = vec![check_config_file(config_path)];
    config.extend(settings.validate().into_iter().map(|msg| {
        CheckResult::warning("Setting", &msg, "Adjust config.toml or the environment")
    }));
    print_section("Configuration", &config);
    checks.extend(config);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        anyhow::bail!("{} error(s) found", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed.");
    }

    Ok(())
}

fn check_env(name: &str, required: bool, purpose: &str) -> CheckResult {
    if credential_present(name) {
        CheckResult::ok(name, "configured")
    } else if required {
        CheckResult::warning(
            name,
            "not set",
            &format!("Set with: export {}='...' ({})", name, purpose),
        )
    } else {
        CheckResult::ok(name, &format!("not set ({} unused)", purpose))
    }
}

fn check_credentials(settings: &Settings) -> Vec<CheckResult> {
    let mut results = vec![check_env(
        &settings.tts.credential_env(),
        settings.tts.enabled,
        "speech synthesis",
    )];

    let llm_on = settings.llm.enabled || settings.llm.rewrite_enabled;
    if settings.llm.api_key_env != settings.tts.credential_env() || !settings.tts.enabled {
        results.push(check_env(&settings.llm.api_key_env, llm_on, "AI cleanup"));
    }

    results.push(check_env(
        &settings.fetch.diffbot_token_env,
        settings.feed.fetch_original,
        "article extraction",
    ));
    results
}

fn check_dir(name: &str, dir: &Path) -> CheckResult {
    if dir.is_dir() {
        CheckResult::ok(name, &dir.display().to_string())
    } else if dir.exists() {
        CheckResult::error(name, &format!("{} is not a directory", dir.display()), "Point it at a directory")
    } else {
        CheckResult::warning(
            name,
            &format!("{} (will be created)", dir.display()),
            "Directory will be created on first run",
        )
    }
}

fn check_paths(settings: &Settings) -> Vec<CheckResult> {
    let mut results = vec![check_dir("Site root", &settings.root_dir())];

    let state = settings.state_path();
    let state_check = if !state.exists() {
        CheckResult::warning(
            "State file",
            &format!("{} (not created yet)", state.display()),
            "State is written after the first published run",
        )
    } else {
        match std::fs::read_to_string(&state)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).map_err(|e| e.to_string()))
        {
            Ok(_) => CheckResult::ok("State file", &state.display().to_string()),
            Err(e) => CheckResult::error(
                "State file",
                &format!("{} is unreadable: {}", state.display(), e),
                "Fix or remove the file; a missing state starts fresh",
            ),
        }
    };
    results.push(state_check);
    results
}

fn check_config_file(config_path: Option<&PathBuf>) -> CheckResult {
    let path = config_path.cloned().unwrap_or_else(Settings::default_config_path);
    if path.exists() {
        CheckResult::ok("Config file", &path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {}", path.display()),
        )
    }
}
