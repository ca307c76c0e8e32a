//! Doctor command - verify credentials and configuration.

use crate::cli::output::format_size;
use crate::cli::Output;
use crate::config::{Settings, ENV_SECRET_ID, ENV_SECRET_KEY};
use crate::transcription::SYNC_MAX_BYTES;
use console::style;
use std::time::Duration;

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

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("feyn-asr Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Credentials").bold());
    let cred_checks = check_credentials(settings);
    for check in &cred_checks {
        check.print();
    }
    checks.extend(cred_checks);

    println!();

    println!("{}", style("Endpoint").bold());
    let endpoint_check = check_endpoint(settings);
    endpoint_check.print();
    checks.push(endpoint_check);

    println!();

    println!("{}", style("Transcription").bold());
    let budget_checks = check_transcription(settings);
    for check in &budget_checks {
        check.print();
    }
    checks.extend(budget_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before transcribing.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! feyn-asr is ready to use.");
    }

    Ok(())
}

/// Check that SecretId and SecretKey are present.
fn check_credentials(settings: &Settings) -> Vec<CheckResult> {
    let t = &settings.tencent;
    let mut results = Vec::new();

    if t.secret_id.trim().is_empty() {
        results.push(CheckResult::error(
            "SecretId",
            "not set",
            &format!("Set with: export {}='AKID...'", ENV_SECRET_ID),
        ));
    } else if !t.secret_id.starts_with("AKID") {
        results.push(CheckResult::warning(
            "SecretId",
            "set but format looks unusual",
            "Tencent Cloud SecretIds usually start with AKID",
        ));
    } else {
        let masked: String = t.secret_id.chars().take(6).collect();
        results.push(CheckResult::ok("SecretId", &format!("configured ({}...)", masked)));
    }

    if t.secret_key.trim().is_empty() {
        results.push(CheckResult::error(
            "SecretKey",
            "not set",
            &format!("Set with: export {}='...'", ENV_SECRET_KEY),
        ));
    } else {
        results.push(CheckResult::ok("SecretKey", "configured"));
    }

    if t.region.trim().is_empty() {
        results.push(CheckResult::error(
            "Region",
            "empty",
            "Set tencent.region, e.g. ap-guangzhou",
        ));
    } else {
        results.push(CheckResult::ok("Region", &t.region));
    }

    results
}

/// Check that the endpoint parses and uses HTTPS.
fn check_endpoint(settings: &Settings) -> CheckResult {
    match url::Url::parse(&settings.tencent.endpoint) {
        Ok(url) if url.scheme() == "https" => {
            CheckResult::ok("Endpoint", &settings.tencent.endpoint)
        }
        Ok(_) => CheckResult::warning(
            "Endpoint",
            &format!("{} (not HTTPS)", settings.tencent.endpoint),
            "Plain HTTP is only meant for local testing",
        ),
        Err(e) => CheckResult::error(
            "Endpoint",
            &format!("invalid: {}", e),
            "Expected something like https://asr.tencentcloudapi.com",
        ),
    }
}

/// Sanity-check the polling budget and size limit.
fn check_transcription(settings: &Settings) -> Vec<CheckResult> {
    let t = &settings.transcription;
    let deadline = Duration::from_millis(t.poll_interval_ms)
        .checked_mul(t.max_poll_attempts.saturating_sub(1));

    let budget = match deadline {
        _ if t.max_poll_attempts == 0 => CheckResult::error(
            "Poll budget",
            "max_poll_attempts is 0",
            "Set transcription.max_poll_attempts to at least 1",
        ),
        None => CheckResult::error(
            "Poll budget",
            "poll_interval_ms x max_poll_attempts overflows",
            "Use an interval of a few seconds, e.g. poll_interval_ms = 2000",
        ),
        Some(deadline) if deadline > Duration::from_secs(15 * 60) => CheckResult::warning(
            "Poll budget",
            &format!("{} attempts, waits up to {:?}", t.max_poll_attempts, deadline),
            "Callers are blocked for the whole wait; consider a shorter budget",
        ),
        Some(deadline) => CheckResult::ok(
            "Poll budget",
            &format!("{} attempts, waits up to {:?}", t.max_poll_attempts, deadline),
        ),
    };

    let sync_limit = if t.sync_max_bytes > SYNC_MAX_BYTES {
        CheckResult::warning(
            "Sync limit",
            &format!(
                "{} configured, capped at {}",
                format_size(t.sync_max_bytes as u64),
                format_size(SYNC_MAX_BYTES as u64)
            ),
            "SentenceRecognition only accepts clips up to 5 MB",
        )
    } else {
        CheckResult::ok("Sync limit", &format_size(t.sync_max_bytes as u64))
    };

    vec![budget, sync_limit]
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: feyn-asr config init",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_missing_credentials_are_errors() {
        let checks = check_credentials(&Settings::default());
        let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
        assert_eq!(errors, 2);
    }

    #[test]
    fn test_http_endpoint_warns() {
        let mut settings = Settings::default();
        settings.tencent.endpoint = "http://127.0.0.1:9000".to_string();
        assert_eq!(check_endpoint(&settings).status, CheckStatus::Warning);
    }

    #[test]
    fn test_default_budget_is_ok() {
        let checks = check_transcription(&Settings::default());
        assert_eq!(checks[0].status, CheckStatus::Ok);
        assert!(checks[0].message.contains("60 attempts"));
        assert_eq!(checks[1].status, CheckStatus::Ok);
    }

    #[test]
    fn test_huge_interval_is_an_error_not_a_panic() {
        let mut settings = Settings::default();
        settings.transcription.poll_interval_ms = u64::MAX;
        let checks = check_transcription(&settings);
        assert_eq!(checks[0].status, CheckStatus::Error);
        assert!(checks[0].message.contains("overflows"));
    }

    #[test]
    fn test_oversized_sync_limit_warns() {
        let mut settings = Settings::default();
        settings.transcription.sync_max_bytes = 64 * 1024 * 1024;
        let checks = check_transcription(&settings);
        assert_eq!(checks[1].status, CheckStatus::Warning);
    }
}
