use clap::{Arg, ArgMatches, Command};
use logtriage_core::input::read_log_file;
use logtriage_core::{
    audit, render_report, scan_error_signals, Config, LogTriage, RunStatus, SetupError,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

// Exit codes for automation pipelines
const EXIT_GENERAL_ERROR: i32 = 1;
const EXIT_FILE_NOT_FOUND: i32 = 2;
const EXIT_EMPTY_INPUT: i32 = 3;
const EXIT_AUTH_ERROR: i32 = 4;
const EXIT_API_ERROR: i32 = 5;
const EXIT_CONFIG_ERROR: i32 = 6;

struct CliFailure {
    exit_code: i32,
    message: String,
    audit_log: PathBuf,
}

#[tokio::main]
async fn main() {
    // Initialize tracing with default configuration
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting LogTriage CLI");

    let matches = Command::new("logtriage")
        .version("0.1.0")
        .about("LLM-assisted incident report generation from operational logs")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Log file to analyze")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Report file to write; defaults to <input stem>_report.md next to the input"),
        )
        .arg(
            Arg::new("provider")
                .short('p')
                .long("provider")
                .value_name("PROVIDER")
                .help("Completion provider to use (openai, anthropic)"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .value_name("KEY")
                .help("API key for the completion provider"),
        )
        .arg(
            Arg::new("prompts-dir")
                .long("prompts-dir")
                .value_name("DIR")
                .help("Directory containing the prompt template files"),
        )
        .get_matches();

    let input_path = PathBuf::from(matches.get_one::<String>("input").unwrap());

    let exit_code = match run(&matches, &input_path).await {
        Ok(audit_log) => {
            audit::record_run(&audit_log, RunStatus::Success, &input_path);
            0
        }
        Err(failure) => {
            error!("{}", failure.message);
            eprintln!("[ERROR] {}", failure.message);
            audit::record_run(&failure.audit_log, RunStatus::Failure, &input_path);
            failure.exit_code
        }
    };

    std::process::exit(exit_code);
}

async fn run(matches: &ArgMatches, input_path: &Path) -> Result<PathBuf, CliFailure> {
    let mut config = Config::load().map_err(|e| CliFailure {
        exit_code: EXIT_CONFIG_ERROR,
        message: format!("Failed to load configuration: {:#}", e),
        audit_log: PathBuf::from("usage.log"),
    })?;

    if let Some(dir) = matches.get_one::<String>("prompts-dir") {
        config.defaults.prompts_dir = Some(dir.clone());
    }

    let audit_log = config.audit_log_path();
    let fail = |exit_code: i32, message: String| CliFailure {
        exit_code,
        message,
        audit_log: audit_log.clone(),
    };

    if !input_path.exists() {
        return Err(fail(
            EXIT_FILE_NOT_FOUND,
            format!("Input file not found: '{}'", input_path.display()),
        ));
    }

    let output_path = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| derive_output_path(input_path));

    info!("Step 1/4: reading log file {}", input_path.display());
    let raw_text = read_log_file(input_path).await.map_err(|e| {
        fail(
            EXIT_GENERAL_ERROR,
            format!("Failed to read '{}': {:#}", input_path.display(), e),
        )
    })?;

    if raw_text.trim().is_empty() {
        return Err(fail(
            EXIT_EMPTY_INPUT,
            format!(
                "Input file has no content to analyze: '{}'",
                input_path.display()
            ),
        ));
    }

    let signals = scan_error_signals(&raw_text);
    if signals.is_empty() {
        info!("No obvious error keywords found in the input");
    } else {
        info!("Detected error signals: {}", signals.join(", "));
    }

    info!("Step 2/4: analyzing log via the completion service (this may take a while)");
    let triage = LogTriage::with_config(config);
    let provider = matches.get_one::<String>("provider").map(String::as_str);
    let api_key = matches.get_one::<String>("api-key").map(String::as_str);
    let result = triage
        .analyze_text(&raw_text, provider, api_key)
        .await
        .map_err(|e| {
            let exit_code = match e.downcast_ref::<SetupError>() {
                Some(SetupError::MissingApiKey { .. }) => EXIT_AUTH_ERROR,
                Some(SetupError::Client(_)) => EXIT_API_ERROR,
                Some(SetupError::Prompts(_)) | Some(SetupError::Config(_)) => EXIT_CONFIG_ERROR,
                None => EXIT_GENERAL_ERROR,
            };
            fail(exit_code, format!("{:#}", e))
        })?;

    info!("Step 3/4: formatting the incident report");
    let report = render_report(&result, &input_path.to_string_lossy());

    info!("Step 4/4: writing report to {}", output_path.display());
    std::fs::write(&output_path, report).map_err(|e| {
        fail(
            EXIT_GENERAL_ERROR,
            format!("Failed to write report to '{}': {}", output_path.display(), e),
        )
    })?;

    println!("Report written to {}", output_path.display());
    Ok(audit_log)
}

/// Default report location: `<stem>_report.md` alongside the input file.
fn derive_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    let file_name = format!("{}_report.md", stem);
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_output_path_with_directory() {
        let output = derive_output_path(Path::new("/var/log/app.log"));
        assert_eq!(output, PathBuf::from("/var/log/app_report.md"));
    }

    #[test]
    fn test_derive_output_path_bare_file() {
        let output = derive_output_path(Path::new("app.log"));
        assert_eq!(output, PathBuf::from("app_report.md"));
    }

    #[test]
    fn test_derive_output_path_without_extension() {
        let output = derive_output_path(Path::new("logs/incident"));
        assert_eq!(output, PathBuf::from("logs/incident_report.md"));
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            EXIT_GENERAL_ERROR,
            EXIT_FILE_NOT_FOUND,
            EXIT_EMPTY_INPUT,
            EXIT_AUTH_ERROR,
            EXIT_API_ERROR,
            EXIT_CONFIG_ERROR,
        ];
        let unique: std::collections::HashSet<i32> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
