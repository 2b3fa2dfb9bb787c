//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `vigil_core` linkage.
//! - Replay a script of host events against a stdout presenter.

use clap::Parser;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use vigil_core::{
    init_logging, CoordinatorConfig, IndicatorPresenter, IndicatorRequest, IndicatorResult,
    LogLevel, TaskCoordinator, VisibilityTracker,
};

const DEMO_SCRIPT: &str = "fg start:Backup:sync bg fg bg stop";

#[derive(Debug, Parser)]
#[command(
    name = "vigil",
    version,
    about = "Replay host visibility and task events against a stdout indicator"
)]
struct Cli {
    /// Steps to replay: fg, bg, start:<title>[:<category>], stop.
    /// Runs a built-in demo script when empty.
    #[arg(value_name = "STEP")]
    steps: Vec<Step>,

    /// Write rolling logs to this absolute directory.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<String>,

    /// Log level; defaults to debug in debug builds and info otherwise.
    #[arg(long, value_name = "LEVEL", requires = "log_dir")]
    log_level: Option<LogLevel>,
}

/// One scripted host event.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Foreground,
    Background,
    Start { title: String, category: String },
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StepParseError(String);

impl Display for StepParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown step `{}`; expected fg|bg|start:<title>[:<category>]|stop",
            self.0
        )
    }
}

impl Error for StepParseError {}

impl FromStr for Step {
    type Err = StepParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.splitn(3, ':');
        match parts.next().map(str::trim) {
            Some("fg") => Ok(Self::Foreground),
            Some("bg") => Ok(Self::Background),
            Some("stop") => Ok(Self::Stop),
            Some("start") => {
                let title = parts.next().unwrap_or_default().trim();
                if title.is_empty() {
                    return Err(StepParseError(value.to_string()));
                }
                Ok(Self::Start {
                    title: title.to_string(),
                    category: parts.next().unwrap_or_default().to_string(),
                })
            }
            _ => Err(StepParseError(value.to_string())),
        }
    }
}

struct StdoutPresenter;

impl IndicatorPresenter for StdoutPresenter {
    fn present(&self, request: &IndicatorRequest) -> IndicatorResult {
        println!("  -> present title={:?} category={}", request.title, request.category);
        Ok(())
    }

    fn withdraw(&self) -> IndicatorResult {
        println!("  -> withdraw");
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    println!("vigil_core ping={}", vigil_core::ping());
    println!("vigil_core version={}", vigil_core::core_version());

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.unwrap_or_else(LogLevel::build_default);
        init_logging(level.as_str(), log_dir)?;
    }

    let config = CoordinatorConfig::from_env()?;
    let tracker = VisibilityTracker::new();
    let coordinator = TaskCoordinator::new(tracker.clone(), Arc::new(StdoutPresenter), config);

    let steps = if cli.steps.is_empty() {
        demo_steps()?
    } else {
        cli.steps
    };

    for step in &steps {
        println!("{step:?}");
        match step {
            Step::Foreground => {
                tracker.enter_foreground();
            }
            Step::Background => {
                tracker.enter_background();
            }
            Step::Start { title, category } => coordinator.start(title, category),
            Step::Stop => coordinator.stop(),
        }
        println!(
            "  state phase={} active_tasks={}",
            coordinator.phase().as_str(),
            coordinator.active_tasks()
        );
    }
    Ok(())
}

fn demo_steps() -> Result<Vec<Step>, StepParseError> {
    DEMO_SCRIPT.split_whitespace().map(str::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::{demo_steps, Cli, Step};
    use clap::{CommandFactory, Parser};
    use vigil_core::LogLevel;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_start_with_and_without_category() {
        assert_eq!(
            "start:Backup:sync".parse::<Step>(),
            Ok(Step::Start {
                title: "Backup".to_string(),
                category: "sync".to_string(),
            })
        );
        assert_eq!(
            "start:Upload".parse::<Step>(),
            Ok(Step::Start {
                title: "Upload".to_string(),
                category: String::new(),
            })
        );
    }

    #[test]
    fn rejects_unknown_steps_and_blank_titles() {
        assert!("jump".parse::<Step>().is_err());
        assert!("start:".parse::<Step>().is_err());
    }

    #[test]
    fn demo_script_parses() {
        let steps = demo_steps().expect("demo script should parse");
        assert_eq!(steps.first(), Some(&Step::Foreground));
        assert_eq!(steps.last(), Some(&Step::Stop));
    }

    #[test]
    fn cli_collects_steps_and_log_options() {
        let cli = Cli::try_parse_from([
            "vigil",
            "--log-dir",
            "/tmp/vigil-logs",
            "--log-level",
            "warn",
            "bg",
            "start:Backup",
        ])
        .expect("arguments should parse");

        assert_eq!(cli.steps, vec![Step::Background, "start:Backup".parse().expect("step")]);
        assert_eq!(cli.log_level, Some(LogLevel::Warn));
        assert_eq!(cli.log_dir.as_deref(), Some("/tmp/vigil-logs"));
    }

    #[test]
    fn cli_rejects_bad_step() {
        assert!(Cli::try_parse_from(["vigil", "fg", "sideways"]).is_err());
    }
}
