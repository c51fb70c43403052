use agent_edit::config::{self, EditConfig, CONFIG_FILE_NAME};
use agent_edit::diff;
use agent_edit::{
    EditEngine, EditOperation, EditRequest, EditResult, ErrorResponse, ToolContext, ToolError,
    ToolRegistry,
};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "agent-edit")]
#[command(about = "Atomic multi-step exact-string file editing", long_about = None)]
#[command(version)]
struct Cli {
    /// Workspace root that edited paths must stay inside
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Config file (defaults to agent-edit.toml in the workspace root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long, global = true)]
    diff: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace one exact string in a file (empty --old creates the file)
    Edit {
        /// File to edit
        #[arg(short, long)]
        file: PathBuf,

        /// Exact text to replace
        #[arg(long, allow_hyphen_values = true)]
        old: String,

        /// Replacement text
        #[arg(long, allow_hyphen_values = true)]
        new: String,

        /// Replace every occurrence
        #[arg(long)]
        replace_all: bool,

        /// Exact number of occurrences that must match
        #[arg(long, value_name = "N")]
        expected: Option<usize>,
    },

    /// Apply a multi-edit request from a JSON or TOML file
    Apply {
        /// Request file (.json or .toml)
        request: PathBuf,
    },

    /// Invoke a registered tool with a JSON input and print its JSON response
    Tool {
        /// Tool name (see `agent-edit tools`)
        name: String,

        /// JSON input; read from stdin when omitted
        #[arg(short, long)]
        input: Option<String>,
    },

    /// List registered tools and their input schemas
    Tools,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let workspace = resolve_workspace(cli.workspace.as_deref(), cli.config.as_deref())?;
    let config = load_config(cli.config.as_deref(), &workspace.root)?;
    let root = workspace.root_with(&config);
    log::debug!("workspace root: {}", root.display());

    let guard = config
        .guard(&root)
        .with_context(|| format!("invalid workspace root {}", root.display()))?;
    let engine = EditEngine::new(config.engine_options());
    let context = ToolContext::new(guard, engine).dry_run(cli.dry_run);
    let show_diff = cli.diff || cli.dry_run;

    match cli.command {
        Commands::Edit {
            file,
            old,
            new,
            replace_all,
            expected,
        } => {
            let operation = EditOperation {
                old_string: old,
                new_string: new,
                replace_all,
                expected_replacements: expected,
            };
            Ok(report(context.run(EditRequest::single(file, operation)), show_diff))
        }

        Commands::Apply { request } => {
            let request = config::request_from_path(&request)?;
            println!(
                "Applying {} operation(s) to {}",
                request.operations.len(),
                request.path.display()
            );
            Ok(report(context.run(request), show_diff))
        }

        Commands::Tool { name, input } => cmd_tool(context, &name, input),

        Commands::Tools => {
            cmd_tools(context);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initialize env_logger on stderr. `AGENT_EDIT_LOG` overrides the `-v` level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("AGENT_EDIT_LOG", level))
        .format_timestamp(None)
        .init();
}

/// Workspace root candidate, before any config file has been read.
struct Workspace {
    root: PathBuf,
    /// Set by --workspace or AGENT_EDIT_WORKSPACE, which outrank the config file
    explicit: bool,
    config_dir: Option<PathBuf>,
}

impl Workspace {
    fn root_with(&self, config: &EditConfig) -> PathBuf {
        match (&config.workspace.root, self.explicit) {
            (Some(root), false) => match &self.config_dir {
                Some(dir) => dir.join(root),
                None => self.root.join(root),
            },
            _ => self.root.clone(),
        }
    }
}

/// Resolve workspace path
///
/// Priority order:
/// 1. Explicit --workspace flag
/// 2. AGENT_EDIT_WORKSPACE environment variable
/// 3. `workspace.root` from the config file
/// 4. Current directory
fn resolve_workspace(cli_workspace: Option<&Path>, config: Option<&Path>) -> Result<Workspace> {
    let config_dir = config
        .and_then(Path::parent)
        .map(|dir| if dir.as_os_str().is_empty() { Path::new(".") } else { dir })
        .map(Path::to_path_buf);

    if let Some(path) = cli_workspace {
        if !path.is_dir() {
            anyhow::bail!("workspace is not a directory: {}", path.display());
        }
        return Ok(Workspace {
            root: path.to_path_buf(),
            explicit: true,
            config_dir,
        });
    }

    if let Ok(env_path) = env::var("AGENT_EDIT_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.is_dir() {
            return Ok(Workspace {
                root: path,
                explicit: true,
                config_dir,
            });
        }
        eprintln!(
            "{}",
            format!("Warning: AGENT_EDIT_WORKSPACE is set but is not a directory: {env_path}")
                .yellow()
        );
    }

    let cwd = env::current_dir().context("cannot determine current directory")?;
    Ok(Workspace {
        root: cwd,
        explicit: false,
        config_dir,
    })
}

fn load_config(explicit: Option<&Path>, workspace: &Path) -> Result<EditConfig> {
    if let Some(path) = explicit {
        return Ok(config::load_from_path(path)?);
    }

    let default_path = workspace.join(CONFIG_FILE_NAME);
    if default_path.is_file() {
        log::debug!("loading config from {}", default_path.display());
        return Ok(config::load_from_path(&default_path)?);
    }

    Ok(EditConfig::default())
}

fn report(outcome: Result<EditResult, ToolError>, show_diff: bool) -> ExitCode {
    match outcome {
        Ok(result) => {
            if show_diff && !result.diff.is_empty() {
                diff::display(&result.diff);
            }
            println!("{}", result.message.green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            let response = ErrorResponse::from(&e);
            let label = match response.error_kind {
                Some(kind) => format!("error[{kind}]:"),
                None => "error:".to_string(),
            };
            eprintln!("{} {}", label.red().bold(), response.error_message);
            ExitCode::FAILURE
        }
    }
}

fn cmd_tool(context: ToolContext, name: &str, input: Option<String>) -> Result<ExitCode> {
    let raw = match input {
        Some(raw) => raw,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read tool input from stdin")?;
            buf
        }
    };

    let response = match serde_json::from_str::<Value>(&raw) {
        Ok(input) => ToolRegistry::with_defaults(context).dispatch(name, &input),
        Err(e) => serde_json::to_value(ErrorResponse {
            error_message: format!("Invalid JSON input: {e}"),
            error_kind: None,
        })?,
    };

    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.get("error_message").is_some() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_tools(context: ToolContext) {
    let registry = ToolRegistry::with_defaults(context);

    println!("{}", "Available tools:".bold());
    for definition in registry.definitions() {
        println!();
        println!(
            "  {}",
            definition["name"].as_str().unwrap_or_default().cyan().bold()
        );
        println!(
            "    {}",
            definition["description"].as_str().unwrap_or_default()
        );
        let schema = serde_json::to_string_pretty(&definition["input_schema"])
            .unwrap_or_default()
            .replace('\n', "\n    ");
        println!("    {}", schema.dimmed());
    }
}
