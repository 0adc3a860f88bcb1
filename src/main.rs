mod anthropic;
mod classify;
mod command;
mod context;
mod hook;
mod refine;
mod settings;
mod types;

use anthropic::AnthropicProvider;
use clap::Parser;
use hook::{EXIT_OK, Hook};
use settings::Settings;
use std::env;
use std::io;
use std::path::PathBuf;
use std::process;

/// `UserPromptSubmit` hook: asks a small model for a short clarifying note
/// and prints it for the host to prepend to the prompt.
#[derive(Debug, Parser)]
#[command(name = "prompt-refiner", version)]
struct Cli {
    /// Project root to collect context from.
    #[arg(long, env = "CLAUDE_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Print the collected project context and exit.
    #[arg(long)]
    show_context: bool,
}

impl Cli {
    /// Parse arguments. Bad arguments must not fail the hook, so they fall
    /// back to the environment alone.
    fn parse_lenient() -> Self {
        match Cli::try_parse() {
            Ok(cli) => cli,
            Err(err) if !err.use_stderr() => {
                let _ = err.print();
                process::exit(EXIT_OK);
            }
            Err(err) => {
                eprintln!(
                    "prompt-refiner: ignoring all arguments ({}); \
                     using CLAUDE_PROJECT_DIR or the working directory",
                    err.kind()
                );
                Cli {
                    project_dir: env::var_os("CLAUDE_PROJECT_DIR").map(PathBuf::from),
                    show_context: false,
                }
            }
        }
    }

    fn project_dir(&self) -> PathBuf {
        self.project_dir
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn main() {
    let cli = Cli::parse_lenient();
    let project_dir = cli.project_dir();

    let settings = Settings::load(&project_dir).unwrap_or_else(|err| {
        eprintln!("prompt-refiner: {err:#}; using defaults");
        Settings::defaults_for(&project_dir)
    });

    if cli.show_context {
        println!("{}", context::collect(&project_dir, &settings));
        process::exit(EXIT_OK);
    }

    let hook = Hook::new(&project_dir, &settings);
    let code = hook.run(
        &mut io::stdin().lock(),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
        AnthropicProvider::from_env,
    );
    process::exit(code);
}
