//! starfish: command-line runner for *><> scripts.

use clap::Parser;
use starfish_cli::colors::{red, yellow};
use starfish_cli::config::{RunSection, StarfishConfig};
use starfish_cli::initial_stack::resolve_initial_stack;
use starfish_cli::view::{render_state, ViewOptions};
use starfish_cli::CliError;
use starfish_core::Codebox;
use starfish_vm::io::{ReaderInput, WriterOutput};
use starfish_vm::{DebugEvent, RunOutcome, VM};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "starfish", version, about = "Run a *><> (starfish) script")]
struct Cli {
    /// Path to the *><> script
    #[arg()]
    path: PathBuf,

    /// Initial stack (example: --stack "10 'olleh'")
    #[arg(short = 's', long, allow_hyphen_values = true)]
    stack: Option<String>,

    /// Output the codebox each tick
    #[arg(short = 'c', long = "output-codebox")]
    output_codebox: bool,

    /// Output the stack each tick
    #[arg(short = 'S', long = "output-stack")]
    output_stack: bool,

    /// Delay between ticks in milliseconds
    #[arg(short = 'd', long)]
    delay: Option<u64>,

    /// Seed for the random direction instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Fail once this many instructions have executed
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Reverse values moved by [ and ], like the fishlanguage.com interpreter
    #[arg(long)]
    compat: bool,

    /// Read settings from this file instead of searching for starfish.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> RunSection {
        RunSection {
            delay: self.delay,
            output_codebox: self.output_codebox.then_some(true),
            output_stack: self.output_stack.then_some(true),
            seed: self.seed,
            max_ticks: self.max_ticks,
            compatibility: self.compat.then_some(true),
            stack: None,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STARFISH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn stop_on_ctrlc() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("cannot install Ctrl-C handler: {}", e);
    }
    stop
}

fn run(cli: &Cli) -> Result<RunOutcome, CliError> {
    let file_config = match &cli.config {
        Some(path) => StarfishConfig::load_from(path)?,
        None => StarfishConfig::load()?,
    };
    let settings = file_config.run.overridden_by(cli.overrides());
    debug!(?settings, "resolved run settings");

    let initial = resolve_initial_stack(cli.stack.as_deref(), &settings)?;
    let codebox = Codebox::load(&cli.path)?;

    let mut vm = VM::with_stack(codebox, initial);
    vm.set_input(ReaderInput::new(std::io::stdin()));
    vm.set_output(WriterOutput::new(std::io::stdout()));
    vm.set_delay(Duration::from_millis(settings.delay.unwrap_or(0)));
    vm.set_compatibility(settings.compatibility.unwrap_or(false));
    if let Some(seed) = settings.seed {
        vm.set_seed(seed);
    }
    if let Some(limit) = settings.max_ticks {
        vm.set_tick_limit(limit);
    }
    vm.set_stop_signal(stop_on_ctrlc());

    let view = ViewOptions {
        codebox: settings.output_codebox.unwrap_or(false),
        stack: settings.output_stack.unwrap_or(false),
    };
    if view.is_enabled() {
        print!(
            "{}",
            render_state(view, vm.codebox(), vm.pointer(), vm.stacks())
        );
        vm.debug_callback = Some(Box::new(move |event: &DebugEvent<'_>| {
            if let DebugEvent::Tick {
                pointer,
                codebox,
                stacks,
                ..
            } = event
            {
                print!("{}", render_state(view, codebox, pointer, stacks));
            }
        }));
    }

    Ok(vm.run()?)
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(RunOutcome::Halted) => {}
        Ok(RunOutcome::Stopped) => {
            eprintln!("\n{} interrupted", yellow("warning:"));
            std::process::exit(130);
        }
        Err(e) => {
            eprintln!("{} {}", red("error:"), e);
            std::process::exit(1);
        }
    }
}
