use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use logic_vm::{
    BuildingRef, ExecutorConfig, LogicExecutor, Object, Program, Team, Value,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod world;

use world::{DisplayBlock, HeadlessWorld, LinkedBlock, MemoryBlock, MessageBlock};

/// Logic Run - headless logic processor runner
#[derive(Parser)]
#[command(name = "logic-run")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run logic processor program images without a game world", long_about = "Logic Run\n\nLoads a JSON program image and steps it one instruction per tick:\n  - Links a memory cell, a message block and a display\n  - Prints the flushed message, memory and variables afterwards\n  - Validates and lists program images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program image
    Run(RunArgs),
    /// Validate a program image without running it
    Check {
        /// Path to the program image
        file: PathBuf,
    },
    /// List the instructions and variables of a program image
    Disassemble {
        /// Path to the program image
        file: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to the program image
    file: PathBuf,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 1000)]
    ticks: u64,

    /// Cells in the linked memory block
    #[arg(long, default_value_t = 64)]
    memory_size: usize,

    /// Suppress graphics output
    #[arg(long)]
    headless: bool,

    /// Team of the processor
    #[arg(long, default_value_t = 1)]
    team: u8,

    /// Executor configuration as JSON
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Print every variable after the run
    #[arg(long)]
    dump_vars: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logic_run=info")))
        .with(fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_command(args),
        Commands::Check { file } => check_command(&file),
        Commands::Disassemble { file } => disassemble_command(&file),
    }
}

fn load_program(path: &Path) -> Result<Program> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading program image '{}'", path.display()))?;
    Program::from_json(&json).with_context(|| format!("loading program image '{}'", path.display()))
}

fn load_config(args: &RunArgs) -> Result<ExecutorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config '{}'", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("parsing config '{}'", path.display()))?
        }
        None => ExecutorConfig::default(),
    };
    config.headless |= args.headless;
    Ok(config)
}

fn run_command(args: RunArgs) -> Result<()> {
    let program = load_program(&args.file)?;
    if program.is_empty() {
        bail!("program image '{}' has no instructions", args.file.display());
    }
    let config = load_config(&args)?;
    let team = Team(args.team);

    // Links in link order: cell1, message1, display1
    let memory = Rc::new(LinkedBlock {
        memory: Some(MemoryBlock::new(args.memory_size)),
        ..LinkedBlock::new(team, 8.0)
    });
    let message = Rc::new(LinkedBlock {
        message: Some(MessageBlock::default()),
        ..LinkedBlock::new(team, 16.0)
    });
    let display = Rc::new(LinkedBlock {
        display: Some(DisplayBlock::new(config.display_capacity)),
        ..LinkedBlock::new(team, 24.0)
    });
    let processor = BuildingRef::from(Rc::new(LinkedBlock::new(team, 0.0)));

    let mut exec = LogicExecutor::new(config);
    exec.set_team(team);
    exec.bind_self(processor);
    exec.set_links(vec![
        Some(BuildingRef::from(Rc::clone(&memory))),
        Some(BuildingRef::from(Rc::clone(&message))),
        Some(BuildingRef::from(Rc::clone(&display))),
    ]);
    exec.load(program);

    let mut world = HeadlessWorld::new();
    info!(ticks = args.ticks, "running");
    for _ in 0..args.ticks {
        exec.advance(&mut world);
        world.tick();
    }
    debug!(counter = exec.counter(), "stopped");

    if let Some(block) = &message.message {
        println!("message: {}", block.text());
    }
    if !exec.buffers().text().is_empty() {
        println!("unflushed: {}", exec.buffers().text());
    }
    if let Some(block) = &memory.memory {
        let used: Vec<String> = block
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, v)| format!("{}={}", i, v))
            .collect();
        println!("memory: [{}]", used.join(", "));
    }
    if let Some(block) = &display.display {
        println!("display: {} commands", block.commands().len());
    }
    println!("counter: {}", exec.counter());

    if args.dump_vars {
        for var in exec.variables().iter() {
            println!("  {} = {}", var.name, format_value(&var.value));
        }
    }
    Ok(())
}

fn check_command(path: &Path) -> Result<()> {
    let program = load_program(path)?;
    println!("✓ '{}' is valid", path.display());
    println!(
        "  {} instructions, {} variables",
        program.len(),
        program.variables().len()
    );
    Ok(())
}

fn disassemble_command(path: &Path) -> Result<()> {
    let program = load_program(path)?;

    println!("variables:");
    for (i, var) in program.variables().iter().enumerate() {
        let kind = if var.constant { "const" } else { "var" };
        println!("  {:>4} {:<5} {} = {}", i, kind, var.name, format_value(&var.value));
    }

    println!("instructions:");
    let mut exec = LogicExecutor::default();
    exec.load(program);
    for (i, instruction) in exec.instructions().iter().enumerate() {
        println!("  {:>4} {:?}", i, instruction);
    }
    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::Object(None) => "null".to_string(),
        Value::Object(Some(Object::Text(text))) => format!("{:?}", text),
        Value::Object(Some(obj)) => format!("{:?}", obj),
    }
}
