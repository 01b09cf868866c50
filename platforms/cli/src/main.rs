mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use turing_engine::{
    lint, Execution, ExecutionStep, Limits, Program, ProgramLoader, ProgramManager,
    SimulationResponse, Step, TuringMachine,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// A program file to execute (`.tur` or `.json` request)
    #[clap(short, long, conflicts_with = "example")]
    program: Option<PathBuf>,

    /// A built-in program to execute, by name or index
    #[clap(short, long)]
    example: Option<String>,

    /// Replacement content for the tapes, in order; `_` is the blank
    #[clap(short, long)]
    input: Vec<String>,

    /// Override the program's step budget
    #[clap(short, long)]
    max_steps: Option<usize>,

    /// Run without repeated-configuration detection
    #[clap(long)]
    no_loop_detection: bool,

    /// Abort if the run takes longer than this many milliseconds
    #[clap(long)]
    timeout_ms: Option<u64>,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print the result as a JSON response document
    #[clap(long)]
    json: bool,

    /// Print static-analysis findings for the program and exit
    #[clap(long)]
    lint: bool,

    /// List the built-in programs and exit
    #[clap(short, long)]
    list: bool,

    /// Log engine diagnostics at debug level
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if cli.list {
        list_programs();
        return Ok(());
    }

    let program = load(&cli)?;

    if cli.lint {
        for diagnostic in lint(&program) {
            println!("{diagnostic}");
        }
        return Ok(());
    }

    let execution = run(program, cli.timeout_ms)?;

    if cli.json {
        let response = SimulationResponse::from(execution);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if cli.debug {
        for step in &execution.steps {
            print_step(step);
        }
        println!();
    }

    println!("{} ({} steps)", execution.message(), execution.total_steps);
    println!("{}", execution.final_tapes().join("\n"));

    Ok(())
}

/// Builds the program to run from the command line options.
fn load(cli: &Cli) -> Result<Program> {
    let mut program = match (&cli.program, &cli.example) {
        (Some(path), _) => ProgramLoader::load_program(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        (None, Some(example)) => match example.parse::<usize>() {
            Ok(index) => ProgramManager::get_program_by_index(index)?,
            Err(_) => ProgramManager::get_program_by_name(example)?,
        },
        (None, None) => bail!("Either --program or --example is required"),
    };

    if cli.input.len() > program.tapes.len() {
        bail!(
            "{} inputs given, but '{}' has {} tapes",
            cli.input.len(),
            program.name,
            program.tapes.len()
        );
    }

    let blank = program.blank;
    for (tape, input) in program.tapes.iter_mut().zip(&cli.input) {
        *tape = input
            .chars()
            .map(|c| if c == '_' { blank } else { c })
            .collect();
    }

    if let Some(max_steps) = cli.max_steps {
        program.max_steps = max_steps;
    }

    if cli.no_loop_detection {
        program.detect_loops = false;
    }

    Limits::default().check(&program)?;

    Ok(program)
}

/// Runs `program` to completion, giving up once `timeout_ms` has passed.
fn run(program: Program, timeout_ms: Option<u64>) -> Result<Execution> {
    let mut machine = TuringMachine::new(program)?;

    let Some(timeout_ms) = timeout_ms else {
        return Ok(machine.execute());
    };

    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while let Step::Continue = machine.step() {
        if start.elapsed() >= timeout {
            bail!(
                "Timed out after {timeout_ms} ms ({} steps, state {})",
                machine.step_count(),
                machine.state()
            );
        }
    }

    let mut execution = machine.execute();
    execution.elapsed = start.elapsed();

    Ok(execution)
}

fn print_step(step: &ExecutionStep) {
    println!(
        "Step: {}, State: {}, Tapes: [{}], Heads: {:?}, Read: {:?} => {}",
        step.step_number,
        step.current_state,
        step.tape_contents.join(", "),
        step.head_positions,
        step.symbols_read,
        step.action_taken
    );
}

fn list_programs() {
    for (index, name) in ProgramManager::list_program_names().iter().enumerate() {
        match ProgramManager::get_program_info(index) {
            Ok(info) => println!(
                "{index}: {name} ({} tapes, {} rules) [{}]",
                info.num_tapes,
                info.transition_count,
                info.initial_tapes.join(" | ")
            ),
            Err(_) => println!("{index}: {name}"),
        }
    }
}
