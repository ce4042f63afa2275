//! Rigel cycle-accurate simulator CLI.
//!
//! This binary provides a single entry point for running assembly programs. It performs:
//! 1. **Assembly:** Reads a `.s` source file and assembles it into a program image.
//! 2. **Configuration:** Starts from the built-in defaults, optionally overridden by a JSON file.
//! 3. **Simulation:** Runs until every thread halts or the cycle limit, then prints statistics.

use std::path::PathBuf;
use std::{fs, process};

use clap::{ArgAction, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rigel_core::isa::asm;
use rigel_core::{Config, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "rigel",
    author,
    version,
    about = "Rigel cycle-accurate many-core simulator",
    long_about = "Assemble and run a program on the simulated Rigel machine.\n\nExamples:\n  rigel run programs/fib.s\n  rigel run programs/tasks.s --config cluster.json --stats-json stats.json\n  rigel assemble programs/fib.s"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an assembly program.
    Run {
        /// Assembly source file.
        program: PathBuf,

        /// JSON configuration file; missing fields take their defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override `general.max_cycles`.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Write the statistics report as JSON to this file.
        #[arg(long)]
        stats_json: Option<PathBuf>,

        /// Statistics sections to print (summary, core, mix, branch, stall, memory, tq, debug).
        #[arg(long, value_delimiter = ',')]
        sections: Vec<String>,
    },

    /// Assemble a program and print its image without running it.
    Assemble {
        /// Assembly source file.
        program: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            program,
            config,
            max_cycles,
            stats_json,
            sections,
        } => cmd_run(&program, config.as_deref(), max_cycles, stats_json.as_deref(), &sections),
        Commands::Assemble { program } => cmd_assemble(&program),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_or_exit(path: &std::path::Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error: cannot read {}: {e}", path.display());
        process::exit(1);
    })
}

fn cmd_assemble(path: &std::path::Path) {
    let source = read_or_exit(path);
    let program = asm::assemble(&source).unwrap_or_else(|e| {
        eprintln!("{}:{e}", path.display());
        process::exit(1);
    });
    println!("entry {:#010x}", program.entry);
    for (i, inst) in program.text.iter().enumerate() {
        println!("{:#010x}  {inst}", i * 4);
    }
    for (addr, word) in &program.data {
        println!(".word {addr:#010x} {word:#010x}");
    }
}

/// Assembles and runs `path`. On a fatal error, dumps core state and statistics and exits with code 1.
fn cmd_run(
    path: &std::path::Path,
    config_path: Option<&std::path::Path>,
    max_cycles: Option<u64>,
    stats_json: Option<&std::path::Path>,
    sections: &[String],
) {
    let mut config = match config_path {
        Some(p) => Config::from_json(&read_or_exit(p)).unwrap_or_else(|e| {
            eprintln!("Error: {}: {e}", p.display());
            process::exit(1);
        }),
        None => Config::default(),
    };
    if let Some(limit) = max_cycles {
        config.general.max_cycles = limit;
    }

    let source = read_or_exit(path);
    let program = asm::assemble(&source).unwrap_or_else(|e| {
        eprintln!("{}:{e}", path.display());
        process::exit(1);
    });
    info!(
        program = %path.display(),
        instructions = program.text.len(),
        cores = config.system.num_cores,
        threads = config.system.threads_per_core,
        "loaded program"
    );

    let mut sim = Simulator::new(config, program).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    let result = sim.run();
    print!("{}", sim.output());

    match result {
        Ok(summary) => {
            if !summary.halted {
                println!("\n[*] Cycle limit reached after {} cycles", summary.cycles);
            }
            sim.stats().print_sections(sections);
            write_stats_json(&sim, stats_json);
        }
        Err(e) => {
            error!(cycle = sim.cycle(), "fatal: {e}");
            eprintln!("\n[!] FATAL: {e}");
            eprint!("{}", sim.dump_state());
            sim.stats().print_sections(sections);
            write_stats_json(&sim, stats_json);
            process::exit(1);
        }
    }
}

fn write_stats_json(sim: &Simulator, path: Option<&std::path::Path>) {
    let Some(path) = path else {
        return;
    };
    let written = sim
        .stats()
        .to_json()
        .map_err(|e| e.to_string())
        .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
    if let Err(e) = written {
        eprintln!("Error: cannot write {}: {e}", path.display());
    }
}
