// mipascal: mini-Pascal to MIPS32 compiler

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use mipascal::{CompileOptions, compile, parse};

#[derive(Parser, Debug)]
#[command(version, about = "Compile mini-Pascal to MIPS32 assembly", long_about = None)]
struct Args {
    /// Source file to compile
    input: PathBuf,

    /// Write the assembly here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the syntax tree instead of assembly
    #[arg(long)]
    tree: bool,

    /// Skip constant folding
    #[arg(long)]
    no_fold: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", args.input.display(), e);
            std::process::exit(1);
        }
    };
    info!("compiling {}", args.input.display());

    let text = if args.tree {
        match parse(&source) {
            Ok((program, _)) => program.to_string(),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    } else {
        let options = CompileOptions { fold: !args.no_fold };
        match compile(&source, &options) {
            Ok(assembly) => assembly,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    };

    match &args.output {
        Some(path) => fs::write(path, text)?,
        None => print!("{}", text),
    }

    Ok(())
}
