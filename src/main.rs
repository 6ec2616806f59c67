use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use statec::emit::{Emitter, Strategy};
use statec::merge::{self, MergeOutcome};
use statec::StateMachine;

/// Read a DOT state-machine description and generate the C dispatch
/// code and declarations header for it.
///
/// The `.c` artifact is merged: everything before the generated-code
/// marker survives regeneration. The header is only ever created, never
/// overwritten.
#[derive(Parser)]
struct Args {
    /// Input description file.
    file: PathBuf,
    /// How transitions of one state are tested against each other.
    #[arg(long, value_enum, default_value_t = StrategyArg::FirstMatch)]
    strategy: StrategyArg,
    /// Generate `update_state_isr(Event, uint8_t)` and have
    /// `update_state` delegate to it.
    #[arg(long)]
    isr_arg: bool,
    /// Where the declarations header goes, relative to the input
    /// file's directory.
    #[arg(long, default_value = "../include")]
    include_dir: PathBuf,
}

#[derive(ValueEnum, Clone, Copy)]
enum StrategyArg {
    /// if / else-if chain: the first matching transition fires.
    FirstMatch,
    /// Independent if blocks: every matching transition fires.
    Independent,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::FirstMatch => Strategy::FirstMatchChain,
            StrategyArg::Independent => Strategy::IndependentConditions,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    // Usage errors exit 1, not clap's default 2; help and version are
    // not errors.
    let args = Args::try_parse().unwrap_or_else(|error| {
        let _ = error.print();
        std::process::exit(match error.use_stderr() {
            true => 1,
            false => 0,
        });
    });
    run(args)
}

fn run(args: Args) -> anyhow::Result<()> {
    let input = fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read input file `{}`", args.file.display()))?;
    let machine = StateMachine::from_input(&input)?;

    let base = args
        .file
        .file_stem()
        .context("input path has no file name")?
        .to_string_lossy();
    let dir = args.file.parent().unwrap_or(Path::new("."));
    let source_path = dir.join(format!("{base}.c"));
    let header_name = format!("{base}.h");
    let header_path = dir.join(&args.include_dir).join(&header_name);

    let emitter = Emitter::new(&machine)
        .strategy(args.strategy.into())
        .with_isr_arg(args.isr_arg);

    match merge::merge_generated(&source_path, &emitter.dispatch())? {
        MergeOutcome::Created => println!("created `{}`", source_path.display()),
        MergeOutcome::Replaced => {
            println!("updated generated region of `{}`", source_path.display())
        }
        MergeOutcome::Appended => {
            println!("appended generated region to `{}`", source_path.display())
        }
    }
    match merge::write_header_if_absent(&header_path, &emitter.header(&header_name))? {
        true => println!("created `{}`", header_path.display()),
        false => println!("left existing `{}` untouched", header_path.display()),
    }
    Ok(())
}
