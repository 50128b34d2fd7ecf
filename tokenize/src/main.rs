use std::error::Error;
use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use sumomo::{Dictionary, Mode, Tokenizer, UserDict};

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Normal,
    Search,
    Extended,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Normal => Self::Normal,
            ModeArg::Search => Self::Search,
            ModeArg::Extended => Self::Extended,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(name = "tokenize", about = "A program to tokenize lines from stdin.")]
struct Args {
    /// System dictionary, a zip file or a directory of members.
    #[clap(short = 'i', long)]
    dict: PathBuf,

    /// User dictionary in CSV.
    #[clap(short = 'u', long)]
    user_dict: Option<PathBuf>,

    /// Segmentation mode.
    #[clap(short = 'm', long, value_enum, default_value = "normal")]
    mode: ModeArg,

    /// Prints surfaces separated by spaces.
    #[clap(short = 'w', long)]
    wakati: bool,

    /// Omits the EOS line after each sentence.
    #[clap(long)]
    omit_bos_eos: bool,
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    eprintln!("Loading the dictionary...");
    let start = Instant::now();
    let dict = Dictionary::from_path(&args.dict)?;
    let mut tokenizer = Tokenizer::new(dict).omit_bos_eos(true);
    if let Some(path) = &args.user_dict {
        tokenizer = tokenizer.user_dict(UserDict::from_path(path)?);
    }
    tracing::info!(path = %args.dict.display(), seconds = start.elapsed().as_secs_f64(), "loaded");
    eprintln!("Ready to tokenize :)");

    let mode = Mode::from(args.mode);
    let mut out = BufWriter::new(std::io::stdout().lock());

    #[allow(clippy::significant_drop_in_scrutinee)]
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if args.wakati {
            let tokens = tokenizer.analyze(&line, mode);
            let surfaces: Vec<_> = tokens.iter().map(|t| t.surface()).collect();
            writeln!(out, "{}", surfaces.join(" "))?;
            continue;
        }
        for token in tokenizer.analyze(&line, mode) {
            writeln!(out, "{token}")?;
        }
        if !args.omit_bos_eos {
            writeln!(out, "EOS")?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
