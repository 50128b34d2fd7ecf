use std::error::Error;
use std::ffi::OsString;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use sumomo::dictionary::{SourceEncoding, SourceFormat, SystemDictionaryBuilder};

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// IPADIC layout with exactly nine feature columns.
    Ipa,
    /// Generic MeCab layout with any number of feature columns.
    Mecab,
}

impl From<Format> for SourceFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Ipa => Self::Ipa,
            Format::Mecab => Self::Generic,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Encoding {
    Utf8,
    Eucjp,
    Sjis,
    Jis,
}

impl From<Encoding> for SourceEncoding {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Utf8 => Self::Utf8,
            Encoding::Eucjp => Self::EucJp,
            Encoding::Sjis => Self::ShiftJis,
            Encoding::Jis => Self::Iso2022Jp,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "builder",
    about = "A program to compile a MeCab source directory into a system dictionary."
)]
struct Args {
    /// Layout of the source files.
    #[clap(value_enum)]
    format: Format,

    /// Source directory holding *.csv, matrix.def, char.def, and unk.def.
    #[clap(long)]
    mecab: PathBuf,

    /// Output path, a directory of members or a zip file with `-z`.
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    /// Writes the dictionary as a single zip file.
    #[clap(short = 'z', long)]
    zip: bool,

    /// Encoding of the source files.
    #[clap(long, value_enum, default_value = "utf8")]
    encoding: Encoding,
}

/// Long options that are also accepted with a single dash, as in MeCab tools.
const SINGLE_DASH_OPTIONS: [&str; 3] = ["mecab", "output", "encoding"];

/// Rewrites `-mecab`, `-output`, and `-encoding` (also in the `-name=value`
/// form) into their double-dash spellings.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(s) = arg.to_str() else {
                return arg;
            };
            let Some(body) = s.strip_prefix('-').filter(|b| !b.starts_with('-')) else {
                return arg;
            };
            let name = body.split_once('=').map_or(body, |(name, _)| name);
            if SINGLE_DASH_OPTIONS.contains(&name) {
                OsString::from(format!("-{s}"))
            } else {
                arg
            }
        })
        .collect()
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let output = args.output.unwrap_or_else(|| {
        let name = format!("sumomo-{:?}", args.format).to_lowercase();
        PathBuf::from(if args.zip { format!("{name}.zip") } else { name })
    });

    eprintln!("Compiling the system dictionary...");
    tracing::info!(source = %args.mecab.display(), "compiling");
    let start = Instant::now();
    let dict = SystemDictionaryBuilder::new()
        .format(args.format.into())
        .encoding(args.encoding.into())
        .build_from_dir(&args.mecab)?;
    eprintln!("{} seconds", start.elapsed().as_secs_f64());

    eprintln!("Writing the system dictionary...: {}", output.display());
    if args.zip {
        dict.write(File::create(&output)?)?;
    } else {
        dict.write_dir(&output)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let msg = e.to_string();
            let line = msg.lines().next().unwrap_or_default();
            if line.starts_with("error:") {
                eprintln!("{line}");
            } else {
                eprintln!("error: {line}");
            }
            return ExitCode::FAILURE;
        }
    };

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

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(normalize_args(args.iter().map(OsString::from)))
    }

    #[test]
    fn test_single_dash_options() {
        let args = parse(&[
            "builder", "ipa", "-mecab", "src", "-z", "-output", "out.zip", "-encoding", "eucjp",
        ])
        .unwrap();
        assert!(matches!(args.format, Format::Ipa));
        assert_eq!(args.mecab, PathBuf::from("src"));
        assert_eq!(args.output, Some(PathBuf::from("out.zip")));
        assert!(args.zip);
        assert!(matches!(args.encoding, Encoding::Eucjp));
    }

    #[test]
    fn test_single_dash_with_value() {
        let args = parse(&["builder", "mecab", "-mecab=src", "-output=out"]).unwrap();
        assert!(matches!(args.format, Format::Mecab));
        assert_eq!(args.mecab, PathBuf::from("src"));
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert!(!args.zip);
    }

    #[test]
    fn test_double_dash_options() {
        let args = parse(&["builder", "ipa", "--mecab", "src", "-o", "out"]).unwrap();
        assert_eq!(args.mecab, PathBuf::from("src"));
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert!(matches!(args.encoding, Encoding::Utf8));
    }

    #[test]
    fn test_other_args_untouched() {
        let args = normalize_args(["builder", "-z", "-o", "-", "--mecab"].map(OsString::from));
        assert_eq!(args, ["builder", "-z", "-o", "-", "--mecab"].map(OsString::from));
    }

    #[test]
    fn test_missing_source() {
        let e = parse(&["builder", "ipa", "-z"]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MissingRequiredArgument);
    }
}
