#[macro_use]
extern crate clap;

use std::fs;
use std::path::{Path, PathBuf};

use clap::Arg;
use log::info;

#[derive(Debug)]
enum Error {
    Asm(tv_asm::Error),
    Io(std::io::Error, &'static str, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, action, path) => {
                write!(f, "{} \"{}\" failed: {}", action, path.display(), err)
            }
            Error::Asm(err) => write!(f, "{}", err),
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the assembly source file(s) to assemble as one linked image")
                .required(true)
                .multiple(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the .tv image file to write to"),
        )
        .arg(
            Arg::with_name("lib_path")
                .short("L")
                .long("lib-path")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .value_name("DIR")
                .help("Adds a directory to search for declared libraries"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Raises the log level (-v for info, -vv for debug)"),
        )
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));

    let inputs: Vec<&str> = matches.values_of("INPUT").unwrap().collect();
    let output = matches.value_of("output");
    let lib_paths: Vec<PathBuf> = matches
        .values_of("lib_path")
        .map(|vals| vals.map(PathBuf::from).collect())
        .unwrap_or_default();

    if let Err(err) = tvasm(&inputs, output, &lib_paths) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn tvasm(inputs: &[&str], output: Option<&str>, lib_paths: &[PathBuf]) -> Result<(), Error> {
    let mut sources = Vec::with_capacity(inputs.len());
    for input in inputs {
        let path = Path::new(input);
        let source = fs::read_to_string(path)
            .map_err(|err| Error::Io(err, "reading input file", path.to_owned()))?;
        sources.push(source);
    }

    info!("assembling {} translation unit(s)", sources.len());
    let source_refs: Vec<&str> = sources.iter().map(String::as_str).collect();
    let image = tv_asm::assemble_units(&source_refs, lib_paths).map_err(Error::Asm)?;

    let first_input = Path::new(inputs[0]);
    let output_path: PathBuf = output
        .map(PathBuf::from)
        .unwrap_or_else(|| first_input.with_extension("tv"));

    fs::write(&output_path, image.write())
        .map_err(|err| Error::Io(err, "writing output file", output_path.clone()))?;
    info!("wrote {}", output_path.display());

    Ok(())
}
