//! The compiler CLI driver: a single `compile` command reading `.asn1`
//! module files and writing generated Rust source for every type
//! assignment reachable from them.
//!
//! Uses derive-style `clap` for argument parsing and `log`/`env_logger` for
//! `-v` tracing.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use asnpack_compiler::{AsnpackCompiler, CompileError};

#[derive(Parser, Debug)]
#[command(name = "asnpack-compiler", about = "Compiles ASN.1 module notation into asnpack packer programs and recipes")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enables tracing of module resolution and compile-stack activity.
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reads ASN.1 files, emitting compiled artefacts for every module in
    /// the `IMPORTS` closure of the given entry points.
    Compile {
        /// The main entry-point module, followed by any number of
        /// additional entry-point/dependency files.
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Adds a directory to the include search path (repeatable).
        #[arg(short = 'I', long = "include", value_name = "dir")]
        include: Vec<PathBuf>,

        /// Selects output language back-ends (repeatable). Only "rust" is
        /// implemented, and it is also the default when the flag is
        /// omitted, since it is the full supported set here.
        #[arg(short = 'l', long = "lang", value_name = "lang")]
        lang: Vec<String>,

        /// Requests canonical test-vector generation for the named cases
        /// (`[TypeName=][start-]end[,...]`). The spec's shape is validated;
        /// generation itself is not yet implemented.
        #[arg(short = 't', long = "test-vectors", value_name = "spec")]
        test_vectors: Option<String>,

        /// Directory generated `<module>.rs` files are written to. Defaults
        /// to the current directory.
        #[arg(short = 'o', long = "out-dir", value_name = "dir", default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { log::LevelFilter::Trace } else { log::LevelFilter::Info };
    env_logger::Builder::new().filter_level(level).init();

    match &cli.command {
        Command::Compile { files, include, lang, test_vectors, out_dir } => {
            run_compile(files, include, lang, test_vectors.as_deref(), out_dir)
        }
    }
}

fn run_compile(
    files: &[PathBuf],
    include: &[PathBuf],
    lang: &[String],
    test_vectors: Option<&str>,
    out_dir: &std::path::Path,
) -> ExitCode {
    if let Some(spec) = test_vectors {
        log::warn!("-t {spec:?} requested test-vector generation, which this driver does not yet implement");
    }

    log::info!("compiling {} entry point(s)", files.len());
    let mut compiler = AsnpackCompiler::new(files.to_vec());
    for dir in include {
        compiler = compiler.include_dir(dir.clone());
    }
    for requested in lang {
        compiler = compiler.language(requested.clone());
    }
    if let Some(spec) = test_vectors {
        compiler = compiler.test_vectors(spec.to_string());
    }

    let generated = match compiler.build() {
        Ok(generated) => generated,
        Err(err @ CompileError::UnsupportedLanguage { .. } | err @ CompileError::InvalidTestVectorSpec { .. }) => {
            log::error!("{err}");
            return ExitCode::from(1);
        }
        Err(err) => {
            log::error!("{err}");
            return ExitCode::from(2);
        }
    };

    if let Err(err) = std::fs::create_dir_all(out_dir) {
        log::error!("creating {}: {err}", out_dir.display());
        return ExitCode::from(2);
    }

    for (module_name, source) in &generated {
        let file_name = format!("{}.rs", heck::AsSnakeCase(module_name));
        let path = out_dir.join(file_name);
        log::debug!("writing {}", path.display());
        if let Err(err) = std::fs::write(&path, source) {
            log::error!("writing {}: {err}", path.display());
            return ExitCode::from(2);
        }
    }

    log::info!("wrote {} module(s) to {}", generated.len(), out_dir.display());
    ExitCode::SUCCESS
}
