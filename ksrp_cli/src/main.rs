use clap::{Parser, Subcommand, ValueEnum};
use ksrp_gen::EmitterKind;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cmds;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "ksrp")]
#[command(about = "Kalman status report protocol compiler - packed C headers from YAML protocol documents")]
#[command(version)]
struct Cli {
    /// Enable verbose output and debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate C headers from a directory of protocol documents
    Codegen {
        /// Directory containing the protocol YAML documents
        #[arg(short = 's', long = "source", value_name = "DIR")]
        source_dir: Option<PathBuf>,

        /// Output directory for the generated library
        #[arg(short = 'o', long = "output", value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Directory with template overrides
        #[arg(short = 't', long = "templates", value_name = "DIR")]
        templates_dir: Option<PathBuf>,

        /// Emitter used to render the headers
        #[arg(long = "emitter", value_enum)]
        emitter: Option<EmitterArg>,

        /// Static library skeleton copied into the output root
        #[arg(long = "library", value_name = "DIR", conflicts_with = "no_library")]
        library_dir: Option<PathBuf>,

        /// Do not copy the library skeleton
        #[arg(long = "no-library")]
        no_library: bool,

        /// Configuration file (defaults to ./ksrp.yaml when present)
        #[arg(long = "config", value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Compute and print frame layouts without writing anything
    Analyze {
        /// Directory containing the protocol YAML documents
        #[arg(short = 's', long = "source", value_name = "DIR")]
        source_dir: Option<PathBuf>,

        /// Print the layout IR as JSON
        #[arg(long = "print-ir")]
        print_ir: bool,

        /// Configuration file (defaults to ./ksrp.yaml when present)
        #[arg(long = "config", value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum EmitterArg {
    /// Render through the minijinja templates
    Template,
    /// Assemble headers from C constructs
    Construct,
}

impl From<EmitterArg> for EmitterKind {
    fn from(arg: EmitterArg) -> Self {
        match arg {
            EmitterArg::Template => EmitterKind::Template,
            EmitterArg::Construct => EmitterKind::Construct,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Codegen {
            source_dir,
            output_dir,
            templates_dir,
            emitter,
            library_dir,
            no_library,
            config,
        } => {
            let overrides = config::Overrides {
                source_dir,
                output_dir,
                templates_dir,
                library_dir,
                no_library,
                emitter: emitter.map(EmitterKind::from),
            };
            let settings = config::Settings::resolve(config.as_deref(), overrides)?;
            cmds::codegen::run(&settings, cli.verbose)?;
        }

        Commands::Analyze {
            source_dir,
            print_ir,
            config,
        } => {
            let overrides = config::Overrides {
                source_dir,
                ..Default::default()
            };
            let settings = config::Settings::resolve(config.as_deref(), overrides)?;
            cmds::analyze::run(&settings, print_ir)?;
        }
    }

    Ok(())
}
