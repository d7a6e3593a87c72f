use std::io::IsTerminal as _;

use rama::{
    error::{BoxError, ErrorContext as _},
    telemetry::tracing::{
        self,
        metadata::LevelFilter,
        subscriber::{
            EnvFilter,
            filter::Directive,
            fmt::writer::BoxMakeWriter,
        },
    },
};

use crate::Args;

/// Directives applied on top of `-v` when `RUST_LOG` is not set.
///
/// A load run opens and reuses many connections, rama's connection
/// and request level debug events would bury the loadgen's own ones.
const VERBOSE_QUIET_DIRECTIVES: &[&str] = &["rama=info"];

/// Set up logging to stderr, or to the `--output` file.
///
/// INFO by default: the run lifecycle, its summary and rejected batches.
/// `-v` adds failed iterations and VU pool growth at DEBUG.
/// `RUST_LOG` replaces both defaults.
pub fn init_tracing(args: &Args) -> Result<(), BoxError> {
    let make_writer = match args.output.as_deref() {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .context("open log file")
                .with_context_debug_field("path", || path.to_owned())?;

            BoxMakeWriter::new(file)
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let filter = if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::builder()
            .with_default_directive(default_level(args.verbose).into())
            .from_env_lossy()
    } else {
        default_filter(args.verbose)?
    };

    let subscriber = tracing::subscriber::fmt()
        .with_ansi(args.output.is_none() && std::io::stderr().is_terminal())
        .with_env_filter(filter)
        .with_writer(make_writer);

    if args.pretty {
        subscriber.pretty().try_init()?;
    } else {
        subscriber.try_init()?;
    }

    tracing::debug!(verbose = args.verbose, "tracing initialized");
    Ok(())
}

fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

fn default_filter(verbose: bool) -> Result<EnvFilter, BoxError> {
    let mut filter = EnvFilter::default().add_directive(default_level(verbose).into());
    if verbose {
        for raw in VERBOSE_QUIET_DIRECTIVES {
            let directive: Directive = raw
                .parse()
                .context("parse log directive")
                .context_field("directive", raw)?;
            filter = filter.add_directive(directive);
        }
    }
    Ok(filter)
}
