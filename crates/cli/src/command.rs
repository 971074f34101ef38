use std::ffi::OsString;

use clap::{Arg, ArgAction, Command, builder::OsStringValueParser, value_parser};

/// Program name used when `argv` is empty.
pub(crate) const PROGRAM_NAME: &str = "fswalk";

/// Arguments after parsing, before they are turned into walk options.
///
/// **Warning**: This type is exposed via `cli::test_utils` for integration
/// tests only. It is not part of the stable public API.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    /// Traversal root; `None` walks the current directory.
    ///
    /// Corresponds to: positional `ROOT`
    pub root: Option<OsString>,

    /// Probe concurrency.
    ///
    /// Corresponds to: `--max-concurrency`, `-j`
    ///
    /// Default: `None` (environment, then library default)
    pub max_concurrency: Option<usize>,

    /// Listing concurrency.
    ///
    /// Corresponds to: `--listing-concurrency`
    pub listing_concurrency: Option<usize>,

    /// Probe backlog above which listing slows down.
    ///
    /// Corresponds to: `--backlog-threshold`
    pub backlog_threshold: Option<usize>,

    /// Deepest entry depth emitted; root children are depth 0.
    ///
    /// Corresponds to: `--max-depth`
    pub max_depth: Option<usize>,

    /// Names pruned wherever they appear.
    ///
    /// Corresponds to: `--exclude` (repeatable)
    pub excludes: Vec<OsString>,

    /// Report symlinks instead of following them.
    ///
    /// Corresponds to: `--no-follow`, `-P`
    pub no_follow: bool,

    /// One JSON object per entry.
    ///
    /// Corresponds to: `--json`
    pub json: bool,

    /// NUL instead of newline after each path.
    ///
    /// Corresponds to: `--null`, `-0`
    pub null: bool,

    /// Print a summary on stderr after the walk.
    ///
    /// Corresponds to: `--stats`
    pub stats: bool,

    /// Number of `-v` occurrences.
    pub verbose: u8,

    /// Raw `--debug` lists, applied in order after `-v`.
    pub debug: Vec<String>,
}

/// Builds the `clap` command used for parsing.
pub(crate) fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Walk a directory tree with bounded, consumer-paced I/O concurrency.")
        .arg(
            Arg::new("max-concurrency")
                .long("max-concurrency")
                .short('j')
                .value_name("N")
                .help("Maximum metadata lookups in flight (default 10, or $FSWALK_MAX_CONCURRENCY).")
                .action(ArgAction::Set)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("listing-concurrency")
                .long("listing-concurrency")
                .value_name("N")
                .help("Maximum directory listings in flight (default 1).")
                .action(ArgAction::Set)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("backlog-threshold")
                .long("backlog-threshold")
                .value_name("N")
                .help("Pending lookups above which listing slows down (default 5000).")
                .action(ArgAction::Set)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .value_name("N")
                .help("Do not emit or read entries deeper than N (root children are depth 0).")
                .action(ArgAction::Set)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .value_name("NAME")
                .help("Skip entries named NAME and everything below them.")
                .action(ArgAction::Append)
                .value_parser(OsStringValueParser::new()),
        )
        .arg(
            Arg::new("no-follow")
                .long("no-follow")
                .short('P')
                .help("Report symbolic links instead of following them.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print one JSON object per entry.")
                .action(ArgAction::SetTrue)
                .conflicts_with("null"),
        )
        .arg(
            Arg::new("null")
                .long("null")
                .short('0')
                .help("Terminate each path with NUL instead of a newline.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Print a summary on stderr when the walk ends.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase diagnostic verbosity (repeatable).")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .value_name("FLAGS")
                .help("Enable debug categories: walk, queue, flow, fs, all, none (e.g. queue2,flow).")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("root")
                .value_name("ROOT")
                .help("Directory or file:// URL to walk (default: current directory).")
                .action(ArgAction::Set)
                .value_parser(OsStringValueParser::new()),
        )
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
pub fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();

    if args.is_empty() {
        args.push(OsString::from(PROGRAM_NAME));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    Ok(ParsedArgs {
        root: matches.remove_one::<OsString>("root"),
        max_concurrency: matches.remove_one::<usize>("max-concurrency"),
        listing_concurrency: matches.remove_one::<usize>("listing-concurrency"),
        backlog_threshold: matches.remove_one::<usize>("backlog-threshold"),
        max_depth: matches.remove_one::<usize>("max-depth"),
        excludes: matches
            .remove_many::<OsString>("exclude")
            .map(|values| values.collect())
            .unwrap_or_default(),
        no_follow: matches.get_flag("no-follow"),
        json: matches.get_flag("json"),
        null: matches.get_flag("null"),
        stats: matches.get_flag("stats"),
        verbose: matches.get_count("verbose"),
        debug: matches
            .remove_many::<String>("debug")
            .map(|values| values.collect())
            .unwrap_or_default(),
    })
}
