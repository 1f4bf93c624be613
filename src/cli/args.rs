use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "snapview",
    version,
    about = "render a daily table snapshot as a filterable page",
    long_about = "snapview fetches a pre-generated JSON snapshot (data/latest.json), renders it as an HTML table with a search filter and a CSV download link.\n\nExamples:\n  snapview -u https://example.github.io/site/ -o index.html\n  snapview -s docs/data/latest.json -q 2330\n  snapview -u https://example.github.io/site/ --interactive\n\nTip: Use --config to persist the site URL and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored status lines."
    )]
    pub no_color: bool,

    #[arg(
        long = "quiet",
        help_heading = "Output",
        help = "Hide the loading spinner and status lines."
    )]
    pub quiet: bool,

    #[arg(
        short = 'u',
        long = "base-url",
        visible_alias = "site",
        value_name = "URL",
        help_heading = "Input",
        help = "Site root the snapshot resource is resolved against."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 's',
        long = "snapshot",
        value_name = "FILE",
        help_heading = "Input",
        help = "Load the snapshot from a local JSON file instead of the site."
    )]
    pub snapshot: Option<String>,

    #[arg(
        long = "resource",
        value_name = "PATH",
        help_heading = "Input",
        help = "Snapshot path under the site root (default data/latest.json)."
    )]
    pub resource: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.snapview/config.yml when present)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'q',
        long = "query",
        value_name = "TEXT",
        help_heading = "Search",
        help = "Type TEXT into the search box before output."
    )]
    pub query: Option<String>,

    #[arg(
        short = 'i',
        long = "interactive",
        help_heading = "Search",
        help = "Read search box input from stdin, one line per input event."
    )]
    pub interactive: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the page to FILE instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        long = "format",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json or html (inferred from --output when omitted)."
    )]
    pub output_format: Option<String>,
}
