use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("lapse")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("lapse")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Show debug logging")
                .required(false)
                .conflicts_with("quiet"),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("hunt")
                .about(
                    "Crawl expired-domain listing sites, check every domain found and save the \
                expired ones to a dated CSV report.",
                )
                .arg(
                    arg!(-s --"seed" <URL>)
                        .required(false)
                        .help("Seed page to crawl (repeatable, default: built-in listing sites)")
                        .action(clap::ArgAction::Append)
                        .conflicts_with("seeds-file"),
                )
                .arg(
                    arg!(-S --"seeds-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("seed"),
                )
                .arg(
                    arg!(-d --"depth" <ROUNDS>)
                        .required(false)
                        .help("Number of crawl rounds per seed")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("2"),
                )
                .arg(
                    arg!(--"delay-ms" <MILLIS>)
                        .required(false)
                        .help("Pause after every page fetch, in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("1000"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Timeout for every network request, in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"max-frontier" <URLS>)
                        .required(false)
                        .help("Most links carried from one crawl round to the next")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("500"),
                )
                .arg(
                    arg!(--"max-pages" <PAGES>)
                        .required(false)
                        .help("Most pages fetched over the whole run")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5000"),
                )
                .arg(strategy_arg())
                .arg(api_key_arg())
                .arg(unknown_as_arg())
                .arg(
                    arg!(-e --"enrich")
                        .required(false)
                        .help("Score expired domains for past usage, brandability and backlinks")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output-dir" <PATH>)
                        .required(false)
                        .help("Directory the CSV report is written to")
                        .default_value("."),
                ),
        )
        .subcommand(
            command!("check")
                .about("Check the expiry status of specific domains without crawling")
                .arg(
                    arg!([DOMAIN] ...)
                        .required(false)
                        .help("Domains to check")
                        .conflicts_with("file"),
                )
                .arg(
                    arg!(-f --"file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of domains")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("DOMAIN"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Timeout for every lookup, in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(strategy_arg())
                .arg(api_key_arg())
                .arg(unknown_as_arg()),
        )
}

fn strategy_arg() -> clap::Arg {
    arg!(--"strategy" <STRATEGY>)
        .required(false)
        .help("Expiry lookup: whois (TCP port 43) or api (needs an API key)")
        .value_parser(["whois", "api"])
        .default_value("whois")
}

fn api_key_arg() -> clap::Arg {
    arg!(--"api-key" <KEY>)
        .required(false)
        .help("Key for the WHOIS API (default: $LAPSE_API_KEY)")
}

fn unknown_as_arg() -> clap::Arg {
    arg!(--"unknown-as" <VERDICT>)
        .required(false)
        .help("How to count domains whose expiry could not be determined")
        .value_parser(["expired", "active"])
        .default_value("expired")
}
