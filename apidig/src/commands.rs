use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("apidig")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("apidig")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner, progress and log output").required(false))
        .arg(
            arg!(-v --"verbose" "Log every fetch and extraction step")
                .required(false)
                .conflicts_with("quiet"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("discover")
                .about(
                    "Recursively crawl a seed page and its scripts for API endpoints, then \
                request each endpoint's JSON payload.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The seed URL to start from (http:// is assumed when no scheme is given)"),
                )
                .arg(
                    arg!(-t --"concurrency" <NUM_WORKERS>)
                        .required(false)
                        .help("Pool size at each fan-out point (script mining, child pages, resolution)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(-d --"max-depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link hops from the seed (default: unbounded)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-m --"max-pages" <PAGES>)
                        .required(false)
                        .help("Maximum number of URLs to crawl (default: unbounded)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-g --"global-limit" <REQUESTS>)
                        .required(false)
                        .help("Maximum requests in flight across the whole crawl (default: unbounded)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"no-resolve")
                        .required(false)
                        .help("List endpoints without requesting their JSON payloads")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown"])
                        .default_value("text"),
                ),
        )
}
