use colored::Colorize;

pub mod discover;
pub mod report;

pub use discover::{
    DiscoverOptions, DiscoverProgressCallback, DiscoveryReport, execute_discovery,
    extract_url_path,
};
pub use report::{ReportFormat, generate_report};

const BANNER: &str = r#"
                 _     ___
   ____ _____   (_)___/ (_)___ _
  / __ `/ __ \ / / __  / / __ `/
 / /_/ / /_/ // / /_/ / / /_/ /
 \__,_/ .___//_/\__,_/_/\__, /
     /_/               /____/
"#;

pub fn banner() -> String {
    format!(
        "{}\n  recursive API endpoint discovery  v{}\n",
        BANNER.trim_end_matches('\n'),
        env!("CARGO_PKG_VERSION")
    )
}

pub fn print_banner() {
    eprintln!("{}", banner().red().bold());
}
