use clap::Parser;
use reqwest::Url;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Desktop client for the chord annotation server
#[derive(Debug, Clone, Parser)]
#[command(name = "chord-annotator", version, about)]
pub struct Config {
    /// Base URL of the annotation server
    #[arg(long, env = "CHORD_ANNOTATOR_SERVER", default_value = DEFAULT_SERVER)]
    pub server: Url,

    /// Log filter directives, e.g. `info` or `chord_annotator=debug`
    #[arg(long, env = "CHORD_ANNOTATOR_LOG", default_value = "info")]
    pub log: String,

    /// Use the light theme
    #[arg(long)]
    pub light: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_are_parsed() {
        let cfg = Config::try_parse_from([
            "chord-annotator",
            "--server",
            "http://scores.local:9000",
            "--log",
            "debug",
            "--light",
        ])
        .unwrap();
        assert_eq!(cfg.server.as_str(), "http://scores.local:9000/");
        assert_eq!(cfg.log, "debug");
        assert!(cfg.light);
    }

    #[test]
    fn bad_server_url_is_rejected() {
        assert!(Config::try_parse_from(["chord-annotator", "--server", "not a url"]).is_err());
    }
}
