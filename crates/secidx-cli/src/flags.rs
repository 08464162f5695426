//! Flat clap flag surface (spec.md §6): one long-running process, not a
//! subcommand tree, so every recognized flag is a field on [`Args`].

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Every flag name `secidx` recognizes, used to filter unrecognized ones
/// out of `argv` before clap ever sees them (spec.md §6 "unknown flag ->
/// warn and continue").
pub const RECOGNIZED_FLAGS: &[&str] = &[
    "loglevel",
    "vbuckets",
    "cluster",
    "adminPort",
    "scanPort",
    "httpPort",
    "httpsPort",
    "streamInitPort",
    "streamCatchupPort",
    "streamMaintPort",
    "storageDir",
    "diagDir",
    "enableManager",
    "auth",
    "nodeUUID",
    "storageMode",
    "certFile",
    "keyFile",
    "isEnterprise",
    "ipv6",
    "ipv4",
    "help",
    "version",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum Ipv4Mode {
    Required,
    Optional,
    Off,
}

/// Indexer/projector process bootstrap flags.
#[derive(Debug, Parser)]
#[command(name = "secidx", about = "Secondary-index projector/planner process bootstrap")]
pub struct Args {
    #[arg(long = "loglevel", default_value = "info")]
    pub loglevel: String,

    #[arg(long = "vbuckets", default_value_t = 1024)]
    pub vbuckets: u16,

    /// Seed address of an existing cluster member to join. Mandatory:
    /// a brand-new process has nowhere else to learn topology from.
    #[arg(long = "cluster")]
    pub cluster: String,

    #[arg(long = "adminPort", default_value_t = 9100)]
    pub admin_port: u16,

    #[arg(long = "scanPort", default_value_t = 9101)]
    pub scan_port: u16,

    #[arg(long = "httpPort", default_value_t = 9102)]
    pub http_port: u16,

    #[arg(long = "httpsPort", default_value_t = 9103)]
    pub https_port: u16,

    #[arg(long = "streamInitPort", default_value_t = 9104)]
    pub stream_init_port: u16,

    #[arg(long = "streamCatchupPort", default_value_t = 9105)]
    pub stream_catchup_port: u16,

    #[arg(long = "streamMaintPort", default_value_t = 9106)]
    pub stream_maint_port: u16,

    #[arg(long = "storageDir", default_value = "./data")]
    pub storage_dir: PathBuf,

    #[arg(long = "diagDir", default_value = "./diag")]
    pub diag_dir: PathBuf,

    #[arg(long = "enableManager", default_value_t = false)]
    pub enable_manager: bool,

    /// `user:pass` credential the admin dispatcher validates against.
    #[arg(long = "auth")]
    pub auth: Option<String>,

    /// Mandatory: every feed/planner operation is attributed to a node.
    #[arg(long = "nodeUUID")]
    pub node_uuid: String,

    #[arg(long = "storageMode", default_value = "plasma")]
    pub storage_mode: String,

    #[arg(long = "certFile")]
    pub cert_file: Option<PathBuf>,

    #[arg(long = "keyFile")]
    pub key_file: Option<PathBuf>,

    #[arg(long = "isEnterprise", default_value_t = false)]
    pub is_enterprise: bool,

    #[arg(long = "ipv6", default_value_t = false)]
    pub ipv6: bool,

    #[arg(long = "ipv4", default_value = "required")]
    pub ipv4: Ipv4Mode,
}

/// Drops any `--flag[=value]` token not in `recognized`, printing a
/// warning for each (logging isn't installed yet at this point, since
/// installing it needs the parsed `--loglevel` value itself).
pub fn filter_unknown_flags(args: Vec<String>, recognized: &[&str]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.into_iter().peekable();
    if let Some(argv0) = iter.next() {
        out.push(argv0);
    }
    while let Some(arg) = iter.next() {
        let Some(rest) = arg.strip_prefix("--") else {
            out.push(arg);
            continue;
        };
        let name = rest.split('=').next().unwrap_or(rest);
        if recognized.contains(&name) {
            out.push(arg);
            continue;
        }
        eprintln!("secidx: warning: unrecognized flag --{name}, ignoring");
        if !rest.contains('=') && iter.peek().is_some_and(|next| !next.starts_with("--")) {
            iter.next();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_unknown_long_flag_and_its_value() {
        let args = vec!["secidx".to_string(), "--bogusFlag".to_string(), "x".to_string(), "--loglevel".to_string(), "debug".to_string()];
        let filtered = filter_unknown_flags(args, RECOGNIZED_FLAGS);
        assert_eq!(filtered, vec!["secidx", "--loglevel", "debug"]);
    }

    #[test]
    fn keeps_unknown_flag_with_equals_form_value_intact() {
        let args = vec!["secidx".to_string(), "--bogusFlag=x".to_string(), "--loglevel".to_string(), "debug".to_string()];
        let filtered = filter_unknown_flags(args, RECOGNIZED_FLAGS);
        assert_eq!(filtered, vec!["secidx", "--loglevel", "debug"]);
    }

    #[test]
    fn keeps_recognized_flags() {
        let args = vec!["secidx".to_string(), "--cluster".to_string(), "10.0.0.1:9100".to_string()];
        let filtered = filter_unknown_flags(args.clone(), RECOGNIZED_FLAGS);
        assert_eq!(filtered, args);
    }

    #[test]
    fn missing_mandatory_cluster_fails_to_parse() {
        let err = Args::try_parse_from(["secidx", "--nodeUUID", "abc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_recognized_flags_into_typed_args() {
        let args = Args::try_parse_from([
            "secidx",
            "--cluster",
            "10.0.0.1:9100",
            "--nodeUUID",
            "abc-123",
            "--ipv4",
            "optional",
        ])
        .unwrap();
        assert_eq!(args.cluster, "10.0.0.1:9100");
        assert_eq!(args.ipv4, Ipv4Mode::Optional);
        assert_eq!(args.admin_port, 9100);
    }
}
