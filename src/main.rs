//! aclverify command line
//!
//! Reads an ACL file (rules plus `verify` requests), checks every request and
//! prints one verdict line per request. Without a file it runs the built-in
//! demonstration ACL.

use std::fs;
use std::path::PathBuf;

use aclverify::config::{Mode, VerifierConfig};
use aclverify::report::{TraceTable, VerdictLine};
use aclverify::*;
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(author, version, about = "Verify ordered ACLs against expected traffic regions", long_about = None)]
struct Cli {
    /// ACL file with `rule` and `verify` lines
    file: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long, env = "ACLVERIFY_CONFIG")]
    config: Option<PathBuf>,
    /// Verification mode: partition or first-match
    #[arg(long)]
    mode: Option<Mode>,
    /// Print the sub-rule table for every request
    #[arg(long)]
    trace: bool,
    /// Log rule-by-rule progress
    #[arg(short, long)]
    verbose: bool,
}

const DEMO_ACL: &str = "\
# Deny a block, permit everything else from it
rule L1: deny src 10-20 dst any
rule L2: permit src any dst 100-200
verify R1: expect permit src 30-40 dst 100-200
verify R2: expect permit src 5-25 dst 100-200
verify R3: expect deny src 30-40 dst 300-400
";

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let mut config = match &cli.config {
        Some(path) => VerifierConfig::load(path)?,
        None => VerifierConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    config.trace |= cli.trace;

    let text = match &cli.file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            println!("No ACL file given, running the demonstration ACL:\n");
            println!("{}", DEMO_ACL);
            DEMO_ACL.to_string()
        }
    };
    let doc = parse_acl(&text).context("malformed ACL")?;
    log::info!("{} rule(s), {} request(s), mode {:?}", doc.rules.len(), doc.requests.len(), config.mode);

    let failures = match config.mode {
        Mode::Partition => run_partition(&doc, &config),
        Mode::FirstMatch => run_first_match(&doc)?,
    };

    println!("\n{} of {} request(s) passed", doc.requests.len() - failures, doc.requests.len());
    Ok(if failures == 0 { 0 } else { config.fail_exit_code })
}

fn run_partition(doc: &AclDocument, config: &VerifierConfig) -> usize {
    let mut failures = 0;
    for (name, verification) in verify_batch(&doc.rules, &doc.requests) {
        if config.trace {
            println!("\nSub-rules for {}:", name);
            print!("{}", TraceTable::from_verification(&verification, &doc.rules));
        }
        if !verification.verdict.is_pass() {
            failures += 1;
        }
        println!("{}", VerdictLine { name: &name, verdict: &verification.verdict });
    }
    failures
}

fn run_first_match(doc: &AclDocument) -> Result<usize> {
    let firewall = Firewall::<1024>::from_rules(&doc.rules).context("ACL too large for first-match mode")?;
    let mut failures = 0;
    for request in &doc.requests {
        let verdict = firewall.probe(request);
        if !verdict.is_pass() {
            failures += 1;
        }
        println!("{}", VerdictLine { name: &request.name, verdict: &verdict });
    }
    Ok(failures)
}
