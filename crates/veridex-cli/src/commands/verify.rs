//! The `verify` command: load trust material, gate the suites, scan every
//! artifact, optionally offer a forced retry, then write the sorted result
//! report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use veridex_core::{
    offer_retry, record_for, verify_suites, write_sorted, GateState, IndexProvider, IndexSource,
    ResultLog, RunOutcome, Scanner,
};
use veridex_index::{HttpIndexProvider, IndexConfig, Keyring, KeyringVerifier};

use crate::args::VerifyArgs;
use crate::artifacts;
use crate::exit_codes;
use crate::prompt::{FixedDecider, PromptDecider};

/// Streaming per-artifact log; superseded by the sorted report on success.
const PARTIAL_LOG_NAME: &str = "veridex_results.partial.csv";
const RESULTS_NAME: &str = "veridex_results.csv";

pub async fn run(args: VerifyArgs) -> Result<i32> {
    let keyring = Keyring::load(&args.keyring).context("loading keyring")?;
    tracing::info!(keys = keyring.len(), "keyring loaded");
    let verifier = KeyringVerifier::new(keyring);

    let mut config = IndexConfig::new(args.mirror.clone()).context("bad mirror URL")?;
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.clone();
    }
    let provider = Arc::new(HttpIndexProvider::new(config)?);

    let sources = build_sources(&provider, &args.suites, &args.components);
    let artifacts = artifacts::discover(&args.artifact_dir)?;
    if artifacts.is_empty() {
        bail!("no artifacts found under {}", args.artifact_dir.display());
    }
    tracing::info!(
        artifacts = artifacts.len(),
        sources = sources.len(),
        "starting verification"
    );

    let gate = if args.force_suite {
        tracing::warn!("suite gate bypassed, treating every suite as trusted");
        GateState::forced(args.suites.iter().cloned())
    } else {
        verify_suites(&sources, provider.as_ref(), &verifier).await
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.artifact_dir.join(RESULTS_NAME));
    let partial = args.artifact_dir.join(PARTIAL_LOG_NAME);
    let log_file =
        File::create(&partial).with_context(|| format!("creating {}", partial.display()))?;
    let log = Arc::new(ResultLog::new(Box::new(log_file))?);

    let scanner = Scanner::new(
        Arc::clone(&provider) as Arc<dyn IndexProvider>,
        sources,
        gate,
    )
    .with_concurrency(args.concurrency)
    .with_log(log);

    let outcome = scanner.run(artifacts).await?;

    let outcome = if args.no_retry_prompt {
        outcome
    } else if args.assume_yes {
        offer_retry(&scanner, outcome, &FixedDecider { answer: true }).await?
    } else {
        let decider = PromptDecider {
            timeout: Duration::from_secs(args.retry_timeout),
        };
        offer_retry(&scanner, outcome, &decider).await?
    };

    write_report(&outcome, &output)?;
    if let Err(e) = std::fs::remove_file(&partial) {
        tracing::debug!(error = %e, "could not remove partial log");
    }

    summarize(&outcome);
    Ok(exit_code(&outcome))
}

/// Sources in their fixed priority order: suites-list order times
/// components-list order.
fn build_sources(
    provider: &HttpIndexProvider,
    suites: &[String],
    components: &[String],
) -> Vec<IndexSource> {
    let mut sources = Vec::with_capacity(suites.len() * components.len());
    for suite in suites {
        for component in components {
            sources.push(IndexSource {
                suite: suite.clone(),
                component: component.clone(),
                origin_url: provider.index_url(suite, component),
            });
        }
    }
    sources
}

fn write_report(outcome: &RunOutcome, path: &Path) -> Result<()> {
    let records: Vec<_> = outcome.results.iter().map(record_for).collect();
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_sorted(&records, &mut writer)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = records.len(), "result report written");
    Ok(())
}

fn summarize(outcome: &RunOutcome) {
    let matched = outcome
        .results
        .iter()
        .filter(|s| s.result.is_matched())
        .count();
    let unmatched = outcome.results.len() - matched;
    println!(
        "{} artifact(s): {matched} matched, {unmatched} unmatched",
        outcome.results.len()
    );
    for suite in outcome.gate.failed_suites() {
        eprintln!("warning: suite '{suite}' failed signature verification");
    }
}

/// Gate failures outrank unmatched artifacts: a run that could not trust
/// one of its suites is reported as such even when everything matched.
fn exit_code(outcome: &RunOutcome) -> i32 {
    if !outcome.gate.failed.is_empty() {
        exit_codes::GATE_FAILED
    } else if outcome.unmatched().next().is_some() {
        exit_codes::UNMATCHED
    } else {
        exit_codes::SUCCESS
    }
}
