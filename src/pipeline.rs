//! Run every pass through build, bind and organize, then merge in order.
//!
//! Passes share nothing until the merge, so they are analysed on the rayon
//! pool. The merge is a single sequential fold over the results in input
//! order, which keeps the master tree deterministic regardless of how the
//! pool scheduled the work.

use crate::config::Config;
use crate::error::{Diagnostic, Error, Result};
use crate::model::{Entity, PassInput};
use crate::parser::comment;
use crate::tree::{binder, builder, merge::Merger, organize};
use rayon::prelude::*;
use tracing::{debug, error, info};

/// One pass after build, bind and organize.
#[derive(Debug)]
pub struct Analysis {
    pub tree: Entity,
    pub report: PassReport,
}

#[derive(Debug, Clone)]
pub struct PassReport {
    pub file: String,
    /// Declarations and synthesized nodes, root excluded.
    pub nodes: usize,
    /// Comment tokens bound, group headers included.
    pub comments: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// A pass that was abandoned. Other passes are unaffected.
#[derive(Debug)]
pub struct PassFailure {
    pub file: String,
    pub error: Error,
}

/// Result of a whole run.
#[derive(Debug)]
pub struct Outcome {
    pub tree: Entity,
    /// Passes that made it into the tree, in input order.
    pub reports: Vec<PassReport>,
    pub failures: Vec<PassFailure>,
    /// Diagnostics raised while merging.
    pub diagnostics: Vec<Diagnostic>,
}

impl Outcome {
    /// Every diagnostic from every pass and from the merge.
    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports
            .iter()
            .flat_map(|r| r.diagnostics.iter())
            .chain(self.diagnostics.iter())
    }
}

/// Build, bind and organize a single pass.
pub fn analyze(pass: &PassInput, config: &Config) -> Result<Analysis> {
    let (mut forest, mut diagnostics) = builder::build(pass)?;

    let tokens = comment::decode_all(&pass.comments, &config.comments);
    let bound = binder::bind(&mut forest, &tokens, config.organize.access_sections);
    diagnostics.extend(bound.diagnostics);

    let mut tree = forest.into_entity();
    organize::organize(&mut tree);

    let report = PassReport {
        file: pass.file.clone(),
        nodes: tree.count() - 1,
        comments: bound.bindings.len(),
        diagnostics,
    };
    debug!(
        file = %report.file,
        nodes = report.nodes,
        comments = report.comments,
        "analysed pass"
    );
    Ok(Analysis { tree, report })
}

/// Analyse all passes and merge them into one tree.
///
/// Only a worker pool that cannot be started fails the run. A pass that
/// fails is recorded in [`Outcome::failures`] and left out of the tree.
pub fn run(passes: &[PassInput], config: &Config) -> Result<Outcome> {
    let analysed = match config.pipeline.threads {
        0 => analyze_all(passes, config),
        threads => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            pool.install(|| analyze_all(passes, config))
        }
    };

    let mut merger = Merger::new();
    let mut reports = Vec::new();
    let mut failures = Vec::new();

    for (pass, result) in passes.iter().zip(analysed) {
        let folded = result.and_then(|analysis| {
            merger.fold(analysis.tree)?;
            Ok(analysis.report)
        });
        match folded {
            Ok(report) => reports.push(report),
            Err(err) => {
                error!(file = %pass.file, "pass abandoned: {}", err);
                failures.push(PassFailure {
                    file: pass.file.clone(),
                    error: err,
                });
            }
        }
    }

    let (tree, diagnostics) = merger.finish();
    info!(
        passes = reports.len(),
        failed = failures.len(),
        nodes = tree.count(),
        "merged documentation tree"
    );
    Ok(Outcome {
        tree,
        reports,
        failures,
        diagnostics,
    })
}

fn analyze_all(passes: &[PassInput], config: &Config) -> Vec<Result<Analysis>> {
    passes.par_iter().map(|pass| analyze(pass, config)).collect()
}
