//! Self-test harness (`-D FILE`).
//!
//! Exercises the session manager the way a multi-client deployment would:
//! four named contexts each stream the whole input file concurrently, then a
//! flood pass fires every line at the default context at once. Each pass
//! writes its hypotheses next to the input (`FILE.out.N`, `FILE.out.flood`)
//! so runs can be diffed — the four per-context outputs must be identical.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use futures::future;
use tracing::{info, warn};
use trellis_runtime::SessionManager;

const CONTEXT_PASSES: usize = 4;

/// Run the harness against one input file.
pub async fn run(manager: &Arc<SessionManager>, input: &Path) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let lines: Arc<Vec<String>> = Arc::new(
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect(),
    );
    info!(lines = lines.len(), "debug harness starting");

    // Pass 1: the same stream through four independent contexts at once
    let passes: Vec<_> = (0..CONTEXT_PASSES)
        .map(|i| {
            let manager = Arc::clone(manager);
            let lines = Arc::clone(&lines);
            let out_path = sibling(input, &i.to_string());
            tokio::spawn(async move {
                let mut outputs = Vec::new();
                for line in lines.iter() {
                    match manager.handle_line(line, Some(&i.to_string())).await {
                        Ok(Some(hypothesis)) => outputs.push(hypothesis),
                        Ok(None) => {}
                        Err(err) => {
                            warn!(pass = i, category = err.category(), error = %err, "line failed");
                        }
                    }
                }
                tokio::fs::write(&out_path, render(&outputs)).await
            })
        })
        .collect();
    for pass in passes {
        pass.await?.context("writing context pass output")?;
    }

    // Pass 2: flood the default context with every line concurrently.
    // join_all preserves spawn order, so the output file is deterministic
    // even though execution interleaves.
    let flood = future::join_all(lines.iter().map(|line| {
        let manager = Arc::clone(manager);
        let line = line.clone();
        tokio::spawn(async move { manager.handle_line(&line, None).await })
    }))
    .await;

    let mut outputs = Vec::new();
    for joined in flood {
        match joined? {
            Ok(Some(hypothesis)) => outputs.push(hypothesis),
            Ok(None) => {}
            Err(err) => warn!(category = err.category(), error = %err, "flood line failed"),
        }
    }
    let flood_path = sibling(input, "flood");
    tokio::fs::write(&flood_path, render(&outputs))
        .await
        .with_context(|| format!("writing {}", flood_path.display()))?;

    info!("debug harness finished");
    Ok(())
}

/// One line per hypothesis; no hypotheses means an empty file, not a lone
/// newline.
fn render(outputs: &[String]) -> String {
    if outputs.is_empty() {
        String::new()
    } else {
        outputs.join("\n") + "\n"
    }
}

fn sibling(input: &Path, suffix: &str) -> std::path::PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(format!(".out.{suffix}"));
    std::path::PathBuf::from(name)
}
