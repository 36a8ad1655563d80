//! Sequential batch driver and output writing.
//!
//! Files run one after another. The first failure stops the batch; files
//! already processed stay in the caller's result list.

use crate::document::{OutputDocument, ProcessingResult};
use crate::error::BatchError;
use crate::pipeline::extract::Extractor;
use crate::progress::{percent_complete, BatchProgressCallback};
use crate::validate::FileCandidate;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Extract every file in order, appending each success to `results`.
///
/// Returns [`BatchError::FileFailed`] for the first file that fails; files
/// after it are not read.
pub async fn run_batch(
    extractor: &Extractor,
    files: &[FileCandidate],
    progress: &dyn BatchProgressCallback,
    results: &mut Vec<ProcessingResult>,
) -> Result<(), BatchError> {
    if files.is_empty() {
        return Err(BatchError::NothingSelected);
    }

    let total = files.len();
    let start = Instant::now();
    progress.on_batch_start(total);
    info!("Processing {} file(s)", total);

    for (index, file) in files.iter().enumerate() {
        progress.on_file_start(index, total, &file.name, percent_complete(index, total));

        let outcome = match file.load().await {
            Ok(input) => extractor.extract(&input).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(output) => {
                progress.on_file_complete(index, total, &file.name, output.len());
                results.push(ProcessingResult {
                    input_name: file.name.clone(),
                    input_size: file.size,
                    output,
                });
            }
            Err(source) => {
                warn!("{} failed: {}", file.name, source);
                progress.on_file_error(index, total, &file.name, &source.to_string());
                return Err(BatchError::FileFailed {
                    file: file.name.clone(),
                    source,
                });
            }
        }
    }

    info!(
        "Batch complete: {} file(s) in {}ms",
        total,
        start.elapsed().as_millis()
    );
    progress.on_batch_complete(total);
    Ok(())
}

/// Write `output` into `dir` under its output name.
///
/// The bytes go to a temporary file in `dir` that is then renamed into
/// place, so a partially written PDF is never visible under the final name.
pub fn write_output(dir: &Path, output: &OutputDocument) -> Result<PathBuf, BatchError> {
    write_named(dir, &output.name, &output.bytes)
}

/// Write every result into `dir`, returning the paths in result order.
///
/// Results sharing an output name (two inputs called `x.pdf`) are written as
/// `x_first_last_pages.pdf`, `x_first_last_pages (1).pdf`, and so on.
pub fn write_outputs(dir: &Path, results: &[ProcessingResult]) -> Result<Vec<PathBuf>, BatchError> {
    let mut used = HashSet::with_capacity(results.len());
    results
        .iter()
        .map(|result| {
            let name = unique_name(&result.output.name, &used);
            if name != result.output.name {
                warn!(
                    "{}: output name {} already used, writing {}",
                    result.input_name, result.output.name, name
                );
            }
            let path = write_named(dir, &name, &result.output.bytes)?;
            used.insert(name);
            Ok(path)
        })
        .collect()
}

fn unique_name(name: &str, used: &HashSet<String>) -> String {
    if !used.contains(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) => name.split_at(dot),
        None => (name, ""),
    };
    (1..)
        .map(|n| format!("{stem} ({n}){ext}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

fn write_named(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, BatchError> {
    let path = dir.join(name);
    let failed = |source| BatchError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(failed)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".firstlast-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(failed)?;
    tmp.write_all(bytes).map_err(failed)?;
    tmp.as_file().sync_all().map_err(failed)?;
    tmp.persist(&path).map_err(|e| failed(e.error))?;

    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
