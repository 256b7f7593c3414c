use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use synthscope_eval::{Report, render_report};

use crate::error::{CliError, CliResult};

pub struct WrittenReport {
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

/// Write `report.json` and `report.md` into `dir`.
pub fn write_report(dir: &Path, report: &Report) -> CliResult<WrittenReport> {
    create_dir_all(dir)?;
    let json_path = dir.join("report.json");
    let markdown_path = dir.join("report.md");

    write_bytes_atomic(&json_path, &serde_json::to_vec_pretty(report)?)?;
    let mut markdown = render_report(report);
    markdown.push('\n');
    write_bytes_atomic(&markdown_path, markdown.as_bytes())?;

    Ok(WrittenReport {
        json_path,
        markdown_path,
    })
}

/// Write through a sibling temp file so readers never see a partial report.
fn write_bytes_atomic(path: &Path, data: &[u8]) -> CliResult<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::InvalidPath(path.display().to_string()))?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
