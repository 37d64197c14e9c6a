//! pdflatex and pdftoppm, run in a scratch directory per compilation.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::AppError;

const COMPILE_TIMEOUT: Duration = Duration::from_secs(60);
const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(20);
const THUMBNAIL_DPI: &str = "72";
const JOB_NAME: &str = "resume";

/// Paths of the external typesetting tools.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub pdflatex: String,
    pub pdftoppm: String,
}

impl Toolchain {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pdflatex: config.pdflatex_path.clone(),
            pdftoppm: config.pdftoppm_path.clone(),
        }
    }
}

pub struct CompiledResume {
    pub pdf: Vec<u8>,
    /// First page as PNG. `None` when rasterising failed.
    pub thumbnail: Option<Vec<u8>>,
}

async fn run(mut command: Command, limit: Duration, what: &str) -> anyhow::Result<Output> {
    command.kill_on_drop(true);
    tokio::time::timeout(limit, command.output())
        .await
        .map_err(|_| anyhow!("{what} timed out after {}s", limit.as_secs()))?
        .with_context(|| format!("failed to start {what}"))
}

/// Last lines of pdflatex output; errors are reported at the end.
fn log_tail(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    let start = lines.len().saturating_sub(20);
    lines[start..].join("\n")
}

async fn thumbnail(tools: &Toolchain, dir: &Path) -> anyhow::Result<Vec<u8>> {
    let mut command = Command::new(&tools.pdftoppm);
    command
        .args(["-png", "-f", "1", "-l", "1", "-singlefile", "-r", THUMBNAIL_DPI])
        .arg(dir.join(format!("{JOB_NAME}.pdf")))
        .arg(dir.join("thumbnail"));
    let output = run(command, THUMBNAIL_TIMEOUT, "pdftoppm").await?;
    if !output.status.success() {
        return Err(anyhow!(
            "pdftoppm exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    tokio::fs::read(dir.join("thumbnail.png"))
        .await
        .context("pdftoppm produced no image")
}

/// Compiles `latex` to PDF and renders a first-page thumbnail.
pub async fn compile(tools: &Toolchain, latex: &str) -> Result<CompiledResume, AppError> {
    let dir = tempfile::tempdir().context("failed to create build directory")?;
    let tex_path = dir.path().join(format!("{JOB_NAME}.tex"));
    tokio::fs::write(&tex_path, latex)
        .await
        .context("failed to write LaTeX source")?;

    let mut command = Command::new(&tools.pdflatex);
    command
        .arg("-interaction=nonstopmode")
        .arg("-halt-on-error")
        .arg(format!("-output-directory={}", dir.path().display()))
        .arg(&tex_path)
        .current_dir(dir.path());
    let output = run(command, COMPILE_TIMEOUT, "pdflatex").await?;

    let pdf_path = dir.path().join(format!("{JOB_NAME}.pdf"));
    if !output.status.success() || !pdf_path.exists() {
        warn!(status = %output.status, "LaTeX compilation failed");
        return Err(anyhow!("LaTeX compilation failed:\n{}", log_tail(&output)).into());
    }
    let pdf = tokio::fs::read(&pdf_path)
        .await
        .context("failed to read compiled PDF")?;
    debug!(bytes = pdf.len(), "resume compiled");

    let thumbnail = match thumbnail(tools, dir.path()).await {
        Ok(png) => Some(png),
        Err(e) => {
            warn!("Thumbnail generation failed: {e:#}");
            None
        }
    };

    Ok(CompiledResume { pdf, thumbnail })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let tools = Toolchain {
            pdflatex: "/nonexistent/pdflatex".to_string(),
            pdftoppm: "/nonexistent/pdftoppm".to_string(),
        };
        let result = compile(&tools, r"\documentclass{article}\begin{document}x\end{document}").await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_toolchain_paths_from_config() {
        let tools = Toolchain::from_config(&Config::for_tests());
        assert_eq!(tools.pdflatex, "pdflatex");
        assert_eq!(tools.pdftoppm, "pdftoppm");
    }
}
