//! Check content and print the report

use anyhow::Result;
use notify::Watcher;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::check::{self, Report};
use crate::{Folio, CONFIG_FILE};

/// Output format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl std::str::FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => anyhow::bail!("Unknown format: {}. Available: text, json", other),
        }
    }
}

/// Render a report in the requested format
pub fn render(report: &Report, format: Format) -> Result<String> {
    match format {
        Format::Text => Ok(report.render_text()),
        Format::Json => Ok(report.to_json()? + "\n"),
    }
}

/// Check the site once and print the report
pub fn run(folio: &Folio, format: Format) -> Result<Report> {
    let report = check::run(folio)?;
    print!("{}", render(&report, format)?);
    Ok(report)
}

/// Re-run the check whenever content or configuration changes
pub fn watch(folio: &Folio, format: Format) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    watcher.watch(&folio.source_dir, notify::RecursiveMode::Recursive)?;

    let config_path = folio.base_dir.join(CONFIG_FILE);
    if config_path.exists() && !config_path.starts_with(&folio.source_dir) {
        watcher.watch(&config_path, notify::RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let mut last_run = Instant::now();

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(_event) => {
                // Debounce: editors write several events per save
                if last_run.elapsed() > Duration::from_millis(500) {
                    tracing::info!("Content changed, checking again...");
                    // configuration may have changed too
                    let result = Folio::new(&folio.base_dir).and_then(|f| run(&f, format));
                    if let Err(e) = result {
                        tracing::error!("Check failed: {}", e);
                    }
                    last_run = Instant::now();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("text".parse::<Format>().unwrap(), Format::Text);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn test_render_json_ends_with_newline() {
        let report = Report::default();
        let json = render(&report, Format::Json).unwrap();
        assert!(json.ends_with("}\n"));
        assert!(json.contains("\"documents\": 0"));
    }
}
