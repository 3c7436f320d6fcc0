//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Replay a recorded mindmap session against a persistent store.
#[derive(Debug, Parser)]
#[command(name = "mindmap", version, about)]
pub struct Cli {
    /// JSON configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "MINDMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory of the persistent store. Defaults to the user data directory.
    #[arg(long, env = "MINDMAP_STORE")]
    pub store: Option<PathBuf>,

    /// Container width in logical pixels.
    #[arg(long, default_value_t = 800.0)]
    pub width: f64,

    /// Container height in logical pixels.
    #[arg(long, default_value_t = 450.0)]
    pub height: f64,

    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    pub dpr: f64,

    /// Screen size used while fullscreen, as WIDTHxHEIGHT. Fullscreen is unsupported without it.
    #[arg(long, value_parser = parse_size)]
    pub screen: Option<(f64, f64)>,

    /// Event script (JSON array of steps) to replay.
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Write the final surface as PNG here.
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// URL of the page hosting the mindmap, used for the heading.
    #[arg(long)]
    pub page_url: Option<String>,

    /// Referrer of the hosting page, used for the parent page title.
    #[arg(long)]
    pub referrer: Option<String>,
}

fn parse_size(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("invalid width: {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("invalid height: {e}"))?;
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1920x1080"), Ok((1920.0, 1080.0)));
        assert!(parse_size("1920").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["mindmap"]);
        assert_eq!((cli.width, cli.height, cli.dpr), (800.0, 450.0, 1.0));
        assert!(cli.screen.is_none());
    }

    #[test]
    fn test_screen_flag() {
        let cli = Cli::parse_from(["mindmap", "--screen", "1280x720", "--dpr", "2"]);
        assert_eq!(cli.screen, Some((1280.0, 720.0)));
        assert_eq!(cli.dpr, 2.0);
    }
}
