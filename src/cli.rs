//! CLI argument parsing for the shift-timeline binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::services::provider::BreakActuals;
use crate::services::timeline::LabelMode;

#[derive(Parser)]
#[command(
    name = "shift-timeline",
    about = "Render per-shift-team schedule timelines from a VRP snapshot"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write one SVG timeline per shift team
    Render(RenderArgs),
    /// Write the layout primitives of each shift team as JSON
    Layout(RenderArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// VRP snapshot JSON file
    pub input: PathBuf,

    /// Directory for generated files [env: TIMELINE_OUTPUT_DIR]
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,

    /// IANA zone for hour boundaries and labels [env: TIMELINE_TIMEZONE]
    #[arg(long)]
    pub timezone: Option<String>,

    /// Time label style: short (14:05) or long (2024-03-09 02:05:00 PM MST)
    #[arg(long)]
    pub labels: Option<LabelMode>,

    /// Draw the legend (switches to the taller canvas unless --height is given)
    #[arg(long)]
    pub legend: bool,

    /// Draw a band behind every row
    #[arg(long)]
    pub row_bands: bool,

    /// Where rest break bars come from: recorded actuals or the planned window
    #[arg(long, default_value_t = BreakActuals::Recorded)]
    pub break_actuals: BreakActuals,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    #[arg(long)]
    pub margin: Option<u32>,

    #[arg(long)]
    pub row_height: Option<u32>,

    #[arg(long)]
    pub row_spacing: Option<u32>,
}

impl Command {
    pub fn args(&self) -> &RenderArgs {
        match self {
            Command::Render(args) | Command::Layout(args) => args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_render_command_parses() {
        let cli = Cli::parse_from(["shift-timeline", "render", "snapshot.json"]);
        assert!(matches!(cli.command, Command::Render(_)));
        let args = cli.command.args();
        assert_eq!(args.input, PathBuf::from("snapshot.json"));
        assert_eq!(args.break_actuals, BreakActuals::Recorded);
        assert!(args.labels.is_none());
        assert!(!args.legend);
    }

    #[test]
    fn test_cli_layout_command_with_overrides() {
        let cli = Cli::parse_from([
            "shift-timeline",
            "layout",
            "snapshot.json",
            "--labels",
            "long",
            "--legend",
            "--width",
            "1200",
            "--break-actuals",
            "planned",
            "-o",
            "out",
        ]);
        assert!(matches!(cli.command, Command::Layout(_)));
        let args = cli.command.args();
        assert_eq!(args.labels, Some(LabelMode::Long));
        assert!(args.legend);
        assert_eq!(args.width, Some(1200));
        assert_eq!(args.break_actuals, BreakActuals::Planned);
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_cli_rejects_unknown_label_mode() {
        let result =
            Cli::try_parse_from(["shift-timeline", "render", "s.json", "--labels", "tiny"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(Cli::try_parse_from(["shift-timeline", "render"]).is_err());
    }
}
