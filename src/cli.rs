use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "emostroop",
    version,
    about = "Face/word emotional Stroop task with EEG trigger output",
    long_about = "Presents happy and sad faces overlaid with congruent or incongruent emotion words,\n\
                  records key responses and sends synchronisation codes to the recording hardware."
)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Participant ID `{code}_{F|T}_{C|P}`; prompted for when omitted
    #[arg(long)]
    pub participant: Option<String>,

    /// Directory holding the Happy/ and Sad/ image folders
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Output directory for session logs
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// TrueType font used for all text
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Run in a window instead of fullscreen
    #[arg(long)]
    pub windowed: bool,

    /// Enable the P key to skip phases
    #[arg(long)]
    pub debug: bool,

    /// Seed for image selection and inter-trial intervals
    #[arg(long)]
    pub seed: Option<u64>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
