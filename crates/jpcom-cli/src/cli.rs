use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "makejpcom",
    about = "makejpcom: rebuild a composite knowledge base from an id table of block replacements",
    version
)]
pub struct Cli {
    /// Directory of knowledge-data (.knb) files used when bridging
    #[arg(short = 'k', long)]
    pub knb_dir: Option<PathBuf>,

    /// Directory of diagram-data (.dat) files used when bridging
    #[arg(short = 'd', long)]
    pub dia_dir: Option<PathBuf>,

    /// Composite knowledge base to update
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Version date stamped into the output (yyyyMMdd); blank leaves it alone
    #[arg(short = 'v', long = "data-version")]
    pub data_version: Option<String>,

    /// Id table of `blockId,filename` records
    #[arg(short = 't', long)]
    pub id_table: Option<PathBuf>,

    /// TOML config file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Work on a staged copy and replace the output only on success
    #[arg(long)]
    pub staged: bool,

    /// Run id embedded in temporary file names (default: random)
    #[arg(long)]
    pub run_id: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
