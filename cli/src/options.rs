use clap::Parser;
use std::path::PathBuf;

/// File Uploader - upload a file or a directory tree to an HTTP endpoint
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "file-uploader")]
#[command(version, about)]
#[command(after_help = "Examples:
  file-uploader file.txt
  file-uploader file.txt \"docs/mydocs\"
  file-uploader -v -j 8 /path/to/directory
  file-uploader -u http://myserver.com/upload.php file.txt
  file-uploader --include '*.jpg,*.png' --exclude 'thumbs/*' photos/")]
pub struct Args {
    /// Print every upload and scan detail
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors and the final summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Upload endpoint [default: http://localhost/upload.php]
    #[arg(short, long, env = "UPLOADER_URL", value_name = "URL")]
    pub url: Option<String>,

    /// Secret key sent with every request
    #[arg(short, long, env = "UPLOADER_KEY", value_name = "KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Parallel uploads for directories (1-32) [default: 4]
    #[arg(short, long, env = "UPLOADER_JOBS", value_name = "N")]
    pub jobs: Option<usize>,

    /// Jobs buffered between the scanner and the workers [default: 64]
    #[arg(long, value_name = "N")]
    pub queue_capacity: Option<usize>,

    /// Per-request timeout in seconds [default: 300]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Configuration file [default: ~/.config/file_uploader/config.toml]
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Named profile from the profiles/ directory next to the config file
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Comma-separated wildcard patterns a file must match (e.g. "*.txt,*.pdf")
    #[arg(long, value_name = "PATTERNS", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Comma-separated wildcard patterns to skip (e.g. "*.tmp,*.log")
    #[arg(long, value_name = "PATTERNS", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Deepest directory level to walk below the target [default: 10]
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Also append log output to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// List the available profiles and exit
    #[arg(long)]
    pub list_profiles: bool,

    /// List what would be uploaded without contacting the server
    #[arg(long)]
    pub dry_run: bool,

    /// Print the summary (or the dry-run plan) as JSON
    #[arg(long)]
    pub json: bool,

    /// File or directory to upload
    #[arg(value_name = "FILE_OR_DIR", required_unless_present = "list_profiles")]
    pub target: Option<PathBuf>,

    /// Subdirectory on the server
    #[arg(value_name = "SUBDIR", default_value = "")]
    pub subdir: String,
}
