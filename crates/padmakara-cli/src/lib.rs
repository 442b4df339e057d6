use chrono::NaiveDate;
use padmakara_core::models::{RetreatDates, RetreatFolder};

/// Retreat folder identifiers shared by the subcommands that address a retreat.
#[derive(Debug, Clone, clap::Args)]
pub struct FolderArgs {
    /// Retreat group name
    #[arg(long)]
    pub group: String,
    /// Place (repeat for several)
    #[arg(long = "place", required = true)]
    pub places: Vec<String>,
    /// Teacher (repeat for several)
    #[arg(long = "teacher", required = true)]
    pub teachers: Vec<String>,
    /// First day of the retreat (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last day of the retreat (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,
}

impl FolderArgs {
    pub fn to_folder(&self) -> anyhow::Result<RetreatFolder> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                anyhow::bail!("--end ({}) is before --start ({})", end, start);
            }
        }
        Ok(RetreatFolder {
            dates: self.start.map(|start| RetreatDates::new(start, self.end)),
            group: self.group.clone(),
            places: self.places.clone(),
            teachers: self.teachers.clone(),
        })
    }
}

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr so stdout stays valid JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
