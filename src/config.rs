use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_file_size: usize,
    pub upload_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub bulk_job_ttl: Duration,
    pub tally_preview_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_or("PORT", 3000);
        let max_file_size_mb: usize = env_or("MAX_FILE_SIZE_MB", 25);
        let bulk_job_ttl_seconds = env_or("BULK_JOB_TTL_SECONDS", 3600);
        let tally_preview_limit = env_or("TALLY_PREVIEW_LIMIT", 10);

        let work_root = std::env::temp_dir().join("activity-importer");
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| work_root.join("uploads"));
        let scratch_dir = std::env::var("SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| work_root.join("scratch"));

        Self {
            port,
            max_file_size: max_file_size_mb * 1024 * 1024,
            upload_dir,
            scratch_dir,
            bulk_job_ttl: Duration::from_secs(bulk_job_ttl_seconds),
            tally_preview_limit,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
