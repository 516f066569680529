use anyhow::{anyhow, Context, Result};
use lazyreview_core::{
    default_log_level, init_logging, AppConfig, CalendarProvider, CalendarSyncAdapter,
    JsonFileCatalogRepository, ReviewService,
};
use std::path::Path;

pub type Service = ReviewService<JsonFileCatalogRepository, Box<dyn CalendarProvider>>;

/// Loaded configuration plus the service built from it.
pub struct App {
    pub config: AppConfig,
    pub service: Service,
}

impl App {
    pub fn open(config_path: &Path) -> Result<Self> {
        let config = AppConfig::load(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?;

        if let Some(log_dir) = &config.log_dir {
            let level = config.log_level.as_deref().unwrap_or(default_log_level());
            init_logging(level, log_dir).map_err(|err| anyhow!(err))?;
        }

        let adapter = CalendarSyncAdapter::new(config.calendar_provider(), config.timezone.clone());
        let repo = JsonFileCatalogRepository::new(&config.data_file);
        let service = ReviewService::open(repo, adapter)
            .with_context(|| format!("Failed to open {}", config.data_file.display()))?;

        Ok(Self { config, service })
    }

    /// Whether calendar counts are worth printing.
    pub fn calendar_enabled(&self) -> bool {
        self.service.adapter().provider().provider_id() != "disabled"
    }
}
