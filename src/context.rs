use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{HostingService, NotifierService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub hosting: Arc<dyn HostingService>,
    pub notifier: Arc<dyn NotifierService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        hosting: Arc<dyn HostingService>,
        notifier: Arc<dyn NotifierService>,
    ) -> Self {
        Self {
            config,
            hosting,
            notifier,
        }
    }
}
