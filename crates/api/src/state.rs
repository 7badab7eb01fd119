use dnspulse_application::ports::MetricsExporter;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<dyn MetricsExporter>,
}

impl AppState {
    pub fn new(metrics: Arc<dyn MetricsExporter>) -> Self {
        Self { metrics }
    }
}
