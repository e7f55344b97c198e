use std::sync::Arc;
use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use crate::bus::{BusAdapter, LocalBus};
use crate::config::Settings;
use crate::dispatcher::RoundRobinDispatcher;
use crate::state_management::DoorRegistry;
use crate::utils::logging;


pub struct AppContext {
    pub settings: Arc<Settings>,
    pub bus: Arc<LocalBus>,
    pub dispatcher: RoundRobinDispatcher,
    /// Keeps the file log writer flushing until the context is dropped
    pub log_guard: Option<WorkerGuard>,
}

pub async fn initialize(locations: &[String]) -> Result<AppContext> {
    let settings = Arc::new(Settings::new()?);
    let log_guard = logging::init_logger(&settings.logging)?;

    let bus = Arc::new(LocalBus::new(&settings.bus));
    let _traffic_logger = bus.spawn_traffic_logger();

    let adapter: Arc<dyn BusAdapter> = Arc::clone(&bus) as Arc<dyn BusAdapter>;
    let registry = DoorRegistry::bootstrap(locations, adapter, &settings.doors).await?;
    info!("Doors on the bus: {:?}", registry.locations());

    let dispatcher = RoundRobinDispatcher::new(registry)?;

    Ok(AppContext {
        settings,
        bus,
        dispatcher,
        log_guard,
    })
}
