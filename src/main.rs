mod host;

use actix::Actor;
use actix_rt::System;
use anyhow::Context;
use log::{info, warn};

use host::OverlayWidget;
use task_overlay::{LocalBus, OverlayConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = OverlayConfig::from_env()?;
    info!("overlay config: {config:?}");

    let bus = LocalBus::new();
    // Subscribe before anything is published so no status is missed.
    let widget = OverlayWidget::attach(&bus, &config)?;

    let system = System::new();
    let overlay = system.block_on(async move { widget.start() });

    let simulation = host::spawn_simulation(bus, &config).context("cannot start simulation")?;
    system.run().context("overlay system failed")?;
    drop(overlay);

    if simulation.join().is_err() {
        warn!("simulation thread panicked");
    }

    Ok(())
}
