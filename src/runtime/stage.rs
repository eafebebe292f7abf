use std::{
    sync::Arc,
    thread::JoinHandle,
    time::{Duration, SystemTime},
};

use anyhow::Context as _;

use crate::{foundation::error::DashResult, runtime::clock::Clock};

/// One autonomous pipeline loop.
///
/// A stage owns all of its state; stages share nothing but the filesystem. `tick` performs one
/// cycle and returns how long to wait before the next one. It must not fail: per-item errors
/// are logged inside the cycle.
pub trait Stage: Send {
    /// Stable name used for the thread and the tracing span.
    fn name(&self) -> &str;

    /// Wait before the very first tick.
    fn startup_delay(&self) -> Duration {
        Duration::ZERO
    }

    fn tick(&mut self, now: SystemTime) -> Duration;
}

/// Drive `stage` on the calling thread. Never returns.
pub fn run_stage(stage: &mut dyn Stage, clock: &dyn Clock) {
    let delay = stage.startup_delay();
    if !delay.is_zero() {
        tracing::info!(stage = stage.name(), delay_s = delay.as_secs(), "startup delay");
        clock.sleep(delay);
    }
    loop {
        let span = tracing::info_span!("stage", name = stage.name());
        let wait = {
            let _enter = span.enter();
            stage.tick(clock.now())
        };
        clock.sleep(wait);
    }
}

/// Run `stage` on its own named OS thread.
pub fn spawn_stage(mut stage: Box<dyn Stage>, clock: Arc<dyn Clock>) -> DashResult<JoinHandle<()>> {
    let name = stage.name().to_owned();
    let handle = std::thread::Builder::new()
        .name(format!("kindledash-{name}"))
        .spawn(move || run_stage(stage.as_mut(), clock.as_ref()))
        .with_context(|| format!("spawn stage thread '{name}'"))?;
    tracing::debug!(stage = %name, "stage thread started");
    Ok(handle)
}
