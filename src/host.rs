use std::{
    cell::RefCell,
    io,
    rc::Rc,
    thread::{self, JoinHandle},
    time::Duration,
};

use actix::prelude::*;
use actix::System;
use log::{error, info, warn};

use task_overlay::{
    LocalBus, OverlayConfig, Result, StatusMessage, TaskState, TaskStatusPresenter,
};

/* -------------------------------------------------------------------------- */
/*                               Overlay widget                               */
/* -------------------------------------------------------------------------- */

type Sink = Box<dyn FnMut(String)>;

/// The on-screen overlay. Its actor context is the UI context: the presenter
/// and the label it writes to never leave it.
pub struct OverlayWidget {
    presenter: TaskStatusPresenter<Sink>,
    label: Rc<RefCell<String>>,
    poll_interval: Duration,
}

impl OverlayWidget {
    /// Creates the widget and attaches its presenter to the bus.
    ///
    /// # Errors
    /// Returns an error if the configured topic cannot be subscribed.
    pub fn attach(bus: &LocalBus, config: &OverlayConfig) -> Result<Self> {
        let label = Rc::new(RefCell::new(String::new()));
        let sink: Sink = {
            let label = Rc::clone(&label);
            Box::new(move |text| *label.borrow_mut() = text)
        };

        Ok(Self {
            presenter: TaskStatusPresenter::attach(bus, &config.topic, sink)?,
            label,
            poll_interval: config.poll_interval,
        })
    }

    fn refresh(&mut self) {
        if self.presenter.pump() == 0 {
            return;
        }

        let text = self.label.borrow();
        println!("Task Info:\n{text}");

        if text.contains(&format!("Task State: {}", TaskState::Finished)) {
            info!("task finished, closing overlay");
            System::current().stop();
        }
    }
}

impl Actor for OverlayWidget {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("overlay watching {}", self.presenter.topic());
        ctx.run_interval(self.poll_interval, |act, _| act.refresh());
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.presenter.dispose();
        if self.presenter.skipped() > 0 {
            warn!("{} malformed status message(s) skipped", self.presenter.skipped());
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                               Task simulation                              */
/* -------------------------------------------------------------------------- */

const TASK_NAME: &str = "station_keeping";
const INITIAL_TICKS: u32 = 2;
const READY_TICKS: u32 = 2;
const RUNNING_TICKS: u32 = 12;
const SCORE_PER_TICK: f64 = 1.25;

/// Produces the status messages of a single simulated task, one per tick.
#[derive(Debug)]
pub struct TaskSimulation {
    tick: u32,
    tick_len: Duration,
    score: f64,
    done: bool,
}

impl TaskSimulation {
    pub fn new(tick_len: Duration) -> Self {
        Self {
            tick: 0,
            tick_len,
            score: 0.0,
            done: false,
        }
    }

    /// Advances one tick.
    ///
    /// # Returns
    /// The status at this tick, or `None` once `Finished` has been reported.
    pub fn step(&mut self) -> Option<StatusMessage> {
        if self.done {
            return None;
        }

        let ready_at = INITIAL_TICKS;
        let running_at = ready_at + READY_TICKS;
        let finished_at = running_at + RUNNING_TICKS;

        let state = match self.tick {
            t if t < ready_at => TaskState::Initial,
            t if t < running_at => TaskState::Ready,
            t if t < finished_at => TaskState::Running,
            _ => TaskState::Finished,
        };

        let elapsed_ticks = self.tick.saturating_sub(running_at).min(RUNNING_TICKS);
        if state == TaskState::Running {
            self.score += SCORE_PER_TICK;
        }

        let msg = StatusMessage {
            name: TASK_NAME.to_string(),
            state,
            ready_time: self.tick_len * ready_at,
            running_time: self.tick_len * running_at,
            elapsed_time: self.tick_len * elapsed_ticks,
            remaining_time: self.tick_len * (RUNNING_TICKS - elapsed_ticks),
            timed_out: state == TaskState::Finished,
            score: self.score,
        };

        self.done = state == TaskState::Finished;
        self.tick += 1;
        Some(msg)
    }
}

/// Publishes a [`TaskSimulation`] on `config.topic`, one message per tick.
///
/// # Errors
/// Returns an io error if the publisher thread cannot be spawned.
pub fn spawn_simulation(bus: LocalBus, config: &OverlayConfig) -> io::Result<JoinHandle<()>> {
    let topic = config.topic.clone();
    let tick = config.tick_interval;

    thread::Builder::new()
        .name("simulation".into())
        .spawn(move || {
            let mut sim = TaskSimulation::new(tick);
            while let Some(msg) = sim.step() {
                match bus.publish_status(&topic, &msg) {
                    Ok(0) => warn!("nobody listening on {topic}"),
                    Ok(_) => {}
                    Err(e) => error!("cannot publish task status: {e}"),
                }
                thread::sleep(tick);
            }
            info!("simulation finished");
        })
}
