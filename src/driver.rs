//! Real-time driver for [`MotionSimulator`].
//!
//! Spawns a tokio task that feeds wall-clock frame deltas into
//! [`MotionSimulator::advance`]. Pausing or resetting aborts that task and waits for
//! it, so once `pause`/`reset` return no frame can touch the simulator again.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::simulation::{MotionSimulator, SimulationState};

pub struct SimulationDriver {
    simulator: Arc<Mutex<MotionSimulator>>,
    frame_interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl SimulationDriver {
    /// Take ownership of `simulator`. `frame_interval` is the advance cadence
    /// (e.g. 16ms for ~60fps).
    pub fn new(simulator: MotionSimulator, frame_interval: Duration) -> Self {
        Self {
            simulator: Arc::new(Mutex::new(simulator)),
            frame_interval,
            task: None,
        }
    }

    /// Shared handle, e.g. for subscribing or changing speed mid-run.
    pub fn simulator(&self) -> Arc<Mutex<MotionSimulator>> {
        Arc::clone(&self.simulator)
    }

    pub async fn state(&self) -> SimulationState {
        *self.simulator.lock().await.state()
    }

    /// Whether the frame task is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start playback and the frame task. Must be called within a tokio runtime.
    pub async fn play(&mut self) {
        self.stop_frames().await;

        {
            let mut sim = self.simulator.lock().await;
            sim.play();
            if !sim.state().is_playing {
                return;
            }
        }

        let simulator = Arc::clone(&self.simulator);
        let frame_interval = self.frame_interval;
        self.task = Some(tokio::spawn(run_frames(simulator, frame_interval)));
    }

    pub async fn pause(&mut self) {
        self.stop_frames().await;
        self.simulator.lock().await.pause();
    }

    pub async fn reset(&mut self, to_index: usize) {
        self.stop_frames().await;
        self.simulator.lock().await.reset(to_index);
    }

    async fn stop_frames(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    debug!("[Simulation] Frame task ended abnormally: {}", e);
                }
            }
        }
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_frames(simulator: Arc<Mutex<MotionSimulator>>, frame_interval: Duration) {
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;
    let mut last = Instant::now();

    loop {
        ticker.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        let mut sim = simulator.lock().await;
        if sim.advance(dt).is_none() || !sim.state().is_playing {
            break;
        }
    }

    debug!("[Simulation] Frame task finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_trail_points, GpsPoint, SimulationConfig, SimulationEvent};

    fn simulator(n: usize) -> MotionSimulator {
        let trail = build_trail_points(
            &(0..n)
                .map(|i| GpsPoint::new(34.850 + i as f64 * 0.001, -82.40))
                .collect::<Vec<_>>(),
        );
        MotionSimulator::new(trail, SimulationConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_moves_along_trail() {
        let mut driver = SimulationDriver::new(simulator(5), Duration::from_millis(100));

        driver.play().await;
        // ~111m hops at 5.6 m/s: about 20s each
        tokio::time::sleep(Duration::from_secs(30)).await;

        let state = driver.state().await;
        assert!(state.is_playing);
        assert_eq!(state.current_index, 2);
        assert!(driver.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_cancels_frames() {
        let mut driver = SimulationDriver::new(simulator(5), Duration::from_millis(100));
        let moves = Arc::new(std::sync::Mutex::new(0usize));
        let sink = Arc::clone(&moves);
        driver.simulator().lock().await.subscribe(move |e| {
            if matches!(e, SimulationEvent::Moved { .. }) {
                *sink.lock().unwrap() += 1;
            }
        });

        driver.play().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        driver.pause().await;

        let index = driver.state().await.current_index;
        let seen = *moves.lock().unwrap();
        assert!(seen > 0);
        assert!(!driver.is_running());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(driver.state().await.current_index, index);
        assert_eq!(*moves.lock().unwrap(), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_stops_and_moves() {
        let mut driver = SimulationDriver::new(simulator(5), Duration::from_millis(100));

        driver.play().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        driver.reset(0).await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        let state = driver.state().await;
        assert_eq!(state.current_index, 0);
        assert!(!state.is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_task_ends_with_trail() {
        let mut driver = SimulationDriver::new(simulator(3), Duration::from_millis(50));

        driver.play().await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        let state = driver.state().await;
        assert!(!state.is_playing);
        assert_eq!(state.current_index, 2);
        assert!(!driver.is_running());
    }
}
