use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::recording::RecordedFrame;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Frame(RecordedFrame),
    Key(KeyEvent),
    Resize,
    Tick,
    ReplayEnded,
}

/// Source of frames and terminal events
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Event source fed by any number of producer threads over a channel
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Forward crossterm key and resize events until the receiver goes away
pub fn spawn_terminal_input(tx: Sender<AppEvent>) {
    thread::spawn(move || loop {
        let sent = match event::read() {
            Ok(CtEvent::Key(key)) => tx.send(AppEvent::Key(key)),
            Ok(CtEvent::Resize(_, _)) => tx.send(AppEvent::Resize),
            Ok(_) => Ok(()),
            Err(_) => break,
        };
        if sent.is_err() {
            break;
        }
    });
}

/// Play recorded frames in real time, scaled by `speed`
pub fn spawn_replay(tx: Sender<AppEvent>, frames: Vec<RecordedFrame>, speed: f64) {
    let speed = if speed > 0.0 { speed } else { 1.0 };
    thread::spawn(move || {
        let origin = Instant::now();
        let first_ms = frames.first().map_or(0, |f| f.t_ms);
        for frame in frames {
            let offset = Duration::from_millis(frame.t_ms.saturating_sub(first_ms)).div_f64(speed);
            let due = origin + offset;
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
            if tx.send(AppEvent::Frame(frame)).is_err() {
                return;
            }
        }
        let _ = tx.send(AppEvent::ReplayEnded);
    });
}

/// Monotonic session clock, optionally running faster than wall time
#[derive(Clone, Copy, Debug)]
pub struct SessionClock {
    origin: Instant,
    speed: f64,
}

impl SessionClock {
    pub fn new(speed: f64) -> Self {
        Self::starting_at(Instant::now(), speed)
    }

    pub fn starting_at(origin: Instant, speed: f64) -> Self {
        Self {
            origin,
            speed: if speed > 0.0 { speed } else { 1.0 },
        }
    }

    pub fn now(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, at: Instant) -> Duration {
        at.saturating_duration_since(self.origin).mul_f64(self.speed)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = ChannelEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        match runner.step() {
            AppEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let es = ChannelEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            AppEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn replay_delivers_frames_in_order_then_ends() {
        let (tx, rx) = mpsc::channel();
        let frames = vec![
            RecordedFrame::frame(0, None),
            RecordedFrame::frame(20, None),
            RecordedFrame::frame(40, None),
        ];
        spawn_replay(tx, frames, 4.0);
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(500)),
        );

        let mut seen = vec![];
        loop {
            match runner.step() {
                AppEvent::Frame(f) => seen.push(f.t_ms),
                AppEvent::ReplayEnded => break,
                AppEvent::Tick => panic!("replay stalled"),
                _ => {}
            }
        }
        assert_eq!(seen, vec![0, 20, 40]);
    }

    #[test]
    fn clock_scales_with_speed() {
        let origin = Instant::now();
        let clock = SessionClock::starting_at(origin, 2.0);
        assert_eq!(
            clock.elapsed_at(origin + Duration::from_millis(500)),
            Duration::from_millis(1000)
        );
        // non-positive speeds fall back to real time
        let clock = SessionClock::starting_at(origin, 0.0);
        assert_eq!(
            clock.elapsed_at(origin + Duration::from_millis(500)),
            Duration::from_millis(500)
        );
    }
}
