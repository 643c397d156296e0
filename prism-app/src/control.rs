//! Capture control state shared by the UI thread and the producer thread.
//!
//! All flags live behind one mutex, paired with a condition variable (the
//! capture gate) the producer parks on while capture is disabled. The UI thread
//! only ever mutates the flags through [`CaptureCommand`]s; the producer reads
//! them once per iteration through [`CaptureControl::begin_tick`], which also
//! consumes the one-shot save requests.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// The raw flag set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureFlags {
    pub capture: bool,
    pub record: bool,
    pub exit: bool,
    pub save_pcd: bool,
    pub save_rgbd: bool,
    pub normals: bool,
    pub model_init: bool,
}

/// What a one-shot save request writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    PointCloud,
    Rgbd,
}

/// A single mutation of the capture flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    /// Enable capture and wake a parked producer.
    Start,
    /// Disable capture; the producer parks at its next iteration.
    Stop,
    Record(bool),
    /// Request shutdown and wake every waiter.
    Exit,
    SaveOnce(SaveKind),
    Normals(bool),
    ModelInit(bool),
}

/// How a wait on the gate ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Capture,
    Exit,
}

/// The producer's view of the flags for one loop iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tick {
    /// Recording only takes effect while capturing.
    pub record: bool,
    pub normals: bool,
    pub model_init: bool,
    pub save_pcd: bool,
    pub save_rgbd: bool,
}

/// Flag set plus capture gate.
#[derive(Debug, Default)]
pub struct CaptureControl {
    flags: Mutex<CaptureFlags>,
    gate: Condvar,
}

impl CaptureControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CaptureFlags> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a command under the gate mutex.
    pub fn apply(&self, command: CaptureCommand) {
        let mut flags = self.lock();
        match command {
            CaptureCommand::Start => {
                flags.capture = true;
                self.gate.notify_one();
            }
            CaptureCommand::Stop => flags.capture = false,
            CaptureCommand::Record(on) => flags.record = on,
            CaptureCommand::Exit => {
                flags.exit = true;
                self.gate.notify_all();
            }
            CaptureCommand::SaveOnce(SaveKind::PointCloud) => flags.save_pcd = true,
            CaptureCommand::SaveOnce(SaveKind::Rgbd) => flags.save_rgbd = true,
            CaptureCommand::Normals(on) => flags.normals = on,
            CaptureCommand::ModelInit(on) => flags.model_init = on,
        }
        debug!("Capture command {:?} -> {:?}", command, *flags);
    }

    /// Snapshot of the current flags.
    pub fn flags(&self) -> CaptureFlags {
        *self.lock()
    }

    pub fn exit_requested(&self) -> bool {
        self.lock().exit
    }

    /// Run `f` with the flags locked, unless exit has been requested.
    ///
    /// An exit applied concurrently lands either before `f` (which then does
    /// not run) or after it returns.
    pub fn unless_exit<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let flags = self.lock();
        if flags.exit {
            return None;
        }
        let result = f();
        drop(flags);
        Some(result)
    }

    /// Block while capture is disabled and no exit has been requested.
    pub fn wait_for_capture(&self) -> GateOutcome {
        let flags = self
            .gate
            .wait_while(self.lock(), |f| !f.capture && !f.exit)
            .unwrap_or_else(PoisonError::into_inner);
        if flags.exit {
            GateOutcome::Exit
        } else {
            GateOutcome::Capture
        }
    }

    /// Take the flags for one producer iteration, clearing the one-shot saves.
    ///
    /// Returns `None` once exit has been requested.
    pub fn begin_tick(&self) -> Option<Tick> {
        let mut flags = self.lock();
        if flags.exit {
            return None;
        }
        let tick = Tick {
            record: flags.record && flags.capture,
            normals: flags.normals,
            model_init: flags.model_init,
            save_pcd: std::mem::take(&mut flags.save_pcd),
            save_rgbd: std::mem::take(&mut flags.save_rgbd),
        };
        Some(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_save_requests_are_consumed_once() {
        let control = CaptureControl::new();
        control.apply(CaptureCommand::SaveOnce(SaveKind::PointCloud));
        control.apply(CaptureCommand::SaveOnce(SaveKind::PointCloud));

        let first = control.begin_tick().unwrap();
        assert!(first.save_pcd);
        assert!(!first.save_rgbd);
        let second = control.begin_tick().unwrap();
        assert!(!second.save_pcd);
    }

    #[test]
    fn test_record_needs_capture() {
        let control = CaptureControl::new();
        control.apply(CaptureCommand::Record(true));
        assert!(!control.begin_tick().unwrap().record);
        control.apply(CaptureCommand::Start);
        assert!(control.begin_tick().unwrap().record);
    }

    #[test]
    fn test_no_tick_after_exit() {
        let control = CaptureControl::new();
        control.apply(CaptureCommand::Exit);
        assert!(control.begin_tick().is_none());
        assert!(control.exit_requested());
    }

    #[test]
    fn test_unless_exit_holds_off_a_concurrent_exit() {
        let control = Arc::new(CaptureControl::new());
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let worker = {
            let control = control.clone();
            thread::spawn(move || {
                control.unless_exit(|| {
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    "delivered"
                })
            })
        };

        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let exiter = {
            let control = control.clone();
            thread::spawn(move || control.apply(CaptureCommand::Exit))
        };
        // Exit blocks on the lock until the delivery finishes.
        thread::sleep(Duration::from_millis(20));
        assert!(!exiter.is_finished());

        release_tx.send(()).unwrap();
        assert_eq!(worker.join().unwrap(), Some("delivered"));
        exiter.join().unwrap();
        assert_eq!(control.unless_exit(|| "delivered"), None);
    }

    #[test]
    fn test_start_wakes_parked_producer() {
        let control = Arc::new(CaptureControl::new());
        let (tx, rx) = mpsc::channel();
        let worker = {
            let control = control.clone();
            thread::spawn(move || {
                let outcome = control.wait_for_capture();
                tx.send((outcome, control.begin_tick())).unwrap();
            })
        };

        // Parked: nothing arrives while capture is off.
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        control.apply(CaptureCommand::Normals(true));
        control.apply(CaptureCommand::Start);
        let (outcome, tick) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome, GateOutcome::Capture);
        assert!(tick.unwrap().normals);
        worker.join().unwrap();
    }

    #[test]
    fn test_exit_wakes_every_waiter() {
        let control = Arc::new(CaptureControl::new());
        let (tx, rx) = mpsc::channel();
        let workers: Vec<_> = (0..3)
            .map(|_| {
                let control = control.clone();
                let tx = tx.clone();
                thread::spawn(move || tx.send(control.wait_for_capture()).unwrap())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        control.apply(CaptureCommand::Exit);
        for _ in 0..3 {
            let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(outcome, GateOutcome::Exit);
        }
        for worker in workers {
            worker.join().unwrap();
        }
    }
}
