//! Cross-thread delivery into the UI thread.
//!
//! Two primitives:
//! - [`UiDispatcher`]: post arbitrary callbacks that run on the UI thread
//!   against the UI-owned target (used for pick results).
//! - [`frame_channel`]: a bounded frame queue from the producer. When the UI
//!   falls behind, new frames are dropped instead of queueing up, and the UI
//!   only ever shows the newest frame it has. Status messages ride alongside
//!   on an unbounded queue and are never dropped.

use crate::view::FrameElements;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TryRecvError, TrySendError};
use tracing::{debug, warn};

/// Callback executed on the UI thread.
pub type UiCallback<T> = Box<dyn FnOnce(&mut T) + Send>;

/// UI-thread side of the callback queue.
pub struct UiDispatcher<T> {
    sender: Sender<UiCallback<T>>,
    receiver: Receiver<UiCallback<T>>,
}

impl<T> UiDispatcher<T> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// A handle that may be moved to other threads.
    pub fn poster(&self) -> UiPoster<T> {
        UiPoster {
            sender: self.sender.clone(),
        }
    }

    /// Run every pending callback against `target`, in posting order.
    /// Returns how many ran.
    pub fn drain(&self, target: &mut T) -> usize {
        let mut count = 0;
        while let Ok(callback) = self.receiver.try_recv() {
            callback(target);
            count += 1;
        }
        count
    }
}

impl<T> Default for UiDispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sending side of [`UiDispatcher`].
pub struct UiPoster<T> {
    sender: Sender<UiCallback<T>>,
}

impl<T> Clone for UiPoster<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> UiPoster<T> {
    /// Schedule `callback` for execution on the UI thread.
    ///
    /// Posting after the UI has shut down is a silent no-op.
    pub fn post<F>(&self, callback: F)
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        if self.sender.send(Box::new(callback)).is_err() {
            debug!("UI dispatcher closed; dropping callback");
        }
    }
}

/// Maximum frames waiting for the UI (prevents memory buildup if the UI is slow).
pub const MAX_QUEUED_FRAMES: usize = 2;

/// Create the producer→UI frame queue.
pub fn frame_channel(capacity: usize) -> (FramePoster, FrameReceiver) {
    let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
    let (status_sender, status_receiver) = mpsc::channel();
    (
        FramePoster {
            sender,
            status_sender,
            dropped: 0,
        },
        FrameReceiver {
            receiver,
            status_receiver,
        },
    )
}

/// Producer side of the frame queue.
pub struct FramePoster {
    sender: SyncSender<FrameElements>,
    status_sender: Sender<String>,
    dropped: u64,
}

impl FramePoster {
    /// Hand a frame to the UI thread without blocking. Returns `false` if the
    /// frame was dropped because the UI is behind or gone.
    pub fn deliver_frame(&mut self, elements: FrameElements) -> bool {
        match self.sender.try_send(elements) {
            Ok(()) => true,
            Err(TrySendError::Full(elements)) => {
                self.dropped += 1;
                debug!(
                    "UI busy; dropped frame {} ({} dropped so far)",
                    elements.frame_number, self.dropped
                );
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("UI frame receiver is gone");
                false
            }
        }
    }

    /// Queue a status message for the UI. Unlike frames, these are never
    /// dropped.
    pub fn post_status(&self, text: String) {
        if self.status_sender.send(text).is_err() {
            debug!("UI status receiver is gone");
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// UI side of the frame queue.
pub struct FrameReceiver {
    receiver: Receiver<FrameElements>,
    status_receiver: Receiver<String>,
}

impl FrameReceiver {
    /// Drain the queue and keep only the newest frame.
    pub fn latest(&self) -> Option<FrameElements> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        latest
    }

    /// Every status message posted since the last call, oldest first.
    pub fn statuses(&self) -> Vec<String> {
        self.status_receiver.try_iter().collect()
    }
}
