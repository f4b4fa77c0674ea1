use std::cell::Cell;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

/// Creates the two halves that coordinate a driver with its event thread.
///
/// The driver keeps the [`ShutdownHandle`]; the event thread takes the
/// [`ShutdownToken`].
pub fn shutdown_pair() -> (ShutdownHandle, ShutdownToken) {
    let (stop_tx, stop_rx) = bounded(1);
    let (done_tx, done_rx) = bounded(1);
    (
        ShutdownHandle { stop: stop_tx, done: done_rx, finished: Cell::new(false) },
        ShutdownToken { stop: stop_rx, stopped: Cell::new(false), done: Some(done_tx) },
    )
}

/// Driver side: asks the loop to stop and waits for it to finish.
pub struct ShutdownHandle {
    stop: Sender<()>,
    done: Receiver<()>,
    finished: Cell<bool>,
}

impl ShutdownHandle {
    /// Signals the loop. The loop still has to be woken if it is blocked on I/O.
    #[inline]
    pub fn request(&self) {
        let _ = self.stop.try_send(());
    }

    /// Blocks until the loop has completed (or its thread is gone).
    #[inline]
    pub fn wait(&self) {
        if !self.finished.get() {
            let _ = self.done.recv();
            self.finished.set(true);
        }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        if !self.finished.get() && !matches!(self.done.try_recv(), Err(TryRecvError::Empty)) {
            self.finished.set(true);
        }
        self.finished.get()
    }
}

/// Loop side: observes the stop request and reports completion.
///
/// Completion is reported when the token is dropped, so a loop that exits
/// early (lost connection, panic) still unblocks the driver.
pub struct ShutdownToken {
    stop: Receiver<()>,
    stopped: Cell<bool>,
    done: Option<Sender<()>>,
}

impl ShutdownToken {
    /// True once stop was requested or the handle was dropped.
    #[inline]
    pub fn is_requested(&self) -> bool {
        if !self.stopped.get() && !matches!(self.stop.try_recv(), Err(TryRecvError::Empty)) {
            self.stopped.set(true);
        }
        self.stopped.get()
    }

    /// Channel that becomes ready on stop, for `select!` based loops.
    #[inline]
    pub fn stop_receiver(&self) -> &Receiver<()> {
        &self.stop
    }

    #[inline]
    pub fn complete(self) {
        drop(self);
    }
}

impl Drop for ShutdownToken {
    fn drop(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.try_send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn request_is_observed_by_token() {
        let (handle, token) = shutdown_pair();
        assert!(!token.is_requested());
        handle.request();
        assert!(token.is_requested());
        assert!(token.is_requested());
    }

    #[test]
    fn wait_returns_after_loop_completes() {
        let (handle, token) = shutdown_pair();
        let worker = std::thread::spawn(move || {
            while !token.is_requested() {
                std::thread::sleep(Duration::from_millis(1));
            }
            token.complete();
        });

        assert!(!handle.is_done());
        handle.request();
        handle.wait();
        assert!(handle.is_done());
        worker.join().unwrap();
    }

    #[test]
    fn dropped_token_unblocks_wait() {
        let (handle, token) = shutdown_pair();
        std::thread::spawn(move || drop(token)).join().unwrap();
        handle.wait();
        assert!(handle.is_done());
    }

    #[test]
    fn dropped_handle_counts_as_request() {
        let (handle, token) = shutdown_pair();
        drop(handle);
        assert!(token.is_requested());
    }
}
