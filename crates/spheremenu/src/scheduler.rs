/// Host frame loop: the equivalent of `requestAnimationFrame`.
pub trait FrameScheduler {
    /// Asks the host to call [`crate::InfiniteGridMenu::run()`] once more at
    /// the next display refresh.
    fn request_frame(&mut self);
    /// Withdraws any pending frame request. Later calls to
    /// [`FrameScheduler::request_frame()`] may be ignored.
    fn cancel_frame(&mut self);
}

/// Scheduler that counts requests. Useful when the host drives frames
/// itself.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManualScheduler {
    /// Number of frames requested so far.
    pub requested: usize,
    /// Whether a frame is currently requested.
    pub pending: bool,
    /// Whether [`FrameScheduler::cancel_frame()`] has been called.
    pub cancelled: bool,
}
impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.requested += 1;
        self.pending = true;
    }
    fn cancel_frame(&mut self) {
        self.pending = false;
        self.cancelled = true;
    }
}
