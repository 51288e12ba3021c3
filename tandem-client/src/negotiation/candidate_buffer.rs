use std::collections::VecDeque;
use tandem_core::IceCandidate;

/// Remote ICE candidates that arrived before a remote description was
/// committed. Replayed in arrival order, each exactly once.
#[derive(Debug, Default)]
pub struct CandidateBuffer {
    entries: VecDeque<IceCandidate>,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candidate: IceCandidate) {
        self.entries.push_back(candidate);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Takes every entry out in FIFO order, leaving the buffer empty.
    pub fn drain(&mut self) -> impl Iterator<Item = IceCandidate> + use<> {
        std::mem::take(&mut self.entries).into_iter()
    }

    /// Discards everything; returns how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }
}
