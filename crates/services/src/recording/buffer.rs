use quiz_core::model::{LandmarkFrame, LandmarkSnapshot};

/// Snapshots retained during one recording window, in capture order.
///
/// Append-only while recording; emptied when handed to a transport or when
/// the window is abandoned. Sequence numbers keep increasing across windows.
#[derive(Debug, Default)]
pub struct EvidenceBuffer {
    snapshots: Vec<LandmarkSnapshot>,
    next_sequence: u64,
}

impl EvidenceBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags `landmarks` with the next sequence number and appends it.
    pub fn append(&mut self, landmarks: LandmarkFrame, captured_at_ms: i64) -> &LandmarkSnapshot {
        let snapshot = LandmarkSnapshot::new(self.next_sequence, captured_at_ms, landmarks);
        self.next_sequence += 1;
        self.snapshots.push(snapshot);
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Hands every retained snapshot over and leaves the buffer empty.
    #[must_use]
    pub fn drain(&mut self) -> Vec<LandmarkSnapshot> {
        std::mem::take(&mut self.snapshots)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_monotonic_across_drains() {
        let mut buffer = EvidenceBuffer::new();
        buffer.append(LandmarkFrame::default(), 10);
        buffer.append(LandmarkFrame::default(), 20);

        let first = buffer.drain();
        assert!(buffer.is_empty());
        assert_eq!(
            first.iter().map(LandmarkSnapshot::sequence).collect::<Vec<_>>(),
            vec![0, 1]
        );

        let third = buffer.append(LandmarkFrame::default(), 30).sequence();
        assert_eq!(third, 2);
    }

    #[test]
    fn clear_discards_without_handing_over() {
        let mut buffer = EvidenceBuffer::new();
        buffer.append(LandmarkFrame::default(), 1);
        buffer.clear();
        assert_eq!(buffer.len(), 0);
        assert!(buffer.drain().is_empty());
    }
}
