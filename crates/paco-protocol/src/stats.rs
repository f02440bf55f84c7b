//! Participant statistics aggregation

use serde::{Deserialize, Serialize};

use crate::model::{ParticipantRecord, ParticipantStats};

/// Number of participants with at least one signal response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantCounts {
    /// Participants that responded today
    pub today: usize,
    /// Participants that responded at any time
    pub total: usize,
}

/// Count participants with a positive today and total signal response count.
///
/// The two counts are independent; a participant active today but with a
/// zero total is still counted in `today`.
pub fn aggregate_participants(records: &[ParticipantRecord]) -> ParticipantCounts {
    records
        .iter()
        .fold(ParticipantCounts::default(), |mut counts, record| {
            if record.today_signal_response_count > 0 {
                counts.today += 1;
            }
            if record.total_signal_response_count > 0 {
                counts.total += 1;
            }
            counts
        })
}

impl ParticipantStats {
    /// Fill in the derived participant counts from `participants`
    #[must_use]
    pub fn with_counts(mut self) -> Self {
        let counts = aggregate_participants(&self.participants);
        self.today_participant_count = counts.today;
        self.total_participant_count = counts.total;
        self
    }

    pub fn counts(&self) -> ParticipantCounts {
        ParticipantCounts {
            today: self.today_participant_count,
            total: self.total_participant_count,
        }
    }
}
