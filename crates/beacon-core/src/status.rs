//! Engagement lifecycle status for a tracked entity.

/// Campaign engagement status, on the ordered scale
/// `Sent < Opened < Clicked`.
///
/// A status write must never lower the stored rank: a late open (a mail
/// client pre-fetching images after the user already clicked) must not
/// demote a `Clicked` entity back to `Opened`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EngagementStatus {
    /// Email was sent; no engagement observed yet.
    Sent,
    /// Recipient opened the email (tracking pixel fetched).
    Opened,
    /// Recipient clicked a tracked link.
    Clicked,
}

impl EngagementStatus {
    /// All statuses, in rank order.
    pub const ALL: [EngagementStatus; 3] = [Self::Sent, Self::Opened, Self::Clicked];

    /// Numeric rank on the engagement scale.
    pub fn rank(self) -> u8 {
        match self {
            Self::Sent => 0,
            Self::Opened => 1,
            Self::Clicked => 2,
        }
    }

    /// Statuses of strictly higher rank than `self`.
    ///
    /// A conditional status update writes `self` only when the stored
    /// status is not one of these.
    pub fn higher_ranked(self) -> impl Iterator<Item = EngagementStatus> {
        Self::ALL.into_iter().filter(move |s| s.rank() > self.rank())
    }

    /// Entity timestamp column written together with this status.
    ///
    /// `Sent` is assigned by the send pipeline, not by tracking, so it
    /// carries no timestamp column here.
    pub fn timestamp_column(self) -> Option<&'static str> {
        match self {
            Self::Sent => None,
            Self::Opened => Some("opened_at"),
            Self::Clicked => Some("clicked_at"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_strictly_increasing() {
        assert!(EngagementStatus::Sent.rank() < EngagementStatus::Opened.rank());
        assert!(EngagementStatus::Opened.rank() < EngagementStatus::Clicked.rank());
    }

    #[test]
    fn derived_ordering_matches_rank() {
        assert!(EngagementStatus::Sent < EngagementStatus::Opened);
        assert!(EngagementStatus::Opened < EngagementStatus::Clicked);
    }

    #[test]
    fn higher_ranked_of_opened_is_clicked() {
        let higher: Vec<_> = EngagementStatus::Opened.higher_ranked().collect();
        assert_eq!(higher, vec![EngagementStatus::Clicked]);
    }

    #[test]
    fn higher_ranked_of_clicked_is_empty() {
        assert_eq!(EngagementStatus::Clicked.higher_ranked().count(), 0);
    }

    #[test]
    fn higher_ranked_of_sent_is_both() {
        let higher: Vec<_> = EngagementStatus::Sent.higher_ranked().collect();
        assert_eq!(
            higher,
            vec![EngagementStatus::Opened, EngagementStatus::Clicked]
        );
    }

    #[test]
    fn timestamp_columns() {
        assert_eq!(EngagementStatus::Sent.timestamp_column(), None);
        assert_eq!(
            EngagementStatus::Opened.timestamp_column(),
            Some("opened_at")
        );
        assert_eq!(
            EngagementStatus::Clicked.timestamp_column(),
            Some("clicked_at")
        );
    }
}
