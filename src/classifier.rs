use crate::audio::Cue;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

// Danger level radii (meters)
pub const DANGER_RADIUS_M: u32 = 100;
pub const ALERT_RADIUS_M: u32 = 150;
pub const CAUTION_RADIUS_M: u32 = 200;
pub const INTEREST_RADIUS_M: u32 = 500;

/// Five-tier proximity level, used for logging and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DangerLevel {
    Safe,
    Interest,
    Caution,
    Alert,
    Danger,
}

impl Display for DangerLevel {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            DangerLevel::Safe => "SAFE",
            DangerLevel::Interest => "INTEREST",
            DangerLevel::Caution => "CAUTION",
            DangerLevel::Alert => "ALERT",
            DangerLevel::Danger => "DANGER",
        };
        write!(f, "{}", name)
    }
}

/// Coarse distance grouping that selects the audio cue.
///
/// Boundaries are 150/200/500, not the 100/150/200/500 of [`DangerLevel`]:
/// a distance of 120 is `Alert` but still announced as `Le150`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnnouncementBucket {
    Safe,
    Le150,
    Le200,
    Le500,
}

impl AnnouncementBucket {
    pub fn cue(self) -> Cue {
        match self {
            AnnouncementBucket::Safe => Cue::SafeArea,
            AnnouncementBucket::Le150 => Cue::Danger150m,
            AnnouncementBucket::Le200 => Cue::Danger200m,
            AnnouncementBucket::Le500 => Cue::Danger500m,
        }
    }
}

impl Display for AnnouncementBucket {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            AnnouncementBucket::Safe => "SAFE",
            AnnouncementBucket::Le150 => "LE150",
            AnnouncementBucket::Le200 => "LE200",
            AnnouncementBucket::Le500 => "LE500",
        };
        write!(f, "{}", name)
    }
}

/// Map a distance in meters to its danger level; absent means `Safe`
pub fn classify(distance: Option<u32>) -> DangerLevel {
    match distance {
        None => DangerLevel::Safe,
        Some(d) if d <= DANGER_RADIUS_M => DangerLevel::Danger,
        Some(d) if d <= ALERT_RADIUS_M => DangerLevel::Alert,
        Some(d) if d <= CAUTION_RADIUS_M => DangerLevel::Caution,
        Some(d) if d <= INTEREST_RADIUS_M => DangerLevel::Interest,
        Some(_) => DangerLevel::Safe,
    }
}

/// Map a distance in meters to its announcement bucket; absent means `Safe`
pub fn bucket(distance: Option<u32>) -> AnnouncementBucket {
    match distance {
        None => AnnouncementBucket::Safe,
        Some(d) if d <= ALERT_RADIUS_M => AnnouncementBucket::Le150,
        Some(d) if d <= CAUTION_RADIUS_M => AnnouncementBucket::Le200,
        Some(d) if d <= INTEREST_RADIUS_M => AnnouncementBucket::Le500,
        Some(_) => AnnouncementBucket::Safe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_table() {
        for d in 0..=1000u32 {
            let expected = match d {
                0..=100 => DangerLevel::Danger,
                101..=150 => DangerLevel::Alert,
                151..=200 => DangerLevel::Caution,
                201..=500 => DangerLevel::Interest,
                _ => DangerLevel::Safe,
            };
            assert_eq!(classify(Some(d)), expected, "distance {}", d);
        }
        assert_eq!(classify(None), DangerLevel::Safe);
        assert_eq!(classify(Some(u32::MAX)), DangerLevel::Safe);
    }

    #[test]
    fn test_bucket_edges() {
        assert_eq!(bucket(Some(0)), AnnouncementBucket::Le150);
        assert_eq!(bucket(Some(150)), AnnouncementBucket::Le150);
        assert_eq!(bucket(Some(151)), AnnouncementBucket::Le200);
        assert_eq!(bucket(Some(200)), AnnouncementBucket::Le200);
        assert_eq!(bucket(Some(201)), AnnouncementBucket::Le500);
        assert_eq!(bucket(Some(500)), AnnouncementBucket::Le500);
        assert_eq!(bucket(Some(501)), AnnouncementBucket::Safe);
        assert_eq!(bucket(None), AnnouncementBucket::Safe);
    }

    #[test]
    fn test_level_and_bucket_disagree_below_150() {
        assert_eq!(classify(Some(120)), DangerLevel::Alert);
        assert_eq!(bucket(Some(120)), AnnouncementBucket::Le150);
        assert_eq!(classify(Some(90)), DangerLevel::Danger);
        assert_eq!(bucket(Some(90)), AnnouncementBucket::Le150);
    }

    #[test]
    fn test_bucket_cues() {
        assert_eq!(AnnouncementBucket::Le150.cue(), Cue::Danger150m);
        assert_eq!(AnnouncementBucket::Le200.cue(), Cue::Danger200m);
        assert_eq!(AnnouncementBucket::Le500.cue(), Cue::Danger500m);
        assert_eq!(AnnouncementBucket::Safe.cue(), Cue::SafeArea);
    }

    #[test]
    fn test_levels_order_by_severity() {
        assert!(DangerLevel::Danger > DangerLevel::Alert);
        assert!(DangerLevel::Interest > DangerLevel::Safe);
        assert_eq!(DangerLevel::Caution.to_string(), "CAUTION");
        assert_eq!(AnnouncementBucket::Le500.to_string(), "LE500");
    }
}
