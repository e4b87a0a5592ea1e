use serde::{Deserialize, Serialize};

/// Commission retained when the platform sourced the student.
pub const PLATFORM_COMMISSION_RATE: f64 = 0.40;
/// Commission when the teacher brought the student via their own referral link.
pub const REFERRAL_COMMISSION_RATE: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcquisitionSource {
    Platform,
    TeacherReferral,
}

impl AcquisitionSource {
    pub fn parse(s: &str) -> Option<AcquisitionSource> {
        match s {
            "PLATFORM" => Some(AcquisitionSource::Platform),
            "TEACHER_REFERRAL" => Some(AcquisitionSource::TeacherReferral),
            _ => None,
        }
    }
}

/// Resolved once at order-creation time and persisted on the payment row so
/// the rate that actually applied stays auditable.
pub fn commission_rate_for(source: AcquisitionSource) -> f64 {
    match source {
        AcquisitionSource::Platform => PLATFORM_COMMISSION_RATE,
        AcquisitionSource::TeacherReferral => REFERRAL_COMMISSION_RATE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevenueSplit {
    pub platform_fee_minor: i64,
    pub teacher_earnings_minor: i64,
}

/// The rounding remainder always lands on the teacher side, so
/// `platform_fee + teacher_earnings == amount` holds exactly.
pub fn split(amount_minor: i64, commission_rate: f64) -> RevenueSplit {
    let platform_fee_minor = (amount_minor as f64 * commission_rate).round() as i64;
    RevenueSplit {
        platform_fee_minor,
        teacher_earnings_minor: amount_minor - platform_fee_minor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_is_exact_at_forty_percent() {
        let s = split(5000_00, 0.4);
        assert_eq!(s.platform_fee_minor, 2000_00);
        assert_eq!(s.teacher_earnings_minor, 3000_00);
        assert_eq!(s.platform_fee_minor + s.teacher_earnings_minor, 5000_00);
    }

    #[test]
    fn remainder_goes_to_teacher() {
        // 0.15 of 999 = 149.85, rounds to 150; teacher keeps 849.
        let s = split(999, 0.15);
        assert_eq!(s.platform_fee_minor, 150);
        assert_eq!(s.teacher_earnings_minor, 849);
        assert_eq!(s.platform_fee_minor + s.teacher_earnings_minor, 999);
    }

    #[test]
    fn sum_is_exact_across_awkward_amounts() {
        for amount in [1, 7, 99, 101, 12345, 99999, 1000000] {
            for rate in [0.0, 0.15, 0.33, 0.4, 1.0] {
                let s = split(amount, rate);
                assert_eq!(s.platform_fee_minor + s.teacher_earnings_minor, amount);
            }
        }
    }

    #[test]
    fn source_maps_to_policy_rate() {
        assert_eq!(commission_rate_for(AcquisitionSource::Platform), 0.40);
        assert_eq!(commission_rate_for(AcquisitionSource::TeacherReferral), 0.15);
    }
}
