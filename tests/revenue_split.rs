use coursepay::domain::split::{commission_rate_for, split, AcquisitionSource};

#[test]
fn five_thousand_at_forty_percent() {
    // ₹5000 with the platform commission: fee 2000, teacher keeps 3000.
    let s = split(5000_00, 0.4);
    assert_eq!(s.platform_fee_minor, 2000_00);
    assert_eq!(s.teacher_earnings_minor, 3000_00);
}

#[test]
fn fee_plus_earnings_always_equals_amount() {
    for amount in [1, 3, 99, 333, 5000_00, 12345_67, 9_99_99_999] {
        for rate in [0.0, 0.1, 0.15, 0.25, 0.333, 0.4, 0.5, 1.0] {
            let s = split(amount, rate);
            assert_eq!(
                s.platform_fee_minor + s.teacher_earnings_minor,
                amount,
                "drift at amount={amount} rate={rate}"
            );
        }
    }
}

#[test]
fn referral_rate_is_lower_than_platform_rate() {
    let platform = commission_rate_for(AcquisitionSource::Platform);
    let referral = commission_rate_for(AcquisitionSource::TeacherReferral);
    assert!(referral < platform);
    let s_platform = split(10000_00, platform);
    let s_referral = split(10000_00, referral);
    assert!(s_referral.teacher_earnings_minor > s_platform.teacher_earnings_minor);
}

#[test]
fn zero_rate_gives_everything_to_teacher() {
    let s = split(777, 0.0);
    assert_eq!(s.platform_fee_minor, 0);
    assert_eq!(s.teacher_earnings_minor, 777);
}

#[test]
fn unknown_source_strings_do_not_parse() {
    assert_eq!(AcquisitionSource::parse("PLATFORM"), Some(AcquisitionSource::Platform));
    assert_eq!(AcquisitionSource::parse("TEACHER_REFERRAL"), Some(AcquisitionSource::TeacherReferral));
    assert_eq!(AcquisitionSource::parse("ORGANIC"), None);
}
