use coursepay::domain::emi::{find_plan, quote, quote_all, schedule_for};

#[test]
fn six_month_plan_on_twelve_thousand() {
    let plan = find_plan("emi_6m").expect("6-month plan exists");
    let q = quote(12000_00, plan);

    assert_eq!(q.down_payment_minor, 1800_00);
    assert_eq!(q.principal_minor, 10200_00);
    assert_eq!(q.interest_minor, 816_00);
    assert_eq!(q.total_amount_minor, 13015_00);
    assert_eq!(q.monthly_amount_minor, 1836_00);
}

#[test]
fn menu_has_four_tenors() {
    let quotes = quote_all(20000_00);
    let months: Vec<u32> = quotes.iter().map(|q| q.months).collect();
    assert_eq!(months, vec![3, 6, 9, 12]);
}

#[test]
fn initial_charge_is_down_payment_plus_fee() {
    for q in quote_all(15000_00) {
        assert_eq!(q.initial_charge_minor, q.down_payment_minor + q.processing_fee_minor);
        assert!(q.initial_charge_minor < q.total_amount_minor);
    }
}

#[test]
fn principal_and_down_payment_partition_the_amount() {
    for q in quote_all(9999_99) {
        assert_eq!(q.down_payment_minor + q.principal_minor, 9999_99);
    }
}

#[test]
fn schedule_serializes_with_version_tag() {
    let plan = find_plan("emi_9m").unwrap();
    let q = quote(18000_00, plan);
    let schedule = schedule_for(&q, 18000_00);
    let v = serde_json::to_value(&schedule).unwrap();
    assert_eq!(v["schema_version"], 1);
    assert_eq!(v["plan_id"], "emi_9m");
    assert_eq!(v["months_remaining"], 9);
    assert_eq!(v["monthly_amount_minor"], q.monthly_amount_minor);
}
