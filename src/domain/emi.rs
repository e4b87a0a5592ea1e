use serde::{Deserialize, Serialize};

/// Fixed plan menu. Rates and down-payment are fractions; processing fees
/// are minor units.
pub const PLAN_MENU: [EmiPlanSpec; 4] = [
    EmiPlanSpec { plan_id: "emi_3m", months: 3, interest_rate: 0.05, processing_fee_minor: 99_00, down_payment_pct: 0.20 },
    EmiPlanSpec { plan_id: "emi_6m", months: 6, interest_rate: 0.08, processing_fee_minor: 199_00, down_payment_pct: 0.15 },
    EmiPlanSpec { plan_id: "emi_9m", months: 9, interest_rate: 0.11, processing_fee_minor: 299_00, down_payment_pct: 0.12 },
    EmiPlanSpec { plan_id: "emi_12m", months: 12, interest_rate: 0.14, processing_fee_minor: 399_00, down_payment_pct: 0.10 },
];

#[derive(Debug, Clone, Copy)]
pub struct EmiPlanSpec {
    pub plan_id: &'static str,
    pub months: u32,
    pub interest_rate: f64,
    pub processing_fee_minor: i64,
    pub down_payment_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmiQuote {
    pub plan_id: &'static str,
    pub months: u32,
    pub interest_rate: f64,
    pub processing_fee_minor: i64,
    pub down_payment_minor: i64,
    pub principal_minor: i64,
    pub interest_minor: i64,
    pub total_amount_minor: i64,
    pub monthly_amount_minor: i64,
    /// Charged up front when enrolling: down payment + processing fee.
    pub initial_charge_minor: i64,
}

/// Schedule snapshot persisted on the payment row so a future recurring-charge
/// worker can resume the plan without recomputing it. Versioned for
/// forward-compatible evolution of the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiSchedule {
    pub schema_version: u32,
    pub plan_id: String,
    pub base_amount_minor: i64,
    pub monthly_amount_minor: i64,
    pub total_amount_minor: i64,
    pub months_total: u32,
    pub months_remaining: u32,
}

pub fn quote(amount_minor: i64, plan: &EmiPlanSpec) -> EmiQuote {
    let down_payment_minor = (amount_minor as f64 * plan.down_payment_pct).round() as i64;
    let principal_minor = amount_minor - down_payment_minor;
    let interest_minor = (principal_minor as f64 * plan.interest_rate).round() as i64;
    let total_amount_minor = amount_minor + interest_minor + plan.processing_fee_minor;
    let monthly_amount_minor = ((principal_minor + interest_minor) as f64 / plan.months as f64).round() as i64;
    EmiQuote {
        plan_id: plan.plan_id,
        months: plan.months,
        interest_rate: plan.interest_rate,
        processing_fee_minor: plan.processing_fee_minor,
        down_payment_minor,
        principal_minor,
        interest_minor,
        total_amount_minor,
        monthly_amount_minor,
        initial_charge_minor: down_payment_minor + plan.processing_fee_minor,
    }
}

pub fn quote_all(amount_minor: i64) -> Vec<EmiQuote> {
    PLAN_MENU.iter().map(|plan| quote(amount_minor, plan)).collect()
}

pub fn find_plan(plan_id: &str) -> Option<&'static EmiPlanSpec> {
    PLAN_MENU.iter().find(|p| p.plan_id == plan_id)
}

pub fn schedule_for(quote: &EmiQuote, base_amount_minor: i64) -> EmiSchedule {
    EmiSchedule {
        schema_version: 1,
        plan_id: quote.plan_id.to_string(),
        base_amount_minor,
        monthly_amount_minor: quote.monthly_amount_minor,
        total_amount_minor: quote.total_amount_minor,
        months_total: quote.months,
        months_remaining: quote.months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_month_quote_matches_worked_example() {
        // ₹12000 on the 6-month plan: 15% down, 8% interest, ₹199 fee.
        let plan = find_plan("emi_6m").unwrap();
        let q = quote(12000_00, plan);
        assert_eq!(q.down_payment_minor, 1800_00);
        assert_eq!(q.principal_minor, 10200_00);
        assert_eq!(q.interest_minor, 816_00);
        assert_eq!(q.total_amount_minor, 13015_00);
        assert_eq!(q.monthly_amount_minor, 1836_00);
        assert_eq!(q.initial_charge_minor, 1999_00);
    }

    #[test]
    fn quotes_are_deterministic() {
        assert_eq!(quote_all(7499_00), quote_all(7499_00));
        assert_eq!(quote_all(7499_00).len(), 4);
    }

    #[test]
    fn schedule_snapshot_starts_with_full_tenor() {
        let q = quote(12000_00, find_plan("emi_12m").unwrap());
        let s = schedule_for(&q, 12000_00);
        assert_eq!(s.schema_version, 1);
        assert_eq!(s.months_remaining, 12);
        assert_eq!(s.monthly_amount_minor, q.monthly_amount_minor);
    }

    #[test]
    fn unknown_plan_id_is_rejected() {
        assert!(find_plan("emi_24m").is_none());
    }
}
