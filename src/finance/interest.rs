use crate::traits::InterestType;

/// Derived repayment terms for a debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtTerms {
    /// Principal plus interest over the whole tenor.
    pub total: i64,
    /// Monthly installment, when the debt is amortized.
    pub installment: Option<i64>,
}

/// Compute total-with-interest and the monthly installment.
///
/// - `None`: total is the principal, installment is principal / tenor.
/// - `Flat`: total = principal × (1 + rate × tenor), installment = total / tenor.
/// - `Daily`: total = principal × (1 + rate × tenor × 30). Daily-interest
///   debts are never amortized into installments.
///
/// A missing tenor counts as one month for interest and yields no installment.
pub fn compute_terms(
    principal: i64,
    rate: f64,
    interest_type: InterestType,
    tenor_months: Option<u32>,
) -> DebtTerms {
    let tenor = tenor_months.filter(|t| *t > 0);
    let months = tenor.unwrap_or(1) as f64;
    let principal_f = principal as f64;

    match interest_type {
        InterestType::None => DebtTerms {
            total: principal,
            installment: tenor.map(|t| (principal_f / t as f64).round() as i64),
        },
        InterestType::Flat => {
            let total = (principal_f * (1.0 + rate * months)).round() as i64;
            DebtTerms {
                total,
                installment: tenor.map(|t| (total as f64 / t as f64).round() as i64),
            }
        }
        InterestType::Daily => DebtTerms {
            total: (principal_f * (1.0 + rate * months * 30.0)).round() as i64,
            installment: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_interest_six_months() {
        let terms = compute_terms(1_500_000, 0.02, InterestType::Flat, Some(6));
        assert_eq!(terms.total, 1_680_000);
        assert_eq!(terms.installment, Some(280_000));
    }

    #[test]
    fn daily_interest_one_month_has_no_installment() {
        let terms = compute_terms(500_000, 0.001, InterestType::Daily, Some(1));
        assert_eq!(terms.total, 515_000);
        assert_eq!(terms.installment, None);
    }

    #[test]
    fn no_interest_with_tenor_splits_principal() {
        let terms = compute_terms(1_200_000, 0.0, InterestType::None, Some(4));
        assert_eq!(terms.total, 1_200_000);
        assert_eq!(terms.installment, Some(300_000));
    }

    #[test]
    fn no_interest_without_tenor_has_no_installment() {
        let terms = compute_terms(300_000, 0.0, InterestType::None, None);
        assert_eq!(terms.total, 300_000);
        assert_eq!(terms.installment, None);
    }

    #[test]
    fn zero_tenor_is_treated_as_missing() {
        let terms = compute_terms(300_000, 0.05, InterestType::Flat, Some(0));
        assert_eq!(terms.total, 315_000);
        assert_eq!(terms.installment, None);
    }
}
