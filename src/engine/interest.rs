use crate::core::params::ProtocolParams;
use num_bigint::BigUint;

/// Interest owed on a term loan.
///
/// Rates are APRs scaled by `base_lending_interest` (so with the default
/// `10^8`, an `apr` of `10^8` is 1% per year). All arithmetic is
/// truncating integer arithmetic in the written order; never substitute
/// floating point.
pub struct InterestEngine<'a> {
    params: &'a ProtocolParams,
}

impl<'a> InterestEngine<'a> {
    pub fn new(params: &'a ProtocolParams) -> Self {
        Self { params }
    }

    /// Effective rate for a loan finalized at `finalize_time`.
    ///
    /// The loan started at `liquidation_time - term`. The rate is the mean
    /// of the nominal term rate and the rate of the time actually elapsed:
    /// `apr * (term + actual) / 2 / seconds_per_year`. Repaying early costs
    /// less than a full term. Time differences saturate at zero.
    pub fn interest_rate(
        &self,
        finalize_time: u64,
        liquidation_time: u64,
        term: u64,
        apr: &BigUint,
    ) -> BigUint {
        let start_borrowing_time = liquidation_time.saturating_sub(term);
        let actual_borrowing_time = finalize_time.saturating_sub(start_borrowing_time);
        let period = BigUint::from(term) + BigUint::from(actual_borrowing_time);
        apr * period / 2u32 / self.params.seconds_per_year
    }

    /// Principal plus interest due at `finalize_time`:
    /// `principal * (base + rate) / base` with `base = base_lending_interest * 100`.
    pub fn repayment_value(
        &self,
        finalize_time: u64,
        liquidation_time: u64,
        term: u64,
        apr: &BigUint,
        principal: &BigUint,
    ) -> BigUint {
        let rate = self.interest_rate(finalize_time, liquidation_time, term, apr);
        let base_decimal = &self.params.base_lending_interest * 100u32;
        principal * (&base_decimal + rate) / base_decimal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    const DAY: u64 = 86_400;

    fn n(v: u64) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn test_rate_at_term_end_is_nominal() {
        let params = ProtocolParams::default();
        let engine = InterestEngine::new(&params);
        let apr = n(10) * &params.base_lending_interest; // 10%
        let term = 30 * DAY;
        let liquidation = 1_700_000_000;
        let rate = engine.interest_rate(liquidation, liquidation, term, &apr);
        assert_eq!(rate, &apr * term / params.seconds_per_year);
    }

    #[test]
    fn test_early_repayment_costs_less() {
        let params = ProtocolParams::default();
        let engine = InterestEngine::new(&params);
        let apr = n(10) * &params.base_lending_interest;
        let term = 30 * DAY;
        let liquidation = 1_700_000_000;
        let start = liquidation - term;
        let early = engine.interest_rate(start + 10 * DAY, liquidation, term, &apr);
        let full = engine.interest_rate(liquidation, liquidation, term, &apr);
        assert!(early < full);
        // (30 + 10) / 2 = 20 days worth
        assert_eq!(early, &apr * (40 * DAY) / 2u32 / params.seconds_per_year);
    }

    #[test]
    fn test_rate_full_year() {
        let params = ProtocolParams::default();
        let engine = InterestEngine::new(&params);
        let apr = n(12) * &params.base_lending_interest;
        let year = params.seconds_per_year;
        let rate = engine.interest_rate(2 * year, 2 * year, year, &apr);
        assert_eq!(rate, apr);
    }

    #[test]
    fn test_saturating_times() {
        let params = ProtocolParams::default();
        let engine = InterestEngine::new(&params);
        // finalized before the loan started: actual time is zero
        let rate = engine.interest_rate(0, 100, 10, &n(31_536_000 * 2));
        assert_eq!(rate, n(10));
        assert_eq!(engine.interest_rate(0, 0, 0, &n(1_000)), BigUint::zero());
    }

    #[test]
    fn test_repayment_value() {
        let params = ProtocolParams::default();
        let engine = InterestEngine::new(&params);
        let year = params.seconds_per_year;
        // 10% over a full year
        let apr = n(10) * &params.base_lending_interest;
        let principal = n(1_000_000);
        let value = engine.repayment_value(year, year, year, &apr, &principal);
        assert_eq!(value, n(1_100_000));
    }

    #[test]
    fn test_repayment_truncates() {
        let params = ProtocolParams::default();
        let engine = InterestEngine::new(&params);
        let year = params.seconds_per_year;
        let apr = n(1) * &params.base_lending_interest; // 1%
        // 99 * 1.01 = 99.99 → 99
        assert_eq!(engine.repayment_value(year, year, year, &apr, &n(99)), n(99));
    }
}
