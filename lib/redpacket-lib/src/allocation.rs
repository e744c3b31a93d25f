//! Converting human-entered amounts into integer base units.
//!
//! Every entry except the last is floored individually; the last entry takes
//! whatever remains of the floored total, so the plan always sums to exactly
//! `floor(sum(amounts) * 10^decimals)`.

use crate::{
    error::{Error, Result},
    whitelist::WhitelistEntry,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use solana_program::pubkey::Pubkey;
use std::str::FromStr;

/// Largest number of decimals whose scale factor fits in `u64`.
pub const MAX_DECIMALS: u8 = 19;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationInput {
    pub claimant: Pubkey,
    pub amount: Decimal,
}

impl AllocationInput {
    pub fn new(claimant: Pubkey, amount: Decimal) -> Self {
        Self { claimant, amount }
    }

    /// Keep the exact binary value of `amount`, `0.1` becomes
    /// `0.1000000000000000055511151231`.
    pub fn from_f64(claimant: Pubkey, amount: f64) -> Result<Self> {
        let amount = Decimal::from_f64_retain(amount)
            .ok_or_else(|| Error::InvalidAmount(amount.to_string()))?;
        Ok(Self { claimant, amount })
    }

    pub fn parse(claimant: Pubkey, amount: &str) -> Result<Self> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|error| Error::InvalidAmount(format!("{amount}: {error}")))?;
        Ok(Self { claimant, amount })
    }
}

fn scale(decimals: u8) -> Result<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(Error::InvalidDecimals(decimals));
    }
    Ok(Decimal::from(10u64.pow(decimals as u32)))
}

fn floor_base_units(amount: Decimal, scale: Decimal) -> Result<u64> {
    amount
        .checked_mul(scale)
        .ok_or(Error::AmountOverflow)?
        .floor()
        .to_u64()
        .ok_or(Error::AmountOverflow)
}

/// UI amount to base units, rounding down.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<u64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::NegativeAmount { index: 0 });
    }
    floor_base_units(amount, scale(decimals)?)
}

/// `floor(sum(amounts) * 10^decimals)`
pub fn expected_total(entries: &[AllocationInput], decimals: u8) -> Result<u64> {
    let sum = entries.iter().try_fold(Decimal::ZERO, |acc, e| {
        acc.checked_add(e.amount).ok_or(Error::AmountOverflow)
    })?;
    floor_base_units(sum, scale(decimals)?)
}

pub fn plan_allocations(entries: &[AllocationInput], decimals: u8) -> Result<Vec<WhitelistEntry>> {
    let (last, init) = entries.split_last().ok_or(Error::EmptyAllocationList)?;
    if let Some(index) = entries
        .iter()
        .position(|e| e.amount.is_sign_negative() && !e.amount.is_zero())
    {
        return Err(Error::NegativeAmount { index });
    }
    let scale = scale(decimals)?;
    let total = expected_total(entries, decimals)?;

    let mut running = 0u64;
    let mut plan = Vec::with_capacity(entries.len());
    for entry in init {
        let amount = floor_base_units(entry.amount, scale)?;
        running = running.checked_add(amount).ok_or(Error::AmountOverflow)?;
        plan.push(WhitelistEntry {
            claimant: entry.claimant,
            amount,
        });
    }
    let remainder = total.checked_sub(running).ok_or(Error::AmountOverflow)?;
    plan.push(WhitelistEntry {
        claimant: last.claimant,
        amount: remainder,
    });
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn key(i: usize) -> Pubkey {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&(i as u64).to_le_bytes());
        Pubkey::new_from_array(bytes)
    }

    fn floats(amounts: &[f64]) -> Vec<AllocationInput> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, a)| AllocationInput::from_f64(key(i), *a).unwrap())
            .collect()
    }

    fn amounts(plan: &[WhitelistEntry]) -> Vec<u64> {
        plan.iter().map(|e| e.amount).collect()
    }

    #[test]
    fn test_equal_tenths() {
        let plan = plan_allocations(&floats(&[0.1, 0.1, 0.1]), 9).unwrap();
        assert_eq!(amounts(&plan), vec![100_000_000; 3]);
        assert_eq!(plan.iter().map(|e| e.amount).sum::<u64>(), 300_000_000);
    }

    #[test]
    fn test_float_loss_goes_to_last() {
        let input = floats(&[0.123, 0.456, 0.789, 0.111, 0.222]);
        let plan = plan_allocations(&input, 9).unwrap();
        assert_eq!(
            amounts(&plan),
            vec![122_999_999, 456_000_000, 789_000_000, 111_000_000, 222_000_001]
        );
        assert_eq!(plan.iter().map(|e| e.amount).sum::<u64>(), 1_701_000_000);
        let naive = to_base_units(input[4].amount, 9).unwrap();
        assert!(plan[4].amount > naive);
        for (i, entry) in plan.iter().enumerate() {
            assert_eq!(entry.claimant, key(i));
        }
    }

    #[test]
    fn test_single_entry_gets_total() {
        let input = vec![AllocationInput::parse(key(0), "12.3456789").unwrap()];
        let plan = plan_allocations(&input, 6).unwrap();
        assert_eq!(amounts(&plan), vec![12_345_678]);

        let input = floats(&[0.3]);
        let plan = plan_allocations(&input, 9).unwrap();
        assert_eq!(plan[0].amount, expected_total(&input, 9).unwrap());
    }

    #[test]
    fn test_exact_decimals() {
        let input = ["1.5", "2.25", "0.000001"]
            .iter()
            .enumerate()
            .map(|(i, a)| AllocationInput::parse(key(i), a).unwrap())
            .collect::<Vec<_>>();
        let plan = plan_allocations(&input, 6).unwrap();
        assert_eq!(amounts(&plan), vec![1_500_000, 2_250_000, 1]);
        let plan = plan_allocations(&input, 0).unwrap();
        assert_eq!(amounts(&plan), vec![1, 2, 0]);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            plan_allocations(&[], 9),
            Err(Error::EmptyAllocationList)
        ));
        let negative = vec![
            AllocationInput::parse(key(0), "1").unwrap(),
            AllocationInput::parse(key(1), "-0.5").unwrap(),
        ];
        assert!(matches!(
            plan_allocations(&negative, 9),
            Err(Error::NegativeAmount { index: 1 })
        ));
        assert!(matches!(
            plan_allocations(&floats(&[1.0]), 20),
            Err(Error::InvalidDecimals(20))
        ));
        let huge = vec![AllocationInput::parse(key(0), "100000000000").unwrap()];
        assert!(matches!(
            plan_allocations(&huge, 19),
            Err(Error::AmountOverflow)
        ));
        assert!(AllocationInput::from_f64(key(0), f64::NAN).is_err());
        assert!(AllocationInput::parse(key(0), "abc").is_err());
    }

    #[test]
    fn test_to_base_units() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert_eq!(to_base_units(d("1"), 9).unwrap(), 1_000_000_000);
        assert_eq!(to_base_units(d("0.0000000019"), 9).unwrap(), 1);
        assert_eq!(to_base_units(d("5.999"), 0).unwrap(), 5);
        assert_eq!(to_base_units(d("18.446744073709551615"), 18).unwrap(), u64::MAX);
        assert!(to_base_units(d("-1"), 9).is_err());
    }

    #[test]
    fn test_random_plans_sum_to_expected_total() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for round in 0..500 {
            let len = rng.gen_range(1..=20);
            let decimals = rng.gen_range(0..=12u8);
            let input = (0..len)
                .map(|i| {
                    if round % 2 == 0 {
                        AllocationInput::from_f64(key(i), rng.gen_range(0.0..1000.0)).unwrap()
                    } else {
                        // at most 20 * 1e10 * 10^(decimals - scale), well inside u64
                        let scale = rng.gen_range(decimals.saturating_sub(7) as u32..=9);
                        let mantissa = rng.gen_range(0..10_000_000_000i64);
                        AllocationInput::new(key(i), Decimal::new(mantissa, scale))
                    }
                })
                .collect::<Vec<_>>();
            let plan = plan_allocations(&input, decimals).unwrap();
            assert_eq!(plan.len(), input.len());
            let sum = plan.iter().map(|e| e.amount).sum::<u64>();
            assert_eq!(sum, expected_total(&input, decimals).unwrap());
            for (entry, alloc) in input.iter().zip(&plan).take(len - 1) {
                assert_eq!(alloc.amount, to_base_units(entry.amount, decimals).unwrap());
            }
        }
    }

    #[test]
    fn test_plan_beyond_u64_overflows() {
        let input = vec![
            AllocationInput::parse(key(0), "397827844.8").unwrap(),
            AllocationInput::parse(key(1), "2781524765").unwrap(),
        ];
        assert!(matches!(
            plan_allocations(&input, 12),
            Err(Error::AmountOverflow)
        ));
        assert!(matches!(expected_total(&input, 12), Err(Error::AmountOverflow)));
        assert!(plan_allocations(&input, 6).is_ok());
    }
}
