//! Daily spend tracking for remote processing
//!
//! Remote calls cost real money, so every routed operation passes through
//! a [`CostGuard`] before it leaves the process. The guard keeps a daily
//! ledger that rolls over at local midnight. Charges are reserved up front
//! with [`CostGuard::try_charge`] and refunded when the call fails, which
//! keeps concurrent pipelines from collectively overshooting the budget.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// One ledger entry. Refunds appear as negative amounts so the trail
/// shows both sides of a failed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRecord {
    /// When the charge or refund was recorded
    pub timestamp: DateTime<Local>,
    /// Operation label, e.g. `"background_removal"`
    pub operation: String,
    /// Amount in USD, negative for refunds
    pub cost_usd: f64,
}

/// Snapshot of today's remote spend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    /// Ledger day (local time zone)
    pub day: NaiveDate,
    /// Successful charges today
    pub calls: u64,
    /// Total charged today in USD
    pub total_cost_usd: f64,
    /// Configured daily budget in USD
    pub budget_usd: f64,
    /// Budget still available today in USD
    pub remaining_usd: f64,
}

/// Budget gate consulted before every remote call.
///
/// Implementations must be safe to share across concurrently running
/// pipelines.
pub trait CostGuard: Send + Sync {
    /// Whether any budget remains today
    fn check(&self) -> bool;

    /// Reserve `amount` against today's budget. Returns `false` without
    /// charging when the reservation would exceed the budget.
    fn try_charge(&self, operation: &str, amount: f64) -> bool;

    /// Return a previously reserved amount after a failed call
    fn refund(&self, operation: &str, amount: f64);

    /// Snapshot of today's spend
    fn usage(&self) -> UsageStats;

    /// Clear today's ledger
    fn reset(&self);
}

#[derive(Debug)]
struct Ledger {
    day: NaiveDate,
    total: f64,
    calls: u64,
    entries: Vec<ChargeRecord>,
}

impl Ledger {
    fn new(day: NaiveDate) -> Self {
        Self {
            day,
            total: 0.0,
            calls: 0,
            entries: Vec::new(),
        }
    }

    /// Reset totals when the local date has changed since the last access
    fn rollover(&mut self, today: NaiveDate) {
        if self.day != today {
            log::debug!(
                "Cost ledger rollover: {} -> {} (spent ${:.4} over {} calls)",
                self.day,
                today,
                self.total,
                self.calls
            );
            *self = Ledger::new(today);
        }
    }
}

/// In-process [`CostGuard`] with a fixed daily budget.
///
/// A budget of zero disables remote spending entirely.
#[derive(Debug)]
pub struct DailyCostGuard {
    budget_usd: f64,
    ledger: std::sync::Mutex<Ledger>,
}

impl DailyCostGuard {
    /// Create a guard with the given daily budget in USD
    #[must_use]
    pub fn new(budget_usd: f64) -> Self {
        Self {
            budget_usd: budget_usd.max(0.0),
            ledger: std::sync::Mutex::new(Ledger::new(Local::now().date_naive())),
        }
    }

    /// Today's charge and refund trail, oldest first
    #[must_use]
    pub fn records(&self) -> Vec<ChargeRecord> {
        match self.ledger.lock() {
            Ok(ledger) => ledger.entries.clone(),
            Err(_) => Vec::new(),
        }
    }

    #[cfg(test)]
    fn set_day(&self, day: NaiveDate) {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.day = day;
        }
    }
}

impl CostGuard for DailyCostGuard {
    fn check(&self) -> bool {
        match self.ledger.lock() {
            Ok(mut ledger) => {
                ledger.rollover(Local::now().date_naive());
                ledger.total < self.budget_usd
            },
            // A poisoned ledger cannot prove budget remains, so deny
            Err(_) => false,
        }
    }

    fn try_charge(&self, operation: &str, amount: f64) -> bool {
        let mut ledger = match self.ledger.lock() {
            Ok(ledger) => ledger,
            Err(_) => return false,
        };
        ledger.rollover(Local::now().date_naive());

        if ledger.total + amount > self.budget_usd {
            log::warn!(
                "Daily budget would be exceeded: ${:.4} + ${:.4} > ${:.4}, denying {}",
                ledger.total,
                amount,
                self.budget_usd,
                operation
            );
            return false;
        }

        ledger.total += amount;
        ledger.calls += 1;
        ledger.entries.push(ChargeRecord {
            timestamp: Local::now(),
            operation: operation.to_string(),
            cost_usd: amount,
        });
        log::debug!(
            "Charged ${:.4} for {} (today: ${:.4} of ${:.4})",
            amount,
            operation,
            ledger.total,
            self.budget_usd
        );
        true
    }

    fn refund(&self, operation: &str, amount: f64) {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.rollover(Local::now().date_naive());
            ledger.total = (ledger.total - amount).max(0.0);
            ledger.entries.push(ChargeRecord {
                timestamp: Local::now(),
                operation: operation.to_string(),
                cost_usd: -amount,
            });
            log::debug!(
                "Refunded ${:.4} for {} (today: ${:.4})",
                amount,
                operation,
                ledger.total
            );
        }
    }

    fn usage(&self) -> UsageStats {
        match self.ledger.lock() {
            Ok(mut ledger) => {
                ledger.rollover(Local::now().date_naive());
                UsageStats {
                    day: ledger.day,
                    calls: ledger.calls,
                    total_cost_usd: ledger.total,
                    budget_usd: self.budget_usd,
                    remaining_usd: (self.budget_usd - ledger.total).max(0.0),
                }
            },
            Err(_) => UsageStats {
                day: Local::now().date_naive(),
                calls: 0,
                total_cost_usd: 0.0,
                budget_usd: self.budget_usd,
                remaining_usd: 0.0,
            },
        }
    }

    fn reset(&self) {
        if let Ok(mut ledger) = self.ledger.lock() {
            *ledger = Ledger::new(Local::now().date_naive());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_charge_within_budget() {
        let guard = DailyCostGuard::new(1.0);
        assert!(guard.check());
        assert!(guard.try_charge("upscaling", 0.04));
        assert!(guard.try_charge("background_removal", 0.01));

        let usage = guard.usage();
        assert_eq!(usage.calls, 2);
        assert!((usage.total_cost_usd - 0.05).abs() < 1e-12);
        assert!((usage.remaining_usd - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_charge_exceeding_budget_denied() {
        let guard = DailyCostGuard::new(0.05);
        assert!(guard.try_charge("upscaling", 0.04));
        // 0.04 + 0.04 > 0.05
        assert!(!guard.try_charge("upscaling", 0.04));
        // A smaller charge that still fits is allowed
        assert!(guard.try_charge("background_removal", 0.01));
        assert_eq!(guard.usage().calls, 2);
    }

    #[test]
    fn test_check_is_strict_at_budget() {
        let guard = DailyCostGuard::new(0.04);
        assert!(guard.try_charge("upscaling", 0.04));
        assert!(!guard.check());
        assert!((guard.usage().remaining_usd).abs() < 1e-12);
    }

    #[test]
    fn test_refund_restores_capacity() {
        let guard = DailyCostGuard::new(0.04);
        assert!(guard.try_charge("upscaling", 0.04));
        assert!(!guard.check());
        guard.refund("upscaling", 0.04);
        assert!(guard.check());
        assert!(guard.try_charge("upscaling", 0.04));

        // Trail shows charge, refund, charge
        let records = guard.records();
        assert_eq!(records.len(), 3);
        assert!(records[1].cost_usd < 0.0);
    }

    #[test]
    fn test_zero_budget_blocks_everything() {
        let guard = DailyCostGuard::new(0.0);
        assert!(!guard.check());
        assert!(!guard.try_charge("lighting", 0.01));
        assert_eq!(guard.usage().calls, 0);
    }

    #[test]
    fn test_day_rollover_clears_ledger() {
        let guard = DailyCostGuard::new(0.05);
        assert!(guard.try_charge("upscaling", 0.04));
        assert!(!guard.try_charge("upscaling", 0.04));

        let yesterday = Local::now().date_naive() - Duration::days(1);
        guard.set_day(yesterday);

        // Next access rolls the ledger to today and frees the budget
        assert!(guard.try_charge("upscaling", 0.04));
        let usage = guard.usage();
        assert_eq!(usage.calls, 1);
        assert_eq!(usage.day, Local::now().date_naive());
    }

    #[test]
    fn test_reset() {
        let guard = DailyCostGuard::new(0.05);
        assert!(guard.try_charge("upscaling", 0.04));
        guard.reset();
        let usage = guard.usage();
        assert_eq!(usage.calls, 0);
        assert!(usage.total_cost_usd.abs() < 1e-12);
        assert!(guard.records().is_empty());
    }

    #[test]
    fn test_guard_is_shareable() {
        let guard = std::sync::Arc::new(DailyCostGuard::new(1.0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let g = std::sync::Arc::clone(&guard);
            handles.push(std::thread::spawn(move || {
                for _ in 0..10 {
                    g.try_charge("upscaling", 0.01);
                }
            }));
        }
        for handle in handles {
            let _ = handle.join();
        }
        let usage = guard.usage();
        assert_eq!(usage.calls, 40);
        assert!((usage.total_cost_usd - 0.40).abs() < 1e-9);
    }
}
