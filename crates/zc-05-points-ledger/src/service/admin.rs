//! Administrative corrections, multiplier overrides and reconciliation.

use shared_types::{Clock, Multiplier, TaskKind, WalletAddress};
use tracing::{error, info, warn};
use zc_01_ledger_store::{decode, keys, KeyValueStore};

use super::{LedgerService, COMPONENT};
use crate::domain::account::{Account, AuditEntry};
use crate::domain::views::{CreditOutcome, ReconcileReport, ReconcileSummary};
use crate::error::{LedgerError, LedgerResult};

fn require_reason(reason: &str) -> LedgerResult<()> {
    if reason.trim().is_empty() {
        return Err(LedgerError::invalid("a reason is required"));
    }
    Ok(())
}

impl<S, C> LedgerService<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Audited balance adjustment. May be negative but never below zero.
    pub fn apply_correction(
        &self,
        address: &WalletAddress,
        delta: i64,
        reason: &str,
    ) -> LedgerResult<CreditOutcome> {
        require_reason(reason)?;
        if delta == 0 {
            return Err(LedgerError::invalid("correction delta must be non-zero"));
        }

        let outcome = self.in_txn("apply_correction", |txn| {
            let mut locked = txn.lock_account(address)?;
            let new_balance = txn.append_credit(
                &mut locked,
                &TaskKind::Correction,
                delta,
                Some(reason.to_string()),
            )?;
            txn.save_account(&mut locked)?;
            Ok(CreditOutcome {
                credited: true,
                final_amount: delta,
                new_balance,
            })
        })?;

        warn!(
            component = COMPONENT,
            address = %address,
            delta,
            new_balance = outcome.new_balance,
            reason,
            "Balance correction applied"
        );
        Ok(outcome)
    }

    /// Set the multiplier to any value, including lower. Recorded as a
    /// zero-point audit row. Returns the previous multiplier.
    pub fn override_multiplier(
        &self,
        address: &WalletAddress,
        multiplier: Multiplier,
        reason: &str,
    ) -> LedgerResult<Multiplier> {
        require_reason(reason)?;

        let previous = self.in_txn("override_multiplier", |txn| {
            let mut locked = txn.lock_account(address)?;
            let previous = locked.account.multiplier;
            locked.account.multiplier = multiplier;
            txn.append_credit(
                &mut locked,
                &TaskKind::MultiplierOverride,
                0,
                Some(format!("{previous} -> {multiplier}: {reason}")),
            )?;
            txn.save_account(&mut locked)?;
            Ok(previous)
        })?;

        warn!(
            component = COMPONENT,
            address = %address,
            from = %previous,
            to = %multiplier,
            reason,
            "Multiplier overridden"
        );
        Ok(previous)
    }

    /// Compare the stored balance with the audit trail. Reports only.
    ///
    /// Audit rows are only appended under the account row lock, so holding
    /// that lock while scanning pins both sides of the comparison.
    pub fn reconcile(&self, address: &WalletAddress) -> LedgerResult<ReconcileReport> {
        let report = self.in_txn("reconcile", |txn| {
            let locked = txn.lock_account(address)?;
            let account = locked.exists().then_some(&locked.account);
            self.audit_report(address, account)
        })?;
        if !report.is_consistent() {
            error!(
                component = COMPONENT,
                address = %address,
                stored_points = report.stored_points,
                audit_sum = report.audit_sum,
                stored_audit_count = report.stored_audit_count,
                audit_entries = report.audit_entries,
                "Balance does not reconcile with audit trail"
            );
        }
        Ok(report)
    }

    fn audit_report(
        &self,
        address: &WalletAddress,
        account: Option<&Account>,
    ) -> LedgerResult<ReconcileReport> {
        let mut audit_sum: i64 = 0;
        let mut audit_entries = 0u64;
        for (_, value) in self.store.scan_prefix(&keys::audit_prefix(address), None)? {
            let entry: AuditEntry = decode(&value)?;
            audit_sum = audit_sum.saturating_add(entry.points_awarded);
            audit_entries += 1;
        }

        Ok(ReconcileReport {
            address: address.clone(),
            stored_points: account.map_or(0, |a| a.points),
            audit_sum,
            stored_audit_count: account.map_or(0, |a| a.audit_count),
            audit_entries,
        })
    }

    /// Reconcile every account. Returns the mismatches.
    pub fn reconcile_all(&self) -> LedgerResult<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();
        for (_, value) in self.store.scan_prefix(keys::ACCOUNT_PREFIX, None)? {
            let account: Account = decode(&value)?;
            let report = self.reconcile(&account.address)?;
            summary.accounts_checked += 1;
            if !report.is_consistent() {
                summary.mismatches.push(report);
            }
        }
        info!(
            component = COMPONENT,
            accounts = summary.accounts_checked,
            mismatches = summary.mismatches.len(),
            "Reconciliation finished"
        );
        Ok(summary)
    }
}
