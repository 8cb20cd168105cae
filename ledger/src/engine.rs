//! The ledger engine: holds the store, clock and parameters.
//!
//! The engine keeps no per-user state. Every operation names the acting
//! student explicitly. Mutations run inside one storage batch each, so a
//! rejected or failed operation leaves nothing behind.

use boostly_store::{BatchStore, LedgerAccount, LedgerBatch, LedgerStore, Student, StoreError};
use boostly_types::{Clock, Credits, LedgerParams, PeriodKey, StudentId, SystemClock, Timestamp};
use tracing::{debug, info, warn};

use crate::posting::positive;
use crate::rollover::{ensure_account_in, opening_account};
use crate::LedgerError;

/// Upper bound on display names and roll identifiers.
const MAX_FIELD_LEN: usize = 120;

pub struct LedgerEngine<S, C = SystemClock> {
    store: S,
    clock: C,
    params: LedgerParams,
}

impl<S: LedgerStore> LedgerEngine<S, SystemClock> {
    pub fn new(store: S, params: LedgerParams) -> Self {
        Self::with_clock(store, SystemClock, params)
    }
}

impl<S: LedgerStore, C: Clock> LedgerEngine<S, C> {
    pub fn with_clock(store: S, clock: C, params: LedgerParams) -> Self {
        Self {
            store,
            clock,
            params,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// The calendar month the clock currently falls in.
    pub fn current_period(&self) -> Result<PeriodKey, LedgerError> {
        Ok(PeriodKey::containing(self.now())?)
    }

    /// Register a student together with their opening account.
    pub fn onboard_student(
        &self,
        display_name: &str,
        roll_identifier: &str,
        email: Option<&str>,
    ) -> Result<Student, LedgerError> {
        let result = self.onboard_inner(display_name, roll_identifier, email);
        observe("onboard_student", &result);
        result
    }

    fn onboard_inner(
        &self,
        display_name: &str,
        roll_identifier: &str,
        email: Option<&str>,
    ) -> Result<Student, LedgerError> {
        let display_name = required("display name", display_name)?;
        let roll = required("roll identifier", roll_identifier)?;
        let email = email.map(str::trim).filter(|e| !e.is_empty());

        let now = self.now();
        let period = PeriodKey::containing(now)?;
        let student = Student {
            id: StudentId::new(),
            display_name,
            roll_identifier: roll.clone(),
            email: email.map(str::to_owned),
            created_at: now,
        };

        let mut batch = self.store.begin()?;
        match batch.insert_student(&student) {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => return Err(LedgerError::RollTaken(roll)),
            Err(e) => return Err(e.into()),
        }
        batch.put_account(&opening_account(student.id, period, &self.params, now))?;
        batch.commit()?;

        info!(
            student = %student.id,
            roll = %student.roll_identifier,
            balance = %self.params.starting_balance,
            "student onboarded"
        );
        Ok(student)
    }

    /// Change a student's display name. The roll identifier never changes.
    pub fn rename_student(
        &self,
        student: &StudentId,
        display_name: &str,
    ) -> Result<Student, LedgerError> {
        let display_name = required("display name", display_name)?;
        let mut batch = self.store.begin()?;
        let mut record = batch
            .get_student(student)?
            .ok_or(LedgerError::AccountNotFound(*student))?;
        if record.display_name == display_name {
            return Ok(record);
        }
        record.display_name = display_name;
        batch.update_student(&record)?;
        batch.commit()?;
        debug!(student = %student, name = %record.display_name, "student renamed");
        Ok(record)
    }

    /// Return the student's account for `period`, creating it if absent.
    ///
    /// Periods that have not started yet are refused, and so are periods
    /// older than the student's latest account.
    pub fn ensure_account(
        &self,
        student: &StudentId,
        period: PeriodKey,
    ) -> Result<LedgerAccount, LedgerError> {
        let result = self.ensure_inner(student, period);
        observe("ensure_account", &result);
        result
    }

    fn ensure_inner(
        &self,
        student: &StudentId,
        period: PeriodKey,
    ) -> Result<LedgerAccount, LedgerError> {
        let now = self.now();
        let current = PeriodKey::containing(now)?;
        if period > current {
            return Err(LedgerError::InvalidInput(format!(
                "period {period} has not started (current period is {current})"
            )));
        }
        let mut batch = self.store.begin()?;
        let account = ensure_account_in(&mut batch, student, period, &self.params, now)?;
        batch.commit()?;
        Ok(account)
    }

    /// Open the current period for the student, carrying balances forward
    /// from their latest account. A no-op if the period is already open.
    ///
    /// Only the period the clock is in can be rolled over to.
    pub fn rollover_period(
        &self,
        student: &StudentId,
        new_period: PeriodKey,
    ) -> Result<LedgerAccount, LedgerError> {
        let current = self.current_period()?;
        if new_period != current {
            let result = Err(LedgerError::InvalidInput(format!(
                "can only roll over to the current period {current}, not {new_period}"
            )));
            observe("rollover_period", &result);
            return result;
        }
        self.ensure_account(student, new_period)
    }

    /// Set the monthly send limit of the student's current period. Later
    /// periods inherit it on rollover.
    pub fn set_monthly_limit(
        &self,
        student: &StudentId,
        limit: i64,
    ) -> Result<LedgerAccount, LedgerError> {
        let result = self.set_limit_inner(student, limit);
        observe("set_monthly_limit", &result);
        result
    }

    fn set_limit_inner(
        &self,
        student: &StudentId,
        limit: i64,
    ) -> Result<LedgerAccount, LedgerError> {
        let limit = Credits::new(positive("monthly_send_limit", limit)?);
        let now = self.now();
        let period = PeriodKey::containing(now)?;

        let mut batch = self.store.begin()?;
        let mut account = ensure_account_in(&mut batch, student, period, &self.params, now)?;
        if limit < account.credits_sent_this_month {
            return Err(LedgerError::InvalidInput(format!(
                "monthly limit {limit} is below the {} credits already sent this month",
                account.credits_sent_this_month
            )));
        }
        account.monthly_send_limit = limit;
        account.updated_at = now;
        batch.put_account(&account)?;
        batch.commit()?;

        info!(student = %student, %limit, period = %period, "monthly limit updated");
        Ok(account)
    }
}

fn required(what: &str, value: &str) -> Result<String, LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LedgerError::InvalidInput(format!("{what} must not be empty")));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(LedgerError::InvalidInput(format!(
            "{what} must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(value.to_owned())
}

/// Log the outcome of a failed operation. Rejections are routine; faults are not.
pub(crate) fn observe<T>(operation: &'static str, result: &Result<T, LedgerError>) {
    if let Err(e) = result {
        if e.is_rejection() {
            debug!(operation, error = %e, "operation rejected");
        } else {
            warn!(operation, error = %e, "operation failed");
        }
    }
}
