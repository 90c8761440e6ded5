use diesel::prelude::*;
use pushkind_common::repository::errors::RepositoryResult;

use crate::{
    domain::checkout::{
        AttemptResolution, AttemptStatus, CheckoutAttempt, NewCheckoutAttempt,
    },
    models::checkout_attempt::{
        CheckoutAttempt as DbCheckoutAttempt, NewCheckoutAttempt as DbNewCheckoutAttempt,
        ResolveCheckoutAttempt as DbResolveCheckoutAttempt,
    },
    repository::{CheckoutAttemptReader, CheckoutAttemptWriter, DieselRepository},
};

impl CheckoutAttemptReader for DieselRepository {
    fn get_checkout_attempt(&self, reference: &str) -> RepositoryResult<Option<CheckoutAttempt>> {
        use crate::schema::checkout_attempts;

        let mut conn = self.conn()?;
        let attempt = checkout_attempts::table
            .filter(checkout_attempts::reference.eq(reference))
            .first::<DbCheckoutAttempt>(&mut conn)
            .optional()?;

        Ok(attempt.map(Into::into))
    }
}

impl CheckoutAttemptWriter for DieselRepository {
    fn create_checkout_attempt(
        &self,
        new_attempt: &NewCheckoutAttempt,
    ) -> RepositoryResult<CheckoutAttempt> {
        use crate::schema::checkout_attempts;

        let mut conn = self.conn()?;
        let db_new: DbNewCheckoutAttempt = new_attempt.into();

        let created = diesel::insert_into(checkout_attempts::table)
            .values(&db_new)
            .get_result::<DbCheckoutAttempt>(&mut conn)?;

        Ok(created.into())
    }

    fn resolve_checkout_attempt(
        &self,
        reference: &str,
        resolution: &AttemptResolution,
    ) -> RepositoryResult<Option<CheckoutAttempt>> {
        use crate::schema::checkout_attempts;

        let mut conn = self.conn()?;
        let db_updates: DbResolveCheckoutAttempt = resolution.into();

        // Guarded on the open status so concurrent callbacks resolve at most once.
        let target = checkout_attempts::table
            .filter(checkout_attempts::reference.eq(reference))
            .filter(checkout_attempts::status.eq(AttemptStatus::Open.as_str()));

        let updated = diesel::update(target)
            .set(&db_updates)
            .get_result::<DbCheckoutAttempt>(&mut conn)
            .optional()?;

        Ok(updated.map(Into::into))
    }
}
