//! Batch reconciliation: enrich every pending post, quarantine the ones
//! that keep failing.
//!
//! One pass walks the ids that are eligible when it starts, strictly one at
//! a time. Each fetch goes through the retry policy; whatever happens to one
//! post, the pass moves on to the next. Only failing to list the pending ids
//! aborts a pass.

use log::{error, info, warn};
use tracing::{info_span, Instrument};

use crate::clock::{Clock, SystemClock};
use crate::config::RetryConfig;
use crate::remote::{RemoteError, RemoteSource};
use crate::retry::RetryPolicy;
use crate::store::{RecordStore, StoreError};

use super::progress::{NoopReporter, PassEvent, PassReporter};

#[derive(Debug, Default)]
struct PassTally {
    enriched: usize,
    quarantined: usize,
    store_errors: usize,
}

pub struct Reconciler<S, R, C = SystemClock> {
    store: S,
    remote: R,
    clock: C,
    policy: RetryPolicy<RemoteError>,
}

impl<S, R> Reconciler<S, R, SystemClock>
where
    S: RecordStore,
    R: RemoteSource,
{
    /// Production constructor: wall clock, retry settings from config.
    pub fn from_config(store: S, remote: R, retry: &RetryConfig) -> Self {
        Self::new(store, remote, SystemClock, RetryPolicy::from_config(retry))
    }
}

impl<S, R, C> Reconciler<S, R, C>
where
    S: RecordStore,
    R: RemoteSource,
    C: Clock,
{
    /// The policy's predicate is replaced: only transport failures and
    /// non-2xx statuses are retried.
    pub fn new(store: S, remote: R, clock: C, policy: RetryPolicy<RemoteError>) -> Self {
        Self {
            store,
            remote,
            clock,
            policy: policy.retry_if(RemoteError::is_retryable),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &RetryPolicy<RemoteError> {
        &self.policy
    }

    /// Runs one pass over all eligible posts.
    pub async fn process_pending(&self) -> Result<(), StoreError> {
        self.process_pending_with(&NoopReporter).await
    }

    /// Runs one pass, reporting every per-post outcome to `progress`.
    ///
    /// Returns an error only when the eligible ids cannot be listed; in that
    /// case no post is touched.
    pub async fn process_pending_with(
        &self,
        progress: &dyn PassReporter,
    ) -> Result<(), StoreError> {
        self.run_pass(progress)
            .instrument(info_span!("reconcile_pass"))
            .await
    }

    async fn run_pass(&self, progress: &dyn PassReporter) -> Result<(), StoreError> {
        let ids = self.store.list_eligible_ids().map_err(|e| {
            error!("Could not list posts pending enrichment: {}", e);
            e
        })?;

        info!("Found {} posts pending enrichment", ids.len());

        let mut tally = PassTally::default();
        for id in ids {
            self.process_one(id, progress, &mut tally)
                .instrument(info_span!("post", id))
                .await;
        }

        info!(
            "Pass complete: {} enriched, {} quarantined, {} store write failures",
            tally.enriched, tally.quarantined, tally.store_errors
        );

        Ok(())
    }

    async fn process_one(&self, id: i64, progress: &dyn PassReporter, tally: &mut PassTally) {
        let remote = &self.remote;
        let outcome = self
            .policy
            .execute(
                || remote.fetch(id),
                |attempt| {
                    warn!(
                        "Attempt {} for post {} failed: {}. Retrying in {:?}",
                        attempt.attempt, id, attempt.error, attempt.delay
                    );
                    progress.report(PassEvent::Retry {
                        id,
                        attempt: attempt.attempt,
                        delay: attempt.delay,
                        error: attempt.error.clone(),
                    });
                },
            )
            .await;

        let payload = match outcome {
            Ok(payload) => payload,
            Err(e) => {
                self.quarantine(id, &e.to_string(), progress, tally);
                return;
            }
        };

        let stored = self.store.apply_enrichment(
            id,
            &payload.title,
            &payload.body,
            payload.owner_id,
            self.clock.now(),
        );

        match stored {
            Ok(()) => {
                info!("Post {} processed successfully", id);
                tally.enriched += 1;
                progress.report(PassEvent::Enriched { id });
            }
            Err(e) => {
                self.store_failed(id, &e, progress, tally);
                self.quarantine(id, &e.to_string(), progress, tally);
            }
        }
    }

    /// Marks the post failed and queues it for reprocessing. A failed
    /// `mark_failed` does not stop the queue entry from being attempted.
    fn quarantine(
        &self,
        id: i64,
        message: &str,
        progress: &dyn PassReporter,
        tally: &mut PassTally,
    ) {
        error!(
            "Failed to process post {}: {}. Saving for reprocessing.",
            id, message
        );
        tally.quarantined += 1;
        progress.report(PassEvent::Quarantined {
            id,
            message: message.to_string(),
        });

        if let Err(e) = self.store.mark_failed(id, message, self.clock.now()) {
            self.store_failed(id, &e, progress, tally);
        }

        if let Err(e) = self.store.append_reprocessing(id, self.clock.now()) {
            self.store_failed(id, &e, progress, tally);
        }
    }

    fn store_failed(
        &self,
        id: i64,
        err: &StoreError,
        progress: &dyn PassReporter,
        tally: &mut PassTally,
    ) {
        error!("Store write for post {} failed: {}", id, err);
        tally.store_errors += 1;
        progress.report(PassEvent::StoreWriteFailed {
            id,
            message: err.to_string(),
        });
    }
}
