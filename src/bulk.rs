//! Batched operations with per-item fallback.
//!
//! Bulk endpoints (`/v1/users/activate`, `/v1/agents/deactivate`, watchlist
//! member add/remove, ...) accept a list of IDs but fail the whole request
//! when any one ID is bad. [`run_batched`] sends IDs in batches and, when a
//! batch is rejected, retries its IDs one at a time so every good ID is
//! still applied and every bad one is reported.

use std::future::Future;

use crate::error::IncydrError;

/// Result of a bulk operation.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    /// IDs the server accepted.
    pub succeeded: Vec<String>,
    /// IDs that failed on their own, with the error for each.
    pub failures: Vec<(String, IncydrError)>,
}

impl BulkOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs `batch` over chunks of `ids`; on a failed chunk, runs `single` for
/// each of its IDs.
///
/// Never returns early: failures are collected in the outcome.
pub async fn run_batched<B, BFut, S, SFut>(
    ids: &[String],
    batch_size: usize,
    mut batch: B,
    mut single: S,
) -> BulkOutcome
where
    B: FnMut(Vec<String>) -> BFut,
    BFut: Future<Output = crate::error::Result<()>>,
    S: FnMut(String) -> SFut,
    SFut: Future<Output = crate::error::Result<()>>,
{
    let mut outcome = BulkOutcome::default();
    for chunk in ids.chunks(batch_size.max(1)) {
        match batch(chunk.to_vec()).await {
            Ok(()) => outcome.succeeded.extend_from_slice(chunk),
            Err(err) => {
                tracing::warn!(
                    size = chunk.len(),
                    error = %err,
                    "batch rejected, retrying items individually"
                );
                for id in chunk {
                    match single(id.clone()).await {
                        Ok(()) => outcome.succeeded.push(id.clone()),
                        Err(err) => {
                            tracing::debug!(%id, error = %err, "bulk item failed");
                            outcome.failures.push((id.clone(), err));
                        }
                    }
                }
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn all_batches_succeed() {
        let batches = RefCell::new(Vec::new());
        let outcome = run_batched(
            &ids(&["a", "b", "c"]),
            2,
            |chunk| {
                batches.borrow_mut().push(chunk);
                async { Ok(()) }
            },
            |id| async move { Err(IncydrError::Validation(format!("unexpected retry of {id}"))) },
        )
        .await;
        assert!(outcome.is_success());
        assert_eq!(outcome.succeeded, ids(&["a", "b", "c"]));
        assert_eq!(batches.borrow().len(), 2);
    }

    #[tokio::test]
    async fn failed_batch_falls_back_per_item() {
        let outcome = run_batched(
            &ids(&["good-1", "bad", "good-2"]),
            10,
            |_| async { Err(IncydrError::Validation("batch rejected".into())) },
            |id| async move {
                if id == "bad" {
                    Err(IncydrError::Validation(format!("{id} rejected")))
                } else {
                    Ok(())
                }
            },
        )
        .await;
        assert_eq!(outcome.succeeded, ids(&["good-1", "good-2"]));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, "bad");
        assert!(!outcome.is_success());
    }
}
