//! Pagination engine for comments and replies
//!
//! One traversal walks the pages of a single anchor (a post for comments, a
//! comment for replies): fetch, decode a batch, admit what the budget allows,
//! then follow the anchor's "see more" link. It is an explicit loop over a
//! cursor; each page ends in a [`PaginationStep`].
//!
//! A failure on the first page is returned to the caller. A failure on any
//! later page ends the traversal with [`StopReason::Interrupted`] and keeps
//! everything admitted so far.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{DecodeError, PageDecoder};
use crate::post::{Comment, Reply};
use crate::state::{CollectionBudget, PaginationPhase, PaginationStep, StopReason, ThreadKind};
use crate::{Result, ScrapeError};
use std::collections::HashSet;
use url::Url;

/// Items that are paginated under an anchor
pub trait Paginated: Sized + Send {
    const KIND: ThreadKind;

    /// Decodes one page's batch; `anchor_id` is the post id for comments
    fn decode_batch(
        decoder: &dyn PageDecoder,
        html: &str,
        anchor_id: &str,
    ) -> std::result::Result<Vec<Self>, DecodeError>;
}

impl Paginated for Comment {
    const KIND: ThreadKind = ThreadKind::Comments;

    fn decode_batch(
        decoder: &dyn PageDecoder,
        html: &str,
        anchor_id: &str,
    ) -> std::result::Result<Vec<Self>, DecodeError> {
        decoder.decode_comment_batch(html, anchor_id)
    }
}

impl Paginated for Reply {
    const KIND: ThreadKind = ThreadKind::Replies;

    fn decode_batch(
        decoder: &dyn PageDecoder,
        html: &str,
        _anchor_id: &str,
    ) -> std::result::Result<Vec<Self>, DecodeError> {
        decoder.decode_reply_batch(html)
    }
}

/// Result of one anchor's traversal
#[derive(Debug)]
pub struct Pagination<T> {
    /// Admitted items, in page order
    pub items: Vec<T>,

    /// Number of pages fetched
    pub pages: usize,

    /// Terminal state
    pub stop: StopReason,
}

/// Admits one decoded batch against the budget and decides what comes next
///
/// `next_link` is only consulted when the whole batch was admitted and the
/// budget still has room. A batch that fills the budget exactly stops with
/// `BudgetExhausted` without following the next link, since the page behind
/// it could not admit anything.
pub fn admit_batch<T>(
    batch: Vec<T>,
    budget: &mut CollectionBudget,
    items: &mut Vec<T>,
    next_link: impl FnOnce() -> Option<Url>,
) -> PaginationStep {
    let batch_len = batch.len();
    let admitted = budget.admit(batch_len);

    if admitted == 0 {
        let reason = if budget.is_exhausted() {
            StopReason::BudgetExhausted
        } else {
            StopReason::NaturalEnd
        };
        return PaginationStep::Stop(reason);
    }

    items.extend(batch.into_iter().take(admitted));

    // Mid-batch exhaustion drops the rest; an exact fit needs no further page
    if admitted < batch_len || budget.is_exhausted() {
        return PaginationStep::Stop(StopReason::BudgetExhausted);
    }

    match next_link() {
        Some(url) => PaginationStep::Continue(url),
        None => PaginationStep::Stop(StopReason::NaturalEnd),
    }
}

/// Drives fetch → decode → admit → continue cycles with one fetcher
pub struct Paginator<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a mut F,
    decoder: &'a dyn PageDecoder,
}

impl<'a, F: PageFetcher + ?Sized> Paginator<'a, F> {
    pub fn new(fetcher: &'a mut F, decoder: &'a dyn PageDecoder) -> Self {
        Self { fetcher, decoder }
    }

    /// Paginates one anchor starting at `seed`
    ///
    /// # Returns
    ///
    /// * `Ok(Pagination)` - Items admitted before a terminal state; this
    ///   includes traversals interrupted after the first page
    /// * `Err(ScrapeError)` - The first page could not be fetched or decoded
    pub async fn run<T: Paginated>(
        &mut self,
        seed: Url,
        anchor_id: &str,
        budget: &mut CollectionBudget,
    ) -> Result<Pagination<T>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut pages = 0;

        if budget.is_exhausted() {
            tracing::debug!("No {} budget for {}, skipping", T::KIND, anchor_id);
            return Ok(Pagination {
                items,
                pages,
                stop: StopReason::BudgetExhausted,
            });
        }

        let mut cursor = seed;
        let stop = loop {
            visited.insert(cursor.to_string());
            pages += 1;

            let step = match self.visit(&cursor, anchor_id, budget, &mut items).await {
                Ok(step) => step,
                Err((phase, err)) if pages == 1 => {
                    tracing::debug!(
                        "First {} page for {} failed while {}: {}",
                        T::KIND,
                        anchor_id,
                        phase,
                        err
                    );
                    return Err(err);
                }
                Err((phase, err)) => {
                    tracing::warn!(
                        "Stopping {} pagination for {} after {} pages: page {} failed while {}: {}",
                        T::KIND,
                        anchor_id,
                        pages - 1,
                        cursor,
                        phase,
                        err
                    );
                    PaginationStep::Stop(StopReason::Interrupted(err))
                }
            };

            match step {
                PaginationStep::Continue(next) if visited.contains(next.as_str()) => {
                    tracing::debug!("Next {} link {} already visited", T::KIND, next);
                    break StopReason::NaturalEnd;
                }
                PaginationStep::Continue(next) => cursor = next,
                PaginationStep::Stop(reason) => break reason,
            }
        };

        tracing::debug!(
            "{} pagination for {} stopped ({}): {} items over {} pages",
            T::KIND,
            anchor_id,
            stop,
            items.len(),
            pages
        );

        Ok(Pagination { items, pages, stop })
    }

    /// Fetches, decodes and admits a single page
    async fn visit<T: Paginated>(
        &mut self,
        url: &Url,
        anchor_id: &str,
        budget: &mut CollectionBudget,
        items: &mut Vec<T>,
    ) -> std::result::Result<PaginationStep, (PaginationPhase, ScrapeError)> {
        let html = self
            .fetcher
            .navigate(url)
            .await
            .map_err(|e| (PaginationPhase::Fetching, e))?;

        let batch = T::decode_batch(self.decoder, &html, anchor_id)
            .map_err(|e| (PaginationPhase::Decoding, e.at(url)))?;
        tracing::debug!("Decoded {} {} from {}", batch.len(), T::KIND, url);

        let decoder = self.decoder;
        Ok(admit_batch(batch, budget, items, || {
            decoder.decode_next_link(&html, anchor_id, T::KIND)
        }))
    }
}
