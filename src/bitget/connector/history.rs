use crate::bitget::conversions::fill_from_wire;
use crate::bitget::instrument::InstrumentMeta;
use crate::bitget::rest::BitgetRestClient;
use crate::core::errors::AdapterError;
use crate::core::kernel::RestClient;
use crate::core::time::now_secs;
use crate::core::traits::TradeHistory;
use crate::core::types::{Fill, IncomeRecord};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
/// Page size the income walk requests.
pub const INCOME_PAGE_LIMIT: usize = 50;
/// Hard bound on the income walk, in pages.
pub const MAX_INCOME_PAGES: usize = 100;

/// Fill and income history for one bound instrument.
pub struct History<R: RestClient> {
    rest: Arc<BitgetRestClient<R>>,
    meta: Arc<InstrumentMeta>,
}

impl<R: RestClient> History<R> {
    pub fn new(rest: Arc<BitgetRestClient<R>>, meta: Arc<InstrumentMeta>) -> Self {
        Self { rest, meta }
    }

    async fn fetch_fills_inner(
        &self,
        from_id: Option<i64>,
        start_time: Option<i64>,
    ) -> Result<Vec<Fill>, AdapterError> {
        let last_end_id = from_id.map(|id| (id - 1).max(0));
        let start = match start_time {
            Some(start) => start,
            None => self.rest.get_server_time().await? - DAY_MS,
        };
        // Pin the window end a day ahead of the local clock so late
        // fills inside the trailing window are never excluded
        let end = (now_secs() + 24 * 60 * 60) * 1000;
        let rows = self
            .rest
            .get_order_fills(&self.meta.symbol, last_end_id, start, end)
            .await?;
        rows.iter()
            .map(|row| fill_from_wire(row, &self.meta.quote_coin))
            .collect()
    }
}

/// Walks income pages sequentially until a terminal condition: an empty
/// page, a page echoing the tail of what was already collected, a short
/// page, or the hard page cap. The result is deduplicated by
/// transaction id (last write wins) and sorted ascending by timestamp.
///
/// The venue does not currently expose the income endpoint; this is the
/// pagination contract [`TradeHistory::fetch_income`] will run once it
/// does.
pub async fn collect_income_pages<F, Fut>(
    mut fetch_page: F,
    limit: usize,
    max_pages: usize,
) -> Result<Vec<IncomeRecord>, AdapterError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<IncomeRecord>, AdapterError>>,
{
    let mut income: Vec<IncomeRecord> = Vec::new();
    let mut page = 1;
    while page <= max_pages {
        let fetched = fetch_page(page).await?;
        if fetched.is_empty() {
            break;
        }
        // A page identical to our tail means the venue echoed the last
        // page instead of signaling end-of-data
        if fetched.len() <= income.len() && income[income.len() - fetched.len()..] == fetched[..] {
            break;
        }
        let short_page = fetched.len() < limit;
        income.extend(fetched);
        if short_page {
            break;
        }
        page += 1;
    }

    let mut by_id: BTreeMap<i64, IncomeRecord> = BTreeMap::new();
    for record in income {
        by_id.insert(record.transaction_id, record);
    }
    let mut records: Vec<IncomeRecord> = by_id.into_values().collect();
    records.sort_by_key(|record| record.timestamp);
    Ok(records)
}

#[async_trait]
impl<R: RestClient + 'static> TradeHistory for History<R> {
    async fn fetch_fills(&self, from_id: Option<i64>, start_time: Option<i64>) -> Vec<Fill> {
        match self.fetch_fills_inner(from_id, start_time).await {
            Ok(fills) => fills,
            Err(e) => {
                warn!("Error fetching fills for {}: {}", self.meta.symbol, e);
                Vec::new()
            }
        }
    }

    async fn fetch_income(
        &self,
        _start_time: Option<i64>,
        _end_time: Option<i64>,
    ) -> Result<Vec<IncomeRecord>, AdapterError> {
        Err(AdapterError::NotSupported(
            "income history is not available on this venue".to_string(),
        ))
    }
}
