use crate::errors::{ModelError, Result};
use crate::manager::ModelManager;
use crate::model::Model;
use crate::query_builder::Criteria;
use crate::result_set::HydratingResultSet;

/// Result set that fetches `page_size` rows per query
///
/// The caller's limit and offset describe the whole window; each page is
/// a sub-window of it. A short or empty page ends iteration.
pub struct PaginatedResultSet<'m, T: Model> {
    manager: &'m ModelManager,
    criteria: Criteria,
    page_size: u64,
    page: Option<HydratingResultSet<T>>,
    page_index: u64,
    fetches: usize,
    yielded: u64,
    exhausted: bool,
    count: Option<u64>,
}

impl<'m, T: Model> PaginatedResultSet<'m, T> {
    pub fn new(manager: &'m ModelManager, criteria: Criteria, page_size: u64) -> Result<Self> {
        if page_size == 0 {
            return Err(ModelError::InvalidCriteria(
                "page size must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            manager,
            criteria,
            page_size,
            page: None,
            page_index: 0,
            fetches: 0,
            yielded: 0,
            exhausted: false,
            count: None,
        })
    }

    /// A set that yields nothing and counts zero without querying
    pub(crate) fn empty(manager: &'m ModelManager, criteria: Criteria, page_size: u64) -> Result<Self> {
        let mut pages = Self::new(manager, criteria, page_size)?;
        pages.exhausted = true;
        pages.count = Some(0);
        Ok(pages)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of page queries issued so far
    pub fn page_fetches(&self) -> usize {
        self.fetches
    }

    /// Next object, fetching the next page when the current one runs out
    pub async fn next(&mut self) -> Option<Result<T>> {
        loop {
            if let Some(page) = self.page.as_mut() {
                if let Some(item) = page.next() {
                    self.yielded += 1;
                    return Some(item);
                }
            }

            if self.exhausted {
                return None;
            }

            if let Err(error) = self.fetch_page().await {
                self.exhausted = true;
                return Some(Err(error));
            }
        }
    }

    /// Drain the remaining objects
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut objects = Vec::new();
        while let Some(object) = self.next().await {
            objects.push(object?);
        }
        Ok(objects)
    }

    /// Size of the whole window, counted once and cached
    pub async fn count(&mut self) -> Result<u64> {
        if let Some(count) = self.count {
            return Ok(count);
        }

        let total = self.manager.count_all::<T>(self.criteria.clone()).await?;
        let offset = self.criteria.offset().unwrap_or(0);
        let count = match self.criteria.limit() {
            Some(limit) => limit.min(total.saturating_sub(offset)),
            None => total,
        };

        self.count = Some(count);
        Ok(count)
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let window_offset = self.criteria.offset().unwrap_or(0);
        let consumed = self.page_index * self.page_size;

        let limit = match self.criteria.limit() {
            Some(limit) if consumed >= limit => {
                self.exhausted = true;
                self.page = None;
                return Ok(());
            }
            Some(limit) => self.page_size.min(limit - consumed),
            None => self.page_size,
        };

        let mut criteria = self.criteria.clone();
        criteria.set_limit(Some(limit))?;
        criteria.set_offset(Some(window_offset + consumed));

        debug_log!(
            "[PAGE] {} page {} (limit {}, offset {})",
            T::MODEL_NAME,
            self.page_index,
            limit,
            window_offset + consumed
        );

        let page = self.manager.find_all::<T>(criteria).await?;
        self.fetches += 1;
        self.page_index += 1;
        // A short page, empty included, is the last one
        if (page.len() as u64) < limit {
            self.exhausted = true;
        }
        self.page = Some(page);

        Ok(())
    }
}

impl<T: Model> std::fmt::Debug for PaginatedResultSet<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedResultSet")
            .field("model", &T::MODEL_NAME)
            .field("page_size", &self.page_size)
            .field("page_index", &self.page_index)
            .field("fetches", &self.fetches)
            .field("yielded", &self.yielded)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
