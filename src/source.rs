//! Page sources.
//!
//! The decoder that turns PDF bytes into positioned text and graphics
//! operators lives outside this crate. These traits are the seam: a source
//! reports how many pages it has and hands over one [`PageInput`] at a time.

use log::{info, warn};

use crate::error::{Error, Result};
use crate::model::{DocumentInput, PageInput};
use crate::page::{DocumentLayout, LayoutEngine, PageLayout};

/// Synchronous page decoder.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Decode one page (1-indexed).
    fn load_page(&self, page: u32) -> Result<PageInput>;
}

impl PageSource for DocumentInput {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn load_page(&self, page: u32) -> Result<PageInput> {
        self.pages
            .iter()
            .find(|p| p.page_num == page)
            .cloned()
            .ok_or_else(|| Error::PageOutOfRange(page, self.page_count()))
    }
}

/// Asynchronous page decoder.
#[cfg(feature = "async")]
pub trait AsyncPageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Decode one page (1-indexed).
    fn load_page(&self, page: u32) -> impl std::future::Future<Output = Result<PageInput>> + Send;
}

/// Loaded pages plus placeholders for the ones that failed to load.
struct Loaded {
    pages: Vec<PageInput>,
    failed: Vec<PageLayout>,
}

impl Loaded {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn push(&mut self, page: u32, result: Result<PageInput>) {
        match result {
            Ok(mut input) => {
                input.page_num = page;
                self.pages.push(input);
            }
            Err(e) => {
                warn!("Failed to load page {}: {}", page, e);
                self.failed.push(PageLayout::failed(page));
            }
        }
    }

    fn finish(self, engine: &LayoutEngine) -> DocumentLayout {
        let mut layout = engine.process_pages(&self.pages);
        layout.pages.extend(self.failed);
        layout.pages.sort_by_key(|p| p.page_num);
        layout
    }
}

impl LayoutEngine {
    /// Load every selected page from a source, then process them.
    ///
    /// A page that fails to load comes back empty and marked failed.
    pub fn process_source<S: PageSource + ?Sized>(&self, source: &S) -> DocumentLayout {
        let count = source.page_count();
        info!("Loading {} pages", count);
        let mut loaded = Loaded::new();
        for page in (1..=count).filter(|p| self.options().pages.includes(*p)) {
            if self.cancellation_token().is_cancelled() {
                break;
            }
            loaded.push(page, source.load_page(page));
        }
        loaded.finish(self)
    }

    /// Await each selected page from an async source, then process them on
    /// the blocking pool.
    #[cfg(feature = "async")]
    pub async fn process_source_async<S>(&self, source: &S) -> Result<DocumentLayout>
    where
        S: AsyncPageSource + Sync + ?Sized,
    {
        let count = source.page_count();
        info!("Loading {} pages", count);
        let mut loaded = Loaded::new();
        for page in (1..=count).filter(|p| self.options().pages.includes(*p)) {
            if self.cancellation_token().is_cancelled() {
                break;
            }
            loaded.push(page, source.load_page(page).await);
        }

        let engine = self.clone();
        tokio::task::spawn_blocking(move || loaded.finish(&engine))
            .await
            .map_err(|e| Error::Other(format!("layout task failed: {}", e)))
    }
}
