//! Cursor-driven page walking.
//!
//! [`fetch_all`] requests one page at a time, each request depending on the
//! cursor returned by the previous one. It stops when the store stops handing
//! out a next cursor, or when the store hands back the cursor it handed out
//! last time (it is not advancing). There is no page cap: a store that keeps
//! producing fresh cursors keeps the loop running.

use std::future::Future;

use nexus_chat_common::models::Cursor;
use tracing::{debug, warn};

use crate::error::Result;

/// One page as seen by the paginator.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<Cursor>,
    pub total: Option<u64>,
}

/// Why a full walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The last page had no next cursor.
    Exhausted,
    /// The store returned the same next cursor twice in a row.
    Stalled,
}

/// Every item across all pages of a walk.
#[derive(Debug, Clone)]
pub struct Collected<T> {
    pub items: Vec<T>,
    /// Total count reported by the last page (0 when the store omits it).
    pub total: u64,
    pub pages: usize,
    pub termination: Termination,
}

/// Walk every page, starting without a cursor.
///
/// The first failing page aborts the walk and is returned as-is; items from
/// earlier pages are dropped.
pub async fn fetch_all<T, F, Fut>(mut fetch_page: F) -> Result<Collected<T>>
where
    F: FnMut(Option<Cursor>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut cursor: Option<Cursor> = None;
    let mut previous: Option<Cursor> = None;
    let mut items = Vec::new();
    let mut total = 0;
    let mut pages = 0;

    let termination = loop {
        let page = fetch_page(cursor.take()).await?;
        pages += 1;
        debug!(page = pages, records = page.items.len(), next = ?page.next, "fetched page");

        items.extend(page.items);
        total = page.total.unwrap_or(0);

        let Some(next) = page.next else {
            break Termination::Exhausted;
        };
        if previous.as_ref() == Some(&next) {
            warn!(cursor = %next, pages, "store returned a non-advancing cursor, stopping pagination");
            break Termination::Stalled;
        }
        previous = Some(next.clone());
        cursor = Some(next);
    };

    Ok(Collected { items, total, pages, termination })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use std::sync::Mutex;

    fn page(items: &[u32], next: Option<&str>, total: u64) -> Page<u32> {
        Page {
            items: items.to_vec(),
            next: next.map(Cursor::from),
            total: Some(total),
        }
    }

    /// Serves the scripted pages in order and records the cursor of each call.
    struct Script {
        pages: Mutex<Vec<Result<Page<u32>>>>,
        cursors: Mutex<Vec<Option<Cursor>>>,
    }

    impl Script {
        fn new(mut pages: Vec<Result<Page<u32>>>) -> Self {
            pages.reverse();
            Self { pages: Mutex::new(pages), cursors: Mutex::new(Vec::new()) }
        }

        async fn fetch(&self, cursor: Option<Cursor>) -> Result<Page<u32>> {
            self.cursors.lock().unwrap().push(cursor);
            self.pages.lock().unwrap().pop().expect("fetched past the script")
        }
    }

    #[tokio::test]
    async fn test_single_page_without_next() {
        let script = Script::new(vec![Ok(page(&[1, 2], None, 2))]);
        let all = fetch_all(|c| script.fetch(c)).await.unwrap();
        assert_eq!(all.items, vec![1, 2]);
        assert_eq!(all.pages, 1);
        assert_eq!(all.termination, Termination::Exhausted);
        assert_eq!(*script.cursors.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_follows_cursor_until_exhausted() {
        let script = Script::new(vec![
            Ok(page(&[1], Some("c1"), 3)),
            Ok(page(&[2], Some("c2"), 3)),
            Ok(page(&[3], None, 3)),
        ]);
        let all = fetch_all(|c| script.fetch(c)).await.unwrap();
        assert_eq!(all.items, vec![1, 2, 3]);
        assert_eq!(all.total, 3);
        assert_eq!(all.pages, 3);
        assert_eq!(
            *script.cursors.lock().unwrap(),
            vec![None, Some(Cursor::from("c1")), Some(Cursor::from("c2"))]
        );
    }

    #[tokio::test]
    async fn test_repeated_cursor_stops_walk() {
        let script = Script::new(vec![
            Ok(page(&[1], Some("same"), 10)),
            Ok(page(&[2], Some("same"), 10)),
        ]);
        let all = fetch_all(|c| script.fetch(c)).await.unwrap();
        assert_eq!(all.items, vec![1, 2]);
        assert_eq!(all.pages, 2);
        assert_eq!(all.termination, Termination::Stalled);
    }

    #[tokio::test]
    async fn test_missing_total_reports_zero() {
        let script = Script::new(vec![Ok(Page { items: vec![7], next: None, total: None })]);
        let all = fetch_all(|c| script.fetch(c)).await.unwrap();
        assert_eq!(all.total, 0);
    }

    #[tokio::test]
    async fn test_failure_aborts_walk() {
        let script = Script::new(vec![
            Ok(page(&[1], Some("c1"), 2)),
            Err(ChatError::remote("boom")),
        ]);
        let err = fetch_all(|c| script.fetch(c)).await.unwrap_err();
        assert!(err.is_remote_failure());
        assert_eq!(script.cursors.lock().unwrap().len(), 2);
    }
}
