//! Filter Panel
//!
//! Category, price and rating selection published on a watch channel. The
//! listing follows it through [`debounce`], which forwards a selection once
//! no change has arrived for the configured quiet period.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::{Category, Money};
use crate::services::{ProductListing, ProductQuery, SortOption};

pub const DEFAULT_MAX_PRICE: Money = Money::new(rust_decimal::Decimal::from_parts(1000, 0, 0, false, 0));

/// Minimum-rating checkboxes, highest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RatingFilter {
    FourStars = 4,
    ThreeStars = 3,
    TwoStars = 2,
    OneStar = 1,
}

impl RatingFilter {
    pub const ALL: [RatingFilter; 4] = [Self::FourStars, Self::ThreeStars, Self::TwoStars, Self::OneStar];
    pub fn stars(&self) -> u8 { *self as u8 }
    pub fn label(&self) -> &'static str {
        match self { Self::FourStars => "4 & up", Self::ThreeStars => "3 & up", Self::TwoStars => "2 & up", Self::OneStar => "1 & up" }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryOption {
    pub name: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSelection {
    pub categories: Vec<CategoryOption>,
    pub min_price: Money,
    pub max_price: Money,
    /// Checked flags in [`RatingFilter::ALL`] order.
    pub ratings: [bool; 4],
    pub sort: SortOption,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self { categories: vec![], min_price: Money::ZERO, max_price: DEFAULT_MAX_PRICE, ratings: [false; 4], sort: SortOption::default() }
    }
}

impl FilterSelection {
    pub fn selected_categories(&self) -> Vec<String> {
        self.categories.iter().filter(|c| c.checked).map(|c| c.name.clone()).collect()
    }

    /// Highest checked rating, or 0 when none is checked.
    pub fn min_rating(&self) -> u8 {
        RatingFilter::ALL.iter().zip(self.ratings).filter(|(_, on)| *on).map(|(r, _)| r.stars()).max().unwrap_or(0)
    }

    pub fn to_query(&self, page: u32, per_page: u32) -> ProductQuery {
        ProductQuery {
            page: page.max(1),
            per_page,
            categories: self.selected_categories(),
            min_price: self.min_price,
            max_price: Some(self.max_price),
            min_rating: self.min_rating(),
            sort: self.sort,
        }
    }
}

pub struct FilterPanel {
    state: watch::Sender<FilterSelection>,
}

impl Default for FilterPanel {
    fn default() -> Self { Self::new() }
}

impl FilterPanel {
    pub fn new() -> Self {
        let (state, _) = watch::channel(FilterSelection::default());
        Self { state }
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterSelection> { self.state.subscribe() }
    pub fn selection(&self) -> FilterSelection { self.state.borrow().clone() }

    /// Lines the category checkboxes up with a fetched list, keeping the
    /// checked state of names that survive.
    pub fn set_categories(&self, categories: &[Category]) {
        self.state.send_modify(|s| {
            s.categories = categories
                .iter()
                .map(|c| CategoryOption {
                    name: c.name.clone(),
                    label: if c.display_name.is_empty() { c.name.clone() } else { c.display_name.clone() },
                    checked: s.categories.iter().any(|o| o.name == c.name && o.checked),
                })
                .collect();
        });
    }

    /// Returns false when no category has that name.
    pub fn toggle_category(&self, name: &str) -> bool {
        self.state.send_if_modified(|s| match s.categories.iter_mut().find(|c| c.name == name) {
            Some(option) => {
                option.checked = !option.checked;
                true
            }
            None => false,
        })
    }

    pub fn set_price_range(&self, min: Money, max: Money) {
        self.state.send_modify(|s| {
            s.min_price = min;
            s.max_price = max;
        });
    }

    pub fn toggle_rating(&self, rating: RatingFilter) {
        self.state.send_modify(|s| {
            if let Some(i) = RatingFilter::ALL.iter().position(|r| *r == rating) {
                s.ratings[i] = !s.ratings[i];
            }
        });
    }

    pub fn set_sort(&self, sort: SortOption) { self.state.send_modify(|s| s.sort = sort); }

    /// Unchecks everything and restores the default price range.
    pub fn clear_filters(&self) {
        self.state.send_modify(|s| {
            s.categories.iter_mut().for_each(|c| c.checked = false);
            s.min_price = Money::ZERO;
            s.max_price = DEFAULT_MAX_PRICE;
            s.ratings = [false; 4];
        });
    }
}

/// Applies the current selection, then each selection that stays unchanged
/// for `window` and differs from the last one applied. Returns once the
/// panel is dropped.
pub async fn debounce<F, Fut>(mut rx: watch::Receiver<FilterSelection>, window: Duration, mut apply: F)
where
    F: FnMut(FilterSelection) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut last = rx.borrow_and_update().clone();
    apply(last.clone()).await;

    loop {
        if rx.changed().await.is_err() {
            return;
        }
        let mut closed = false;
        loop {
            match tokio::time::timeout(window, rx.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        let current = rx.borrow_and_update().clone();
        if current == last {
            debug!("Filter selection settled back to the applied one");
        } else {
            apply(current.clone()).await;
            last = current;
        }
        if closed {
            return;
        }
    }
}

/// Reloads page 1 of `listing` whenever the panel's selection settles.
pub fn follow_filters(
    panel: &FilterPanel,
    listing: Arc<ProductListing>,
    window: Duration,
    per_page: u32,
) -> JoinHandle<()> {
    let rx = panel.subscribe();
    tokio::spawn(debounce(rx, window, move |selection| {
        let listing = Arc::clone(&listing);
        async move {
            // Failures are recorded on the listing state.
            let _ = listing.load(selection.to_query(1, per_page)).await;
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::sleep;

    fn category(name: &str) -> Category {
        Category { id: name.parse().unwrap(), name: name.into(), display_name: String::new(), description: String::new() }
    }

    #[test]
    fn test_query_from_selection() {
        let panel = FilterPanel::new();
        panel.set_categories(&[category("audio"), category("video")]);
        assert!(panel.toggle_category("video"));
        assert!(!panel.toggle_category("books"));
        panel.toggle_rating(RatingFilter::TwoStars);
        panel.toggle_rating(RatingFilter::ThreeStars);
        panel.set_price_range(Money::whole(20), Money::whole(500));

        let query = panel.selection().to_query(2, 6);
        assert_eq!(query.categories, vec!["video".to_string()]);
        assert_eq!(query.min_rating, 3);
        assert_eq!(query.min_price, Money::whole(20));
        assert_eq!(query.max_price, Some(Money::whole(500)));
        assert_eq!(query.page, 2);
    }

    #[test]
    fn test_clear_and_realign() {
        let panel = FilterPanel::new();
        panel.set_categories(&[category("audio"), category("video")]);
        panel.toggle_category("audio");
        panel.set_categories(&[category("audio"), category("games")]);
        assert_eq!(panel.selection().selected_categories(), vec!["audio".to_string()]);

        panel.toggle_rating(RatingFilter::OneStar);
        panel.clear_filters();
        let cleared = panel.selection();
        assert!(cleared.selected_categories().is_empty());
        assert_eq!(cleared.min_rating(), 0);
        assert_eq!(cleared.max_price, DEFAULT_MAX_PRICE);
        assert_eq!(cleared.categories.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_waits_for_quiet_period() {
        let panel = FilterPanel::new();
        panel.set_categories(&[category("audio")]);
        let (tx, mut applied) = mpsc::unbounded_channel();
        let handle = tokio::spawn(debounce(panel.subscribe(), Duration::from_millis(300), move |s| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(s);
            }
        }));

        sleep(Duration::from_millis(10)).await;
        assert_eq!(applied.try_recv().unwrap(), panel.selection());

        panel.toggle_category("audio");
        sleep(Duration::from_millis(100)).await;
        panel.set_price_range(Money::whole(10), Money::whole(500));
        sleep(Duration::from_millis(100)).await;
        panel.toggle_rating(RatingFilter::FourStars);
        sleep(Duration::from_millis(200)).await;
        assert!(applied.try_recv().is_err());

        sleep(Duration::from_millis(150)).await;
        let settled = applied.try_recv().unwrap();
        assert_eq!(settled, panel.selection());
        assert_eq!(settled.min_rating(), 4);
        assert!(applied.try_recv().is_err());

        panel.toggle_rating(RatingFilter::FourStars);
        sleep(Duration::from_millis(50)).await;
        panel.toggle_rating(RatingFilter::FourStars);
        sleep(Duration::from_millis(400)).await;
        assert!(applied.try_recv().is_err());

        drop(panel);
        handle.await.unwrap();
    }
}
