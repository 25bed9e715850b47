//! Client-side filtering, sorting and pagination shared by the organization,
//! order and pending order lists.
//!
//! Every operation borrows the fetched records and returns new vectors, so
//! a list can be re-queried any number of times without refetching.

use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

use crate::Result;
use crate::error::ErrorInfo;
use dto::order::{OrderDto, OrderStatus};
use dto::org::{OrgDto, OrgStatus};
use dto::pagination::PaginatedDto;

/// Records that can be shown in a filterable list
pub trait Listable {
    type Status: Copy + PartialEq + core::fmt::Display;

    fn status(&self) -> Self::Status;

    fn date(&self) -> Option<DateTime<Utc>>;

    fn name(&self) -> Option<&str>;

    fn amount(&self) -> Option<f64> {
        None
    }

    /// Fields matched by the free text search
    fn search_fields(&self) -> Vec<&str>;
}

impl Listable for OrgDto {
    type Status = OrgStatus;

    fn status(&self) -> OrgStatus {
        self.status
    }

    fn date(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.id.as_str()),
            self.name.as_deref(),
            self.email.as_deref(),
            self.gst_number.as_deref(),
            self.drug_license_number.as_deref(),
            self.address.city.as_deref(),
            self.address.state.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Listable for OrderDto {
    type Status = OrderStatus;

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn date(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    fn name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    fn amount(&self) -> Option<f64> {
        self.amount
    }

    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.id.as_str()),
            Some(self.org_id.as_str()),
            self.org_name.as_deref(),
            self.product_name.as_deref(),
            self.brand.as_deref(),
            self.product_type.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListFilter<S> {
    pub status: Option<S>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
}

impl<S> Default for ListFilter<S> {
    fn default() -> Self {
        Self {
            status: None,
            date_from: None,
            date_to: None,
            min_price: None,
            max_price: None,
            search: None,
        }
    }
}

impl<S: Copy + PartialEq> ListFilter<S> {
    /// All active predicates must hold
    pub fn matches<T: Listable<Status = S>>(&self, record: &T) -> bool {
        self.matches_status(record)
            && self.matches_dates(record)
            && self.matches_price(record)
            && self.matches_search(record)
    }

    fn matches_status<T: Listable<Status = S>>(&self, record: &T) -> bool {
        match self.status {
            Some(status) => record.status() == status,
            None => true,
        }
    }

    fn matches_dates<T: Listable<Status = S>>(&self, record: &T) -> bool {
        if self.date_from.is_none() && self.date_to.is_none() {
            return true;
        }
        let Some(date) = record.date() else {
            return false;
        };
        // Day granularity, both ends inclusive
        let day = date.date_naive();
        self.date_from.map_or(true, |from| day >= from) && self.date_to.map_or(true, |to| day <= to)
    }

    fn matches_price<T: Listable<Status = S>>(&self, record: &T) -> bool {
        if self.min_price.is_none() && self.max_price.is_none() {
            return true;
        }
        let Some(amount) = record.amount() else {
            return false;
        };
        self.min_price.map_or(true, |min| amount >= min)
            && self.max_price.map_or(true, |max| amount <= max)
    }

    fn matches_search<T: Listable<Status = S>>(&self, record: &T) -> bool {
        let needle = match self.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return true,
        };
        record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Name,
    Status,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

fn compare<T: Listable>(a: &T, b: &T, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => {
            let a = a.date().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            let b = b.date().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            a.cmp(&b)
        }
        SortKey::Name => {
            let a = a.name().unwrap_or("").to_lowercase();
            let b = b.name().unwrap_or("").to_lowercase();
            a.cmp(&b)
        }
        SortKey::Status => {
            let a = a.status().to_string().to_lowercase();
            let b = b.status().to_string().to_lowercase();
            a.cmp(&b)
        }
    }
}

/// Stable sort, ties keep their fetched order
pub fn sort_records<T: Listable>(records: &mut [T], sort: &SortSpec) {
    records.sort_by(|a, b| {
        let cmp = compare(a, b, sort.key);
        match sort.direction {
            SortDirection::Asc => cmp,
            SortDirection::Desc => cmp.reverse(),
        }
    });
}

pub fn apply_filter<T: Listable + Clone>(records: &[T], filter: &ListFilter<T::Status>) -> Vec<T> {
    records
        .iter()
        .filter(|record| filter.matches(*record))
        .cloned()
        .collect()
}

/// Slices one 1-based page out of the records, a page past the end is empty
pub fn paginate<T: Clone>(records: &[T], page: u32, per_page: u32) -> PaginatedDto<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let start = (page as usize - 1).saturating_mul(per_page as usize);
    let data: Vec<T> = records
        .iter()
        .skip(start)
        .take(per_page as usize)
        .cloned()
        .collect();

    PaginatedDto::new(data, page, per_page, records.len() as u64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<S> {
    pub filter: ListFilter<S>,
    pub sort: Option<SortSpec>,
    pub page: u32,
    pub per_page: u32,
}

impl<S> Default for ListQuery<S> {
    fn default() -> Self {
        Self {
            filter: ListFilter::default(),
            sort: None,
            page: 1,
            per_page: 10,
        }
    }
}

/// Filter, then sort, then paginate
pub fn run_query<T: Listable + Clone>(records: &[T], query: &ListQuery<T::Status>) -> PaginatedDto<T> {
    let mut filtered = apply_filter(records, &query.filter);
    if let Some(sort) = &query.sort {
        sort_records(&mut filtered, sort);
    }
    paginate(&filtered, query.page, query.per_page)
}

/// What a list view shows
#[derive(Debug, Clone)]
pub enum ListState<T> {
    Loading,
    /// Fetched fine but nothing matched
    Empty,
    Loaded(PaginatedDto<T>),
    Failed(ErrorInfo),
}

impl<T> ListState<T> {
    pub fn from_result(result: Result<PaginatedDto<T>>) -> Self {
        match result {
            Ok(page) if page.meta.total_records == 0 => ListState::Empty,
            Ok(page) => ListState::Loaded(page),
            Err(e) => ListState::Failed(ErrorInfo::from(&e)),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ListState::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::mock::{sample_orders, sample_orgs};

    fn order_ids(records: &[OrderDto]) -> Vec<String> {
        records.iter().map(|o| o.id.clone()).collect()
    }

    fn filters() -> Vec<ListFilter<OrderStatus>> {
        vec![
            ListFilter::default(),
            ListFilter {
                status: Some(OrderStatus::Pending),
                ..ListFilter::default()
            },
            ListFilter {
                date_from: NaiveDate::from_ymd_opt(2026, 2, 1),
                date_to: NaiveDate::from_ymd_opt(2026, 2, 20),
                ..ListFilter::default()
            },
            ListFilter {
                min_price: Some(450.5),
                max_price: Some(1200.0),
                ..ListFilter::default()
            },
            ListFilter {
                search: Some("  AMOX ".to_string()),
                ..ListFilter::default()
            },
            ListFilter {
                status: Some(OrderStatus::Pending),
                min_price: Some(100.0),
                search: Some("org-3".to_string()),
                ..ListFilter::default()
            },
        ]
    }

    #[test]
    fn test_filter_status() {
        let orders = sample_orders();
        let filter = ListFilter {
            status: Some(OrderStatus::Pending),
            ..ListFilter::default()
        };
        let result = apply_filter(&orders, &filter);
        assert_eq!(order_ids(&result), vec!["ord-1", "ord-3", "ord-6"]);
    }

    #[test]
    fn test_filter_date_range_inclusive() {
        let orders = sample_orders();
        let filter = ListFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 2, 3),
            date_to: NaiveDate::from_ymd_opt(2026, 2, 20),
            ..ListFilter::default()
        };
        let result = apply_filter(&orders, &filter);

        // ord-6 is submitted late on the end day, ord-3 has no date
        assert_eq!(order_ids(&result), vec!["ord-2", "ord-6", "ord-7"]);
    }

    #[test]
    fn test_filter_price_range() {
        let orders = sample_orders();
        let filter = ListFilter {
            min_price: Some(800.0),
            max_price: Some(1200.0),
            ..ListFilter::default()
        };
        let result = apply_filter(&orders, &filter);
        assert_eq!(order_ids(&result), vec!["ord-1", "ord-5", "ord-7"]);
    }

    #[test]
    fn test_filter_search_case_insensitive() {
        let orders = sample_orders();
        let filter = ListFilter {
            search: Some("AZITHRO".to_string()),
            ..ListFilter::default()
        };
        let result = apply_filter(&orders, &filter);
        assert_eq!(order_ids(&result), vec!["ord-4"]);

        let filter = ListFilter {
            search: Some("   ".to_string()),
            ..ListFilter::default()
        };
        assert_eq!(apply_filter(&orders, &filter).len(), orders.len());
    }

    #[test]
    fn test_filter_subset_and_idempotent() {
        let orders = sample_orders();
        let before = orders.clone();
        for filter in filters() {
            let once = apply_filter(&orders, &filter);
            assert!(once.iter().all(|o| orders.contains(o)));
            assert!(once.iter().all(|o| filter.matches(o)));

            let excluded = orders.iter().filter(|o| !once.contains(o));
            assert!(excluded.into_iter().all(|o| !filter.matches(o)));

            let twice = apply_filter(&once, &filter);
            assert_eq!(once, twice);
        }
        assert_eq!(orders, before);
    }

    #[test]
    fn test_sort_by_date_missing_is_epoch() {
        let mut orders = sample_orders();
        sort_records(&mut orders, &SortSpec::new(SortKey::Date, SortDirection::Asc));
        assert_eq!(
            order_ids(&orders),
            vec!["ord-3", "ord-1", "ord-4", "ord-2", "ord-7", "ord-6", "ord-5"]
        );

        sort_records(&mut orders, &SortSpec::new(SortKey::Date, SortDirection::Desc));
        assert_eq!(orders.first().map(|o| o.id.as_str()), Some("ord-5"));
        assert_eq!(orders.last().map(|o| o.id.as_str()), Some("ord-3"));
    }

    #[test]
    fn test_sort_by_name_case_insensitive() {
        let mut orgs = sample_orgs();
        sort_records(&mut orgs, &SortSpec::new(SortKey::Name, SortDirection::Asc));
        let names: Vec<&str> = orgs.iter().map(|o| o.id.as_str()).collect();

        // org-3 has no name and sorts as an empty string
        assert_eq!(names, vec!["org-3", "org-2", "org-1", "org-4"]);
    }

    #[test]
    fn test_sort_by_status() {
        let mut orders = sample_orders();
        sort_records(&mut orders, &SortSpec::new(SortKey::Status, SortDirection::Asc));
        let statuses: Vec<OrderStatus> = orders.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Cancelled,
                OrderStatus::Delivered,
                OrderStatus::Pending,
                OrderStatus::Pending,
                OrderStatus::Pending,
                OrderStatus::Processing,
                OrderStatus::Shipped,
            ]
        );
        // Stable among equal statuses
        let pending: Vec<&str> = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(pending, vec!["ord-1", "ord-3", "ord-6"]);
    }

    #[test]
    fn test_pages_reconstruct_filtered() {
        let orders = sample_orders();
        for filter in filters() {
            let filtered = apply_filter(&orders, &filter);
            for per_page in 1..=8 {
                let first = paginate(&filtered, 1, per_page);
                let mut rebuilt: Vec<OrderDto> = Vec::new();
                for page in 1..=first.meta.total_pages.max(1) as u32 {
                    let slice = paginate(&filtered, page, per_page);
                    assert!(slice.data.len() <= per_page as usize);
                    rebuilt.extend(slice.data);
                }
                assert_eq!(rebuilt, filtered);
            }
        }
    }

    #[test]
    fn test_paginate_edges() {
        let orders = sample_orders();

        let page = paginate(&orders, 3, 3);
        assert_eq!(order_ids(&page.data), vec!["ord-7"]);
        assert_eq!(page.meta.total_pages, 3);
        assert_eq!(page.meta.total_records, 7);

        let page = paginate(&orders, 9, 3);
        assert!(page.data.is_empty());

        let page = paginate(&orders, 0, 0);
        assert_eq!(page.meta.page, 1);
        assert_eq!(page.data.len(), 1);
    }

    #[test]
    fn test_run_query() {
        let orders = sample_orders();
        let query = ListQuery {
            filter: ListFilter {
                status: Some(OrderStatus::Pending),
                ..ListFilter::default()
            },
            sort: Some(SortSpec::new(SortKey::Date, SortDirection::Desc)),
            page: 1,
            per_page: 2,
        };
        let page = run_query(&orders, &query);
        assert_eq!(order_ids(&page.data), vec!["ord-6", "ord-1"]);
        assert_eq!(page.meta.total_records, 3);
        assert_eq!(page.meta.total_pages, 2);
    }

    #[test]
    fn test_org_filters() {
        let orgs = sample_orgs();
        let filter = ListFilter {
            status: Some(OrgStatus::Completed),
            ..ListFilter::default()
        };
        let result = apply_filter(&orgs, &filter);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "org-2");

        // Organizations carry no amount
        let filter: ListFilter<OrgStatus> = ListFilter {
            min_price: Some(0.0),
            ..ListFilter::default()
        };
        assert!(apply_filter(&orgs, &filter).is_empty());
    }

    #[test]
    fn test_list_state() {
        let orders = sample_orders();
        let filter = ListFilter {
            search: Some("no such product".to_string()),
            ..ListFilter::default()
        };
        let query = ListQuery {
            filter,
            ..ListQuery::default()
        };

        let state = ListState::from_result(Ok(run_query(&orders, &query)));
        assert!(matches!(state, ListState::Empty));

        let state = ListState::from_result(Ok(run_query(&orders, &ListQuery::default())));
        assert!(matches!(state, ListState::Loaded(_)));

        let state: ListState<OrderDto> = ListState::from_result(Err(Error::Server {
            msg: "down".to_string(),
        }));
        assert!(matches!(state, ListState::Failed(_)));

        let state: ListState<OrderDto> = ListState::Loading;
        assert!(state.is_loading());
    }
}
