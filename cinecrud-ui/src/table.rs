//! Catalog table view-model
//!
//! Holds the loaded work set and the view state over it (filter, sort, page).
//! Filtering and sorting never touch storage; they re-evaluate the rows
//! already loaded.

use std::cmp::Ordering;
use std::str::FromStr;

use cinecrud_common::Movie;

use crate::filter::MovieFilter;
use crate::pagination::{calculate_pagination, DEFAULT_PAGE_SIZE};

/// Sortable columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Year,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(SortKey::Title),
            "year" => Ok(SortKey::Year),
            other => Err(format!("unknown sort column '{}' (title, year)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Ascending),
            "desc" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort order '{}' (asc, desc)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// One rendered page of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub rows: Vec<Movie>,
    /// Current page (1-indexed)
    pub page: usize,
    pub total_pages: usize,
    /// Rows passing the filter
    pub filtered_rows: usize,
    /// Rows loaded from the work set
    pub total_rows: usize,
}

pub struct CatalogTable {
    data: Vec<Movie>,
    filter: MovieFilter,
    sort: Option<Sort>,
    page: usize,
    page_size: usize,
}

impl Default for CatalogTable {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl CatalogTable {
    pub fn new(page_size: usize) -> Self {
        Self {
            data: Vec::new(),
            filter: MovieFilter::default(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Replace the loaded rows; the current filter and sort are kept and the
    /// page is clamped to the new row count
    pub fn set_data(&mut self, data: Vec<Movie>) {
        self.data = data;
        self.clamp_page();
    }

    pub fn data(&self) -> &[Movie] {
        &self.data
    }

    /// Loaded row with the given id
    pub fn find(&self, id: i64) -> Option<&Movie> {
        self.data.iter().find(|m| m.id == Some(id))
    }

    /// Apply a new filter and return to the first page
    pub fn set_filter(&mut self, filter: MovieFilter) {
        self.filter = filter;
        self.first_page();
    }

    pub fn filter(&self) -> &MovieFilter {
        &self.filter
    }

    pub fn set_sort(&mut self, sort: Option<Sort>) {
        self.sort = sort;
    }

    pub fn sort(&self) -> Option<Sort> {
        self.sort
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn first_page(&mut self) {
        self.page = 1;
    }

    /// Jump to `page`, clamped into `1..=total_pages`
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page;
        self.clamp_page();
    }

    pub fn next_page(&mut self) {
        if self.page < self.total_pages() {
            self.page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.clamp_page();
        self.page = self.page.saturating_sub(1).max(1);
    }

    fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size).max(1)
    }

    fn clamp_page(&mut self) {
        self.page = self.page.clamp(1, self.total_pages());
    }

    /// Rows passing the filter, in display order
    pub fn filtered(&self) -> Vec<&Movie> {
        let mut rows: Vec<&Movie> = self.data.iter().filter(|m| self.filter.matches(m)).collect();
        if let Some(sort) = self.sort {
            // Stable sort keeps work-set order among equal keys
            rows.sort_by(|a, b| {
                let ordering = compare(a, b, sort.key);
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        rows
    }

    pub fn page_view(&self) -> PageView {
        let filtered = self.filtered();
        let pagination = calculate_pagination(filtered.len(), self.page_size, self.page);
        let rows = filtered
            .iter()
            .skip(pagination.offset)
            .take(self.page_size)
            .map(|m| (*m).clone())
            .collect();

        PageView {
            rows,
            page: pagination.page,
            total_pages: pagination.total_pages,
            filtered_rows: filtered.len(),
            total_rows: self.data.len(),
        }
    }
}

fn compare(a: &Movie, b: &Movie, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Year => a.year.cmp(&b.year),
    }
}
