//! Pagination utilities for the catalog table
//!
//! Pages are 1-indexed; requests outside the valid range are clamped.

/// Default rows per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Pagination metadata calculated from a row count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages (0 when there are no rows)
    pub total_pages: usize,
    /// Index of the first row on this page
    pub offset: usize,
}

/// Calculate pagination metadata from total rows and requested page
///
/// # Examples
/// ```
/// use cinecrud_ui::pagination::calculate_pagination;
///
/// // 25 rows at 10 per page = 3 pages (10 + 10 + 5)
/// let p = calculate_pagination(25, 10, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 10);
///
/// // Out-of-bounds page gets clamped
/// let p = calculate_pagination(25, 10, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 20);
/// ```
pub fn calculate_pagination(total_rows: usize, page_size: usize, requested_page: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_rows.div_ceil(page_size);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        total_pages,
        offset,
    }
}
