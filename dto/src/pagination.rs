use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaginatedMetaDto {
    pub page: u32,
    pub per_page: u32,
    pub total_records: u64,
    pub total_pages: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaginatedDto<T> {
    pub meta: PaginatedMetaDto,
    pub data: Vec<T>,
}

impl PaginatedMetaDto {
    /// Pages are 1-based, a zero page or page size is bumped to 1
    pub fn new(page: u32, per_page: u32, total_records: u64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_records.div_ceil(per_page as u64);
        Self {
            page: page.max(1),
            per_page,
            total_records,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        (self.page as u64) < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

impl<T> PaginatedDto<T> {
    pub fn new(records: Vec<T>, page: u32, per_page: u32, total_records: u64) -> Self {
        Self {
            meta: PaginatedMetaDto::new(page, per_page, total_records),
            data: records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        let meta = PaginatedMetaDto::new(1, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next());
        assert!(!meta.has_prev());

        let meta = PaginatedMetaDto::new(3, 10, 30);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next());
        assert!(meta.has_prev());
    }

    #[test]
    fn test_zero_values() {
        let meta = PaginatedMetaDto::new(0, 0, 0);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.per_page, 1);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next());
    }
}
