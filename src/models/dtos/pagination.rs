use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct PaginationDto<T>
where
    T: Serialize,
{
    pub total: u32,
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct PageQueryDto {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQueryDto {
    const DEFAULT_PER_PAGE: u32 = 15;
    const MAX_PER_PAGE: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }

    pub fn limit(&self) -> i64 {
        self.per_page() as i64
    }

    pub fn offset(&self) -> i64 {
        ((self.page() - 1) * self.per_page()) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_clamps_bounds() {
        let query = PageQueryDto {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 100);
        assert_eq!(query.offset(), 0);

        let query = PageQueryDto {
            page: Some(3),
            per_page: None,
        };
        assert_eq!(query.limit(), 15);
        assert_eq!(query.offset(), 30);
    }
}
