use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub has_next: bool,
    pub has_prev: bool,
}
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// 页码，从 1 开始
    pub page: usize,
    pub page_size: usize,
}

impl<T> PageResult<T> {
    /// 对已排序的内存列表做分页，`page_info` 为空时返回全部
    pub fn paginate(items: Vec<T>, page_info: Option<PageInfo>) -> Self {
        let total = items.len();
        let Some(info) = page_info else {
            return PageResult { items, total, has_next: false, has_prev: false };
        };
        let page = info.page.max(1);
        let page_size = info.page_size.max(1);
        let skip = (page - 1).saturating_mul(page_size);
        let items: Vec<T> = items.into_iter().skip(skip).take(page_size).collect();
        PageResult { has_next: skip + items.len() < total, has_prev: page > 1, items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_middle_page() {
        let page = PageResult::paginate((1..=10).collect::<Vec<i32>>(), Some(PageInfo { page: 2, page_size: 3 }));
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 10);
        assert!(page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn paginate_without_page_info_returns_everything() {
        let page = PageResult::paginate(vec!["a", "b"], None);
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_next && !page.has_prev);
    }

    #[test]
    fn paginate_past_the_end_is_empty() {
        let page = PageResult::paginate(vec![1, 2, 3], Some(PageInfo { page: 5, page_size: 2 }));
        assert!(page.items.is_empty());
        assert!(!page.has_next);
    }
}
