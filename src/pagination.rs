//! Client-side pagination: page slicing and the page-number window.

use serde::Serialize;

/// Pages needed for `len` rows. Zero rows means zero pages.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Slice out 1-based `page`. Out-of-range pages are empty.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

/// Clamp a requested page into `1..=total`, with page 1 when empty.
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

const MAX_VISIBLE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum PageControl {
    Previous { enabled: bool },
    First(usize),
    Ellipsis,
    Number { page: usize, current: bool },
    Last(usize),
    Next { enabled: bool },
}

/// Pager controls for `current` of `total` pages. Hidden (empty) when there
/// is at most one page.
pub fn controls(current: usize, total: usize) -> Vec<PageControl> {
    if total <= 1 {
        return Vec::new();
    }
    let current = clamp_page(current, total);

    let mut start = current.saturating_sub(MAX_VISIBLE / 2).max(1);
    let mut end = (start + MAX_VISIBLE - 1).min(total);
    if end - start + 1 < MAX_VISIBLE {
        start = (end + 1).saturating_sub(MAX_VISIBLE).max(1);
    }
    end = end.min(total);

    let mut out = vec![PageControl::Previous {
        enabled: current > 1,
    }];
    if start > 1 {
        out.push(PageControl::First(1));
        if start > 2 {
            out.push(PageControl::Ellipsis);
        }
    }
    for page in start..=end {
        out.push(PageControl::Number {
            page,
            current: page == current,
        });
    }
    if end < total {
        if end < total - 1 {
            out.push(PageControl::Ellipsis);
        }
        out.push(PageControl::Last(total));
    }
    out.push(PageControl::Next {
        enabled: current < total,
    });
    out
}

/// One rendered page of a list.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<T>,
}

impl<T: Serialize + Clone> Page<T> {
    pub fn of(items: &[T], page: usize, page_size: usize) -> Self {
        let total = total_pages(items.len(), page_size);
        let page = clamp_page(page, total);
        Self {
            page,
            total_pages: total,
            total_items: items.len(),
            items: page_slice(items, page, page_size).to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(controls: &[PageControl]) -> Vec<usize> {
        controls
            .iter()
            .filter_map(|c| match c {
                PageControl::Number { page, .. } => Some(*page),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn page_counts_round_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn slices_last_partial_page() {
        let rows: Vec<u32> = (1..=23).collect();
        assert_eq!(page_slice(&rows, 3, 10), &[21, 22, 23]);
        assert!(page_slice(&rows, 4, 10).is_empty());
        assert!(page_slice(&rows, 0, 10).is_empty());
    }

    #[test]
    fn single_page_hides_controls() {
        assert!(controls(1, 1).is_empty());
        assert!(controls(1, 0).is_empty());
    }

    #[test]
    fn window_is_centred_with_first_and_last_shortcuts() {
        let c = controls(6, 12);
        assert_eq!(numbers(&c), vec![4, 5, 6, 7, 8]);
        assert_eq!(c[0], PageControl::Previous { enabled: true });
        assert_eq!(c[1], PageControl::First(1));
        assert_eq!(c[2], PageControl::Ellipsis);
        assert_eq!(c[c.len() - 3], PageControl::Ellipsis);
        assert_eq!(c[c.len() - 2], PageControl::Last(12));
    }

    #[test]
    fn window_sticks_to_the_edges() {
        let c = controls(1, 8);
        assert_eq!(numbers(&c), vec![1, 2, 3, 4, 5]);
        assert_eq!(c[0], PageControl::Previous { enabled: false });
        assert!(!c.contains(&PageControl::First(1)));

        let c = controls(8, 8);
        assert_eq!(numbers(&c), vec![4, 5, 6, 7, 8]);
        assert_eq!(c.last(), Some(&PageControl::Next { enabled: false }));
        assert!(!c.contains(&PageControl::Last(8)));
    }

    #[test]
    fn adjacent_first_page_needs_no_ellipsis() {
        let c = controls(4, 6);
        assert_eq!(numbers(&c), vec![2, 3, 4, 5, 6]);
        assert_eq!(c[1], PageControl::First(1));
        assert_eq!(c[2], PageControl::Number { page: 2, current: false });
    }

    #[test]
    fn page_of_clamps_out_of_range_requests() {
        let rows: Vec<u32> = (1..=15).collect();
        let page = Page::of(&rows, 9, 10);
        assert_eq!(page.page, 2);
        assert_eq!(page.items, vec![11, 12, 13, 14, 15]);
        let empty: Page<u32> = Page::of(&[], 3, 10);
        assert_eq!(empty.page, 1);
        assert!(empty.items.is_empty());
    }
}
