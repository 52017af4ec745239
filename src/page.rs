pub const PAGE_SIZE: usize = 50;

/// Number of pages for `len` items; never less than one.
pub fn total_pages(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE).max(1)
}

/// Clamps a 1-based page number into `[1, total_pages(len)]`.
pub fn clamp_page(page: usize, len: usize) -> usize {
    page.clamp(1, total_pages(len))
}

/// One page of a sorted, filtered sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: &'a [T],
}

pub fn paginate<T>(items: &[T], page: usize) -> Page<'_, T> {
    let number = clamp_page(page, items.len());
    let start = ((number - 1) * PAGE_SIZE).min(items.len());
    let end = (start + PAGE_SIZE).min(items.len());
    Page {
        number,
        total_pages: total_pages(items.len()),
        total_items: items.len(),
        items: &items[start..end],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up_with_minimum_of_one() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(50), 1);
        assert_eq!(total_pages(51), 2);
        assert_eq!(total_pages(120), 3);
    }

    #[test]
    fn out_of_range_requests_are_clamped() {
        let items: Vec<usize> = (0..120).collect();
        let last = paginate(&items, 4);
        assert_eq!(last.number, 3);
        assert_eq!(last.total_pages, 3);
        assert_eq!(last.items.len(), 20);
        assert_eq!(last.items[0], 100);

        let first = paginate(&items, 0);
        assert_eq!(first.number, 1);
        assert_eq!(first.items, &items[0..50]);
    }

    #[test]
    fn empty_sequence_has_one_empty_page() {
        let items: Vec<usize> = Vec::new();
        let page = paginate(&items, 3);
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }
}
