/// Splitting ordered sequences into fixed-size pages.
///
/// Categories that share a slide series are paged independently and joined
/// on the slide index: page `n` of every category lands on slide `n`.
use std::num::NonZeroUsize;

/// A contiguous slice of a source sequence.
pub type Page<'a, T> = &'a [T];

/// Split `items` into pages of at most `page_size` elements.
///
/// Every page but the last is full; an empty sequence has no pages.
pub fn paginate<T>(items: &[T], page_size: NonZeroUsize) -> Vec<Page<'_, T>> {
    items.chunks(page_size.get()).collect()
}

/// Page `index` of `items`, empty when the sequence is exhausted.
pub fn page_at<T>(items: &[T], page_size: NonZeroUsize, index: usize) -> Page<'_, T> {
    let size = page_size.get();
    let start = index.saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

/// Number of pages `len` items need.
#[inline]
pub fn page_count(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get())
}

/// Number of slides a series needs for its `(item count, page size)`
/// categories: the largest page count among them.
pub fn series_len(categories: &[(usize, NonZeroUsize)]) -> usize {
    categories
        .iter()
        .map(|&(len, size)| page_count(len, size))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_page_size_one() {
        let keys = ["P1", "P2"];
        let pages = paginate(&keys, size(1));
        assert_eq!(pages, [&["P1"][..], &["P2"][..]]);
    }

    #[test]
    fn test_seven_items_in_threes() {
        let items: Vec<u32> = (1..=7).collect();
        let lens: Vec<usize> = paginate(&items, size(3)).iter().map(|p| p.len()).collect();
        assert_eq!(lens, [3, 3, 1]);
        assert!(paginate::<u32>(&[], size(3)).is_empty());
    }

    #[test]
    fn test_page_at_aligns_on_slide_index() {
        let projects: Vec<u32> = (0..4).collect();
        let teach: Vec<u32> = (0..25).collect();
        let slides = series_len(&[(projects.len(), size(3)), (teach.len(), size(10))]);
        assert_eq!(slides, 3);

        assert_eq!(page_at(&projects, size(3), 1), &[3]);
        assert!(page_at(&projects, size(3), 2).is_empty());
        assert_eq!(page_at(&teach, size(10), 2), &[20, 21, 22, 23, 24]);
        assert!(page_at(&teach, size(10), usize::MAX).is_empty());
    }

    #[test]
    fn test_series_len_of_empty_categories() {
        assert_eq!(series_len(&[]), 0);
        assert_eq!(series_len(&[(0, size(3)), (0, size(10))]), 0);
        assert_eq!(series_len(&[(0, size(3)), (1, size(10))]), 1);
    }

    proptest! {
        #[test]
        fn prop_pages_reassemble_source(items in proptest::collection::vec(any::<u16>(), 0..200), k in 1usize..20) {
            let pages = paginate(&items, size(k));
            prop_assert_eq!(pages.concat(), items.clone());
            if let Some((last, full)) = pages.split_last() {
                prop_assert!(full.iter().all(|p| p.len() == k));
                prop_assert!(!last.is_empty() && last.len() <= k);
            }
            prop_assert_eq!(pages.len(), page_count(items.len(), size(k)));
            for (index, page) in pages.iter().enumerate() {
                prop_assert_eq!(page_at(&items, size(k), index), *page);
            }
        }
    }
}
