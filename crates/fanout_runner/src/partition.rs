use fanout_metadata::ThreadCount;

/// Distribute `items` round-robin over at most `threads` chunks.
///
/// Item `i` lands in chunk `i % threads`, so chunk sizes differ by at most one and every item
/// appears exactly once. When there are fewer items than threads, only non-empty chunks are
/// returned.
pub fn partition<T: Clone>(items: &[T], threads: ThreadCount) -> Vec<Vec<T>> {
    let chunk_count = threads.get().min(items.len());

    let mut chunks: Vec<Vec<T>> = (0..chunk_count)
        .map(|_| Vec::with_capacity(items.len().div_ceil(chunk_count)))
        .collect();

    for (index, item) in items.iter().enumerate() {
        chunks[index % chunk_count].push(item.clone());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn threads(count: usize) -> ThreadCount {
        ThreadCount::try_from(count).expect("positive thread count")
    }

    #[test]
    fn five_specs_over_two_threads() {
        let specs = ["a", "b", "c", "d", "e"];

        let chunks = partition(&specs, threads(2));

        assert_eq!(chunks, vec![vec!["a", "c", "e"], vec!["b", "d"]]);
    }

    #[test]
    fn fewer_specs_than_threads() {
        let specs = ["a", "b"];

        let chunks = partition(&specs, threads(4));

        assert_eq!(chunks, vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn no_specs() {
        let chunks = partition::<&str>(&[], threads(3));

        assert!(chunks.is_empty());
    }

    #[test]
    fn single_thread_keeps_order() {
        let specs = ["c", "a", "b"];

        assert_eq!(partition(&specs, threads(1)), vec![vec!["c", "a", "b"]]);
    }

    #[test]
    fn chunks_are_balanced_and_cover_every_item() {
        for item_count in 0..25 {
            let items: Vec<usize> = (0..item_count).collect();

            for thread_count in 1..9 {
                let chunks = partition(&items, threads(thread_count));

                assert_eq!(chunks.len(), thread_count.min(item_count));
                assert!(chunks.iter().all(|chunk| !chunk.is_empty()));

                let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
                if let (Some(max), Some(min)) = (sizes.iter().max(), sizes.iter().min()) {
                    assert!(max - min <= 1, "unbalanced chunks {sizes:?}");
                }

                let mut covered: Vec<usize> = chunks.into_iter().flatten().collect();
                covered.sort_unstable();
                assert_eq!(covered, items);
            }
        }
    }

    #[test]
    fn each_chunk_preserves_relative_order() {
        let items: Vec<usize> = (0..17).collect();

        for chunk in partition(&items, threads(4)) {
            assert!(chunk.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }
}
