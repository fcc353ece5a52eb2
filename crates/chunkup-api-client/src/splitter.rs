use std::ops::Range;

/// 1 MiB
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Split `[0, total_bytes)` into consecutive ranges of at most `chunk_size` bytes.
///
/// The last range may be shorter. An empty source still yields a single empty
/// range so the upload produces an (empty) artifact.
pub fn plan_chunks(total_bytes: u64, chunk_size: u64) -> Vec<Range<u64>> {
    let chunk_size = chunk_size.max(1);
    if total_bytes == 0 {
        return vec![0..0];
    }

    let mut ranges = Vec::with_capacity(total_bytes.div_ceil(chunk_size) as usize);
    let mut start = 0;
    while start < total_bytes {
        let end = (start + chunk_size).min(total_bytes);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple() {
        assert_eq!(plan_chunks(4, 2), vec![0..2, 2..4]);
    }

    #[test]
    fn short_final_chunk() {
        let plan = plan_chunks(5 * 512 * 1024, DEFAULT_CHUNK_SIZE);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[2], 2 * DEFAULT_CHUNK_SIZE..5 * 512 * 1024);
    }

    #[test]
    fn smaller_than_one_chunk() {
        assert_eq!(plan_chunks(10, DEFAULT_CHUNK_SIZE), vec![0..10]);
    }

    #[test]
    fn empty_source_yields_one_empty_chunk() {
        assert_eq!(plan_chunks(0, DEFAULT_CHUNK_SIZE), vec![0..0]);
    }

    #[test]
    fn ranges_cover_source_without_gaps() {
        let plan = plan_chunks(1_000_003, 4096);
        assert_eq!(plan.first().map(|r| r.start), Some(0));
        assert_eq!(plan.last().map(|r| r.end), Some(1_000_003));
        assert!(plan.windows(2).all(|w| w[0].end == w[1].start));
        assert!(plan.iter().all(|r| r.end - r.start <= 4096 && r.end > r.start));
    }

    #[test]
    fn zero_chunk_size_treated_as_one() {
        assert_eq!(plan_chunks(3, 0).len(), 3);
    }
}
