/// One replaced span of a step: `old_size` tokens at `start` became `new_size` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChangedRange {
    start: usize,
    old_size: usize,
    new_size: usize,
}

/// Where a position ended up after mapping, and whether the content next to
/// it on the queried side was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    pub deleted: bool,
}

/// Position changes made by a single step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<ChangedRange>,
}

impl StepMap {
    /// Build from `(start, old_size, new_size)` triples in document order.
    pub fn new(ranges: &[(usize, usize, usize)]) -> Self {
        Self {
            ranges: ranges
                .iter()
                .filter(|&&(_, old_size, new_size)| old_size != 0 || new_size != 0)
                .map(|&(start, old_size, new_size)| ChangedRange {
                    start,
                    old_size,
                    new_size,
                })
                .collect(),
        }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Map `pos`. `assoc` picks the side a position at the edge of an
    /// insertion sticks to: negative keeps it before, otherwise after.
    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.old_size;
            if pos <= end {
                let side = if range.old_size == 0 {
                    assoc
                } else if pos == range.start {
                    -1
                } else if pos == end {
                    1
                } else {
                    assoc
                };
                let after = if side < 0 { 0 } else { range.new_size as isize };
                let mapped = range.start as isize + diff + after;
                let deleted = if assoc < 0 { pos != range.start } else { pos != end };
                return MapResult {
                    pos: mapped.max(0) as usize,
                    deleted,
                };
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        MapResult {
            pos: (pos as isize + diff).max(0) as usize,
            deleted: false,
        }
    }
}

/// The maps of a sequence of steps, applied in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        let mut deleted = false;
        let mut pos = pos;
        for map in &self.maps {
            let result = map.map_result(pos, assoc);
            pos = result.pos;
            deleted |= result.deleted;
        }
        MapResult { pos, deleted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::before_change(2, 1, 2)]
    #[case::inside_deleted(6, 1, 10)]
    #[case::after_change(12, 1, 14)]
    #[case::at_start_sticks_left(5, -1, 5)]
    #[case::at_end(8, 1, 10)]
    fn test_step_map_positions(#[case] pos: usize, #[case] assoc: i8, #[case] expected: usize) {
        // Three tokens at 5 replaced by five.
        let map = StepMap::new(&[(5, 3, 5)]);
        assert_eq!(map.map(pos, assoc), expected);
    }

    #[test]
    fn test_insertion_respects_assoc() {
        let map = StepMap::new(&[(4, 0, 2)]);
        assert_eq!(map.map(4, -1), 4);
        assert_eq!(map.map(4, 1), 6);
        assert!(!map.map_result(4, 1).deleted);
    }

    #[test]
    fn test_deleted_flag_inside_removed_range() {
        let map = StepMap::new(&[(3, 4, 0)]);
        let result = map.map_result(5, 1);
        assert_eq!(result.pos, 3);
        assert!(result.deleted);
    }

    #[test]
    fn test_mapping_composes_in_order() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(&[(0, 0, 2)]));
        mapping.push(StepMap::new(&[(10, 2, 0)]));
        assert_eq!(mapping.map(3, 1), 5);
        assert_eq!(mapping.map(11, 1), 11);
    }
}
