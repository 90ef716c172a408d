/// Where a dragged entry should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Index(usize),
    /// Past the last entry.
    End,
}

/// Pointer position at the moment an entry of the saved-test list is dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    pub item_height: f64,
    pub pointer_y: f64,
    /// Offset of the first entry from the top of the list widget.
    pub margin_px: f64,
    /// Index the entry had before the drag started.
    pub prev_index: usize,
}

impl DragGesture {
    /// Translate the drop position into a target slot of a list with `count` entries.
    ///
    /// The slot under the pointer is nudged by one toward the origin unless the pointer
    /// has crossed the middle of that slot in the direction of travel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn drop_target(&self, count: usize) -> DropTarget {
        if !(self.item_height > 0.0) {
            return DropTarget::Index(self.prev_index.min(count.saturating_sub(1)));
        }

        let mut target = ((self.pointer_y - self.margin_px) / self.item_height).floor() as i64;
        let moving_down =
            self.pointer_y - self.item_height / 2.0 > self.item_height * target as f64;
        let prev = i64::try_from(self.prev_index).unwrap_or(i64::MAX);

        if target > prev && !moving_down {
            target -= 1;
        } else if target < prev && moving_down {
            target += 1;
        }

        let target = usize::try_from(target.max(0)).unwrap_or(usize::MAX);
        if target >= count {
            DropTarget::End
        } else {
            DropTarget::Index(target)
        }
    }
}

impl DropTarget {
    /// Final index of the moved entry in a list of `count` entries.
    #[must_use]
    pub fn resolve(self, count: usize) -> usize {
        match self {
            DropTarget::Index(i) => i.min(count.saturating_sub(1)),
            DropTarget::End => count.saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gesture(pointer_y: f64, prev_index: usize) -> DragGesture {
        DragGesture {
            item_height: 40.0,
            pointer_y,
            margin_px: 0.0,
            prev_index,
        }
    }

    #[test]
    fn dropping_on_own_slot_keeps_position() {
        assert_eq!(gesture(90.0, 2).drop_target(5), DropTarget::Index(2));
    }

    #[test]
    fn moving_down_needs_to_cross_half_of_target() {
        // slot 3 spans 120..160; its upper half still lands in slot 2
        assert_eq!(gesture(125.0, 0).drop_target(5), DropTarget::Index(2));
        assert_eq!(gesture(145.0, 0).drop_target(5), DropTarget::Index(3));
        assert_eq!(gesture(121.0, 1).drop_target(5), DropTarget::Index(2));
    }

    #[test]
    fn moving_up_takes_slot_only_from_its_upper_half() {
        assert_eq!(gesture(45.0, 4).drop_target(5), DropTarget::Index(1));
        assert_eq!(gesture(65.0, 4).drop_target(5), DropTarget::Index(2));
    }

    #[test]
    fn above_list_clamps_and_below_list_appends() {
        assert_eq!(gesture(-80.0, 3).drop_target(5), DropTarget::Index(0));
        assert_eq!(gesture(400.0, 1).drop_target(5), DropTarget::End);
        assert_eq!(DropTarget::End.resolve(5), 4);
    }

    #[test]
    fn degenerate_height_keeps_entry_in_place() {
        let g = DragGesture {
            item_height: 0.0,
            ..gesture(100.0, 2)
        };
        assert_eq!(g.drop_target(5), DropTarget::Index(2));
    }
}
