//! Sequential page planning.
//!
//! The planner is the barrier between the two parallel stages: it takes the complete,
//! ordered analyzer output and walks it once, deciding which pages merge into spreads,
//! how many output pages every unit yields and which output indices they occupy. The
//! result is an immutable [`Plan`]; nothing it computes is shared with the transformer
//! jobs other than their own [`Unit`].

use std::ops::Range;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::layout::{PageMap, SpreadMap};
use crate::types::{Direction, PairMetric, Rect, SplitMode, SpreadSide, is_spread};

/// Settings the planner needs from the processor configuration.
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    pub direction: Direction,
    pub merge_enabled: bool,
    pub merge_pct_threshold: f64,
    pub merge_contrast_threshold: f64,
    pub split_mode: SplitMode,
}

/// One transformer job: one or two source pages and the output pages they become.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Source page in reading order.
    pub primary: PathBuf,
    /// Following source page merged into the spread, if any.
    pub secondary: Option<PathBuf>,
    /// Index of `primary` in the source sequence.
    pub source_index: usize,
    /// Crop rectangle in the coordinates of the (merged) unit image.
    pub bbox: Option<Rect>,
    pub width: u32,
    pub height: u32,
    pub is_spread: bool,
    /// Split mode actually applied; always `None` for non-spreads.
    pub split_mode: SplitMode,
    /// Contiguous output indices, one per derived image.
    pub output_indices: Range<usize>,
}

impl Unit {
    pub fn output_count(&self) -> usize {
        self.output_indices.len()
    }

    pub fn is_merged(&self) -> bool {
        self.secondary.is_some()
    }

    /// Source indices covered by this unit.
    pub fn source_indices(&self) -> Vec<usize> {
        if self.is_merged() {
            vec![self.source_index, self.source_index + 1]
        } else {
            vec![self.source_index]
        }
    }

    /// Output index bookmarks of this unit's source pages are moved to.
    ///
    /// Single and two-page units anchor on their first page; a three-page unit
    /// anchors on the middle page, the first half of the split spread.
    pub fn anchor_index(&self) -> usize {
        let offset = if self.output_count() == 3 { 1 } else { 0 };
        self.output_indices.start + offset
    }
}

/// Immutable hand-off from the planner to the transformer stage.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub units: Vec<Unit>,
    pub page_map: PageMap,
    pub spread_map: SpreadMap,
}

impl Plan {
    /// Total number of output pages over all units.
    pub fn output_count(&self) -> usize {
        self.units.iter().map(Unit::output_count).sum()
    }
}

/// Spread flags of a unit's output pages, in output order.
pub fn spread_sides(output_count: usize, direction: Direction) -> Vec<SpreadSide> {
    let (first, second) = match direction {
        Direction::Ltr => (SpreadSide::Left, SpreadSide::Right),
        Direction::Rtl => (SpreadSide::Right, SpreadSide::Left),
    };
    match output_count {
        1 => vec![SpreadSide::Center],
        2 => vec![first, second],
        _ => vec![SpreadSide::Center, first, second],
    }
}

/// Combines the bounding boxes of two merged pages into the spread's coordinates.
///
/// The outer horizontal edges come from the outer pages, the vertical extent is the
/// union of both. Cropping is dropped when either page has no box.
pub fn merge_bbox(current: &PairMetric, next: &PairMetric, direction: Direction) -> Option<Rect> {
    let (current_box, next_box) = (current.bbox?, next.bbox?);
    let (left_page, left_box, right_box) = match direction {
        Direction::Ltr => (current, current_box, next_box),
        Direction::Rtl => (next, next_box, current_box),
    };
    Some(Rect::new(
        left_box.left,
        current_box.top.min(next_box.top),
        left_page.width + right_box.right,
        current_box.bottom.max(next_box.bottom),
    ))
}

/// Plans the whole book in a single pass over the analyzer results.
///
/// # Errors
///
/// * [`Error::Invariant`] if `metrics` does not have one entry per page, or a page
///   pair judged mergeable has different heights.
pub fn plan_pages(pages: &[PathBuf], metrics: &[PairMetric], options: &PlanOptions) -> Result<Plan> {
    if pages.len() != metrics.len() {
        return Err(Error::Invariant(format!(
            "{} pages but {} analyzer results",
            pages.len(),
            metrics.len()
        )));
    }

    let mut plan = Plan::default();
    let mut next_output = 0;
    let mut i = 0;

    while i < pages.len() {
        let metric = &metrics[i];

        // The cover never merges.
        let merge = i > 0
            && i + 1 < pages.len()
            && options.merge_enabled
            && metric.is_mergeable(options.merge_pct_threshold, options.merge_contrast_threshold);

        let (secondary, bbox, width, height) = if merge {
            let next = &metrics[i + 1];
            if next.height != metric.height {
                return Err(Error::Invariant(format!(
                    "Pages {} and {} were judged mergeable with heights {} and {}",
                    i,
                    i + 1,
                    metric.height,
                    next.height
                )));
            }
            (
                Some(pages[i + 1].clone()),
                merge_bbox(metric, next, options.direction),
                metric.width + next.width,
                metric.height,
            )
        } else {
            (None, metric.bbox, metric.width, metric.height)
        };

        let spread = is_spread(width, height);
        let split_mode = if spread {
            options.split_mode
        } else {
            SplitMode::None
        };
        let count = split_mode.output_count(spread);

        let unit = Unit {
            primary: pages[i].clone(),
            secondary,
            source_index: i,
            bbox,
            width,
            height,
            is_spread: spread,
            split_mode,
            output_indices: next_output..next_output + count,
        };

        let anchor = unit.anchor_index();
        for source in unit.source_indices() {
            plan.page_map.push(source, anchor);
        }

        if spread {
            for (output, side) in unit
                .output_indices
                .clone()
                .zip(spread_sides(count, options.direction))
            {
                plan.spread_map.insert(output, side);
            }
        }

        log::debug!(
            "Planned unit from page {}{}: {}x{}, spread {}, outputs {:?}",
            i,
            if merge { " (merged with next)" } else { "" },
            width,
            height,
            spread,
            unit.output_indices
        );

        next_output += count;
        i += if merge { 2 } else { 1 };
        plan.units.push(unit);
    }

    Ok(plan)
}
