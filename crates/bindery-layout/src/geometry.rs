// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry: margin frames per page index.
//
// The binding margin always sits on one fixed physical edge of the sheet.
// Which logical margin (left, right, head, foot) that edge becomes depends
// on orientation, binding edge, the sheet side (front/back of a duplex
// sheet) and, in two-column mode, which column the page is. A frame is a
// pure function of the layout and the page index.

use bindery_core::{Columns, Direction, LayoutConfig};

/// Margins and body bounds for one page (one column in two-column mode).
/// Vertical offsets are measured down from the top of the sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    pub head_top: f64,
    pub margin_bottom: f64,
    pub body_left: f64,
    pub body_right: f64,
    pub body_width: f64,
    pub punch: Direction,
}

/// The named layout cases a page index can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageCase {
    SingleOdd,
    SingleEven,
    TwoColumnOddLeft,
    TwoColumnOddRight,
    TwoColumnEvenLeft,
    TwoColumnEvenRight,
}

impl PageCase {
    /// Case for the 1-based `page` under `layout`.
    ///
    /// Without duplex every sheet side is a front side. In two-column mode
    /// each column is its own page index, left column first.
    pub fn for_page(layout: &LayoutConfig, page: u32) -> Self {
        match (layout.duplex, layout.columns) {
            (true, Columns::Two) => match page % 4 {
                1 => Self::TwoColumnOddLeft,
                2 => Self::TwoColumnOddRight,
                3 => Self::TwoColumnEvenLeft,
                _ => Self::TwoColumnEvenRight,
            },
            (true, Columns::One) if page % 2 == 0 => Self::SingleEven,
            (true, Columns::One) => Self::SingleOdd,
            (false, Columns::Two) if page % 2 == 0 => Self::TwoColumnOddRight,
            (false, Columns::Two) => Self::TwoColumnOddLeft,
            (false, Columns::One) => Self::SingleOdd,
        }
    }

    /// Whether the page is printed on the back of a duplex sheet.
    pub fn is_back_side(&self) -> bool {
        matches!(
            self,
            Self::SingleEven | Self::TwoColumnEvenLeft | Self::TwoColumnEvenRight
        )
    }

    fn column(&self) -> Column {
        match self {
            Self::SingleOdd | Self::SingleEven => Column::Whole,
            Self::TwoColumnOddLeft | Self::TwoColumnEvenLeft => Column::Left,
            Self::TwoColumnOddRight | Self::TwoColumnEvenRight => Column::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Whole,
    Left,
    Right,
}

/// A configured margin length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Margin {
    Binding,
    Outer,
    Top,
    Bottom,
}

/// Which margin plays each role on one page, plus the punch mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EdgeRoles {
    head: Margin,
    foot: Margin,
    left: Margin,
    right: Margin,
    punch: Direction,
}

/// Role table keyed by (case, binding runs along a side edge).
///
/// When the binding edge is a side edge of the rendered page, front sides
/// bind on the left and back sides on the right. Otherwise the binding edge
/// is the head of front sides and the foot of back sides, and the top and
/// bottom margins move to the left and right. Back sides punch in the
/// opposite direction of front sides; only the column next to the binding
/// edge carries the mark.
fn edge_roles(case: PageCase, side_binding: bool) -> EdgeRoles {
    use Margin::*;

    let front = if side_binding { Direction::Left } else { Direction::Up };
    let back = front.opposite();
    let (head, foot, left, right) = match (side_binding, case.is_back_side()) {
        (true, false) => (Top, Bottom, Binding, Outer),
        (true, true) => (Top, Bottom, Outer, Binding),
        (false, false) => (Binding, Outer, Top, Bottom),
        (false, true) => (Outer, Binding, Top, Bottom),
    };
    let punch = match (case, side_binding) {
        (PageCase::SingleOdd, _) | (PageCase::TwoColumnOddLeft, _) => front,
        (PageCase::SingleEven, _) => back,
        (PageCase::TwoColumnEvenLeft, false) | (PageCase::TwoColumnEvenRight, true) => back,
        (PageCase::TwoColumnOddRight, _)
        | (PageCase::TwoColumnEvenLeft, true)
        | (PageCase::TwoColumnEvenRight, false) => Direction::None,
    };
    EdgeRoles {
        head,
        foot,
        left,
        right,
        punch,
    }
}

fn margin_len(layout: &LayoutConfig, margin: Margin) -> f64 {
    let m = &layout.margins;
    match margin {
        Margin::Binding => m.binding,
        Margin::Outer => m.outer,
        Margin::Top => m.top,
        Margin::Bottom => m.bottom,
    }
}

/// Whether the binding edge runs along a side (left/right) of the page as
/// rendered: long-edge binding on portrait, short-edge on landscape.
pub fn binds_on_side(layout: &LayoutConfig) -> bool {
    layout.orientation.is_portrait() == layout.binding_edge.is_long()
}

/// Frame for the 1-based `page`.
pub fn compute_frame(layout: &LayoutConfig, page: u32) -> PageFrame {
    let case = PageCase::for_page(layout, page);
    frame_for_case(layout, case)
}

/// Frame for an explicit case, independent of page numbering.
pub fn frame_for_case(layout: &LayoutConfig, case: PageCase) -> PageFrame {
    let roles = edge_roles(case, binds_on_side(layout));
    let head_top = margin_len(layout, roles.head);
    let margin_bottom = margin_len(layout, roles.foot);
    let left = margin_len(layout, roles.left);
    let right = margin_len(layout, roles.right);
    let page_width = layout.page_width;

    let (body_left, body_right, body_width) = match case.column() {
        Column::Whole => {
            let body_right = page_width - right;
            (left, body_right, body_right - left)
        }
        Column::Left => {
            let width = column_width(page_width, left, right, layout.margins.divide);
            (left, left + width, width)
        }
        Column::Right => {
            let width = column_width(page_width, left, right, layout.margins.divide);
            (left + width + layout.margins.divide, page_width - right, width)
        }
    };

    PageFrame {
        head_top,
        margin_bottom,
        body_left,
        body_right,
        body_width,
        punch: roles.punch,
    }
}

/// Both columns' frames for the sheet side holding `page`. The secondary
/// frame is present only in two-column mode.
pub fn side_frames(layout: &LayoutConfig, page: u32) -> (PageFrame, Option<PageFrame>) {
    match layout.columns {
        Columns::One => (compute_frame(layout, page), None),
        Columns::Two => {
            let first = if page % 2 == 0 { page.saturating_sub(1) } else { page };
            (
                compute_frame(layout, first),
                Some(compute_frame(layout, first + 1)),
            )
        }
    }
}

fn column_width(page_width: f64, left: f64, right: f64, divide: f64) -> f64 {
    (page_width - (left + right + divide)) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{BindingEdge, Margins, Orientation};

    fn layout(
        orientation: Orientation,
        columns: Columns,
        duplex: bool,
        binding_edge: BindingEdge,
    ) -> LayoutConfig {
        let (page_width, page_height) = match orientation {
            Orientation::Portrait => (600.0, 800.0),
            Orientation::Landscape => (800.0, 600.0),
        };
        LayoutConfig {
            orientation,
            columns,
            duplex,
            binding_edge,
            margins: Margins {
                binding: 70.0,
                outer: 30.0,
                top: 20.0,
                bottom: 40.0,
                divide: 10.0,
            },
            page_width,
            page_height,
        }
    }

    fn all_layouts() -> Vec<LayoutConfig> {
        let mut out = Vec::new();
        for orientation in [Orientation::Portrait, Orientation::Landscape] {
            for columns in [Columns::One, Columns::Two] {
                for duplex in [true, false] {
                    for edge in [BindingEdge::Long, BindingEdge::Short] {
                        out.push(layout(orientation, columns, duplex, edge));
                    }
                }
            }
        }
        out
    }

    #[test]
    fn portrait_long_edge_single_column_duplex() {
        let l = layout(Orientation::Portrait, Columns::One, true, BindingEdge::Long);
        let odd = compute_frame(&l, 1);
        assert_eq!(odd.head_top, 20.0);
        assert_eq!(odd.margin_bottom, 40.0);
        assert_eq!(odd.body_left, 70.0);
        assert_eq!(odd.body_right, 570.0);
        assert_eq!(odd.body_width, 500.0);
        assert_eq!(odd.punch, Direction::Left);

        let even = compute_frame(&l, 2);
        assert_eq!(even.body_left, 30.0);
        assert_eq!(even.body_right, 530.0);
        assert_eq!(even.punch, Direction::Right);
    }

    #[test]
    fn portrait_short_edge_binds_at_head() {
        let l = layout(Orientation::Portrait, Columns::One, true, BindingEdge::Short);
        let odd = compute_frame(&l, 1);
        assert_eq!(odd.head_top, 70.0);
        assert_eq!(odd.margin_bottom, 30.0);
        assert_eq!(odd.body_left, 20.0);
        assert_eq!(odd.body_right, 560.0);
        assert_eq!(odd.punch, Direction::Up);

        let even = compute_frame(&l, 2);
        assert_eq!(even.head_top, 30.0);
        assert_eq!(even.margin_bottom, 70.0);
        assert_eq!(even.punch, Direction::Down);
    }

    #[test]
    fn landscape_short_edge_matches_portrait_long_edge_roles() {
        let l = layout(Orientation::Landscape, Columns::One, true, BindingEdge::Short);
        let odd = compute_frame(&l, 1);
        assert_eq!(odd.head_top, 20.0);
        assert_eq!(odd.body_left, 70.0);
        assert_eq!(odd.body_right, 770.0);
        assert_eq!(odd.punch, Direction::Left);
    }

    #[test]
    fn landscape_long_edge_binds_at_head() {
        let l = layout(Orientation::Landscape, Columns::One, true, BindingEdge::Long);
        assert!(!binds_on_side(&l));
        let odd = compute_frame(&l, 1);
        assert_eq!(odd.head_top, 70.0);
        assert_eq!(odd.punch, Direction::Up);
    }

    #[test]
    fn two_column_duplex_cycles_through_four_cases() {
        let l = layout(Orientation::Landscape, Columns::Two, true, BindingEdge::Short);
        let cases: Vec<PageCase> = (1..=8).map(|p| PageCase::for_page(&l, p)).collect();
        assert_eq!(
            &cases[..4],
            &[
                PageCase::TwoColumnOddLeft,
                PageCase::TwoColumnOddRight,
                PageCase::TwoColumnEvenLeft,
                PageCase::TwoColumnEvenRight,
            ]
        );
        assert_eq!(&cases[..4], &cases[4..]);

        // Punch marks sit beside the binding edge only.
        let punches: Vec<Direction> = (1..=4).map(|p| compute_frame(&l, p).punch).collect();
        assert_eq!(
            punches,
            vec![Direction::Left, Direction::None, Direction::None, Direction::Right]
        );
    }

    #[test]
    fn two_column_head_binding_punches_left_column() {
        let l = layout(Orientation::Landscape, Columns::Two, true, BindingEdge::Long);
        let punches: Vec<Direction> = (1..=4).map(|p| compute_frame(&l, p).punch).collect();
        assert_eq!(
            punches,
            vec![Direction::Up, Direction::None, Direction::Down, Direction::None]
        );
        assert_eq!(compute_frame(&l, 3).head_top, 30.0);
        assert_eq!(compute_frame(&l, 3).margin_bottom, 70.0);
    }

    #[test]
    fn simplex_never_uses_back_side_cases() {
        for l in all_layouts().into_iter().filter(|l| !l.duplex) {
            for page in 1..=8 {
                assert!(!PageCase::for_page(&l, page).is_back_side());
            }
        }
    }

    #[test]
    fn frames_are_pure_and_order_independent() {
        for l in all_layouts() {
            let in_order: Vec<PageFrame> = (1..=8).map(|p| compute_frame(&l, p)).collect();
            let mut shuffled: Vec<(u32, PageFrame)> = [5, 2, 8, 1, 7, 3, 6, 4]
                .iter()
                .map(|&p| (p, compute_frame(&l, p)))
                .collect();
            shuffled.sort_by_key(|(p, _)| *p);
            for (i, (_, frame)) in shuffled.iter().enumerate() {
                assert_eq!(*frame, in_order[i]);
                assert_eq!(compute_frame(&l, i as u32 + 1), *frame);
            }
        }
    }

    #[test]
    fn two_column_margin_partition() {
        for l in all_layouts().into_iter().filter(|l| l.columns == Columns::Two) {
            for page in [1u32, 3, 5] {
                let (left, right) = side_frames(&l, page);
                let right = right.unwrap();
                let divide = l.margins.divide;
                assert_eq!(left.body_width, right.body_width);
                assert_eq!(right.body_left, left.body_left + left.body_width + divide);
                let case = PageCase::for_page(&l, page);
                let roles = edge_roles(case, binds_on_side(&l));
                let outer_margins = margin_len(&l, roles.left) + margin_len(&l, roles.right);
                let span = right.body_right - left.body_left;
                assert!((span - (l.page_width - outer_margins)).abs() < 1e-9);
                assert!(((right.body_right - right.body_left) - right.body_width).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn single_column_width_matches_bounds() {
        for l in all_layouts().into_iter().filter(|l| l.columns == Columns::One) {
            for page in 1..=4 {
                let f = compute_frame(&l, page);
                assert_eq!(f.body_width, f.body_right - f.body_left);
                assert!(f.body_width > 0.0);
            }
        }
    }

    #[test]
    fn no_binding_edge_behaves_as_long_edge() {
        let mut l = layout(Orientation::Portrait, Columns::One, true, BindingEdge::None);
        l.margins.binding = l.margins.outer;
        let odd = compute_frame(&l, 1);
        let even = compute_frame(&l, 2);
        assert_eq!(odd.body_left, even.body_left);
        assert_eq!(odd.body_width, even.body_width);
    }

    #[test]
    fn side_frames_pairs_columns() {
        let l = layout(Orientation::Portrait, Columns::Two, true, BindingEdge::Long);
        let (a, b) = side_frames(&l, 4);
        assert_eq!(a, compute_frame(&l, 3));
        assert_eq!(b, Some(compute_frame(&l, 4)));
        let single = layout(Orientation::Portrait, Columns::One, true, BindingEdge::Long);
        assert!(side_frames(&single, 1).1.is_none());
    }
}
