//! Rendering a merge grid for humans: an ASCII char matrix (optionally
//! colorized) and an HTML table, both driven by the same cell classification.
//! Grounded in the original's `MergeState.get_diagram`/`write_html`; recolored
//! using `git_utils::color` rather than `git-diff`'s diff-specific slots,
//! since none of `git-diff`'s `ColorSlot`s name a merge-cell concept.
//!
//! `MergeRecord` doesn't retain "was this cell ever blocked and then
//! resolved" as a distinct bit from "resolved" (see `imerge_grid::cell`), so
//! the original's `@` (previously-blocked, now-unblocked) character can't be
//! told apart from a plain auto/manual cell here. We fold that case into the
//! ordinary `.`/`*` characters rather than guess; see `DESIGN.md`.

use std::fmt::Write as _;

use git_utils::color::{colorize, Color};
use imerge_grid::{Grid, MergeState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Unknown,
    Auto,
    Manual,
    Blocked,
}

fn classify(grid: &Grid, i1: usize, i2: usize) -> CellKind {
    let cell = grid.get(i1, i2);
    if cell.blocked {
        CellKind::Blocked
    } else if cell.is_manual() {
        CellKind::Manual
    } else if cell.is_auto() {
        CellKind::Auto
    } else {
        CellKind::Unknown
    }
}

impl CellKind {
    fn ch(self) -> char {
        match self {
            CellKind::Unknown => '?',
            CellKind::Auto => '.',
            CellKind::Manual => '*',
            CellKind::Blocked => '#',
        }
    }

    fn color(self) -> Color {
        match self {
            CellKind::Unknown => Color::Dim,
            CellKind::Auto => Color::Cyan,
            CellKind::Manual => Color::Green,
            CellKind::Blocked => Color::Red,
        }
    }

    fn css_class(self) -> &'static str {
        match self {
            CellKind::Unknown => "unknown",
            CellKind::Auto => "auto",
            CellKind::Manual => "manual",
            CellKind::Blocked => "blocked",
        }
    }
}

/// Render the `(m+1) x (n+1)` grid as rows of one character per cell, tip1's
/// commits down the side (i1 increasing downward) and tip2's across the top
/// (i2 increasing rightward) — matching the original's row/column sense.
pub fn render_ascii(state: &MergeState, color_enabled: bool) -> String {
    let grid = &state.grid;
    let mut out = String::new();
    for i1 in 0..=grid.m() {
        for i2 in 0..=grid.n() {
            let kind = classify(grid, i1, i2);
            let ch = kind.ch().to_string();
            let _ = write!(out, "{}", colorize(&ch, kind.color(), color_enabled));
        }
        out.push('\n');
    }
    out
}

/// The legend the original prints under every diagram.
pub fn legend(color_enabled: bool) -> String {
    let mut out = String::new();
    out.push_str("Key:\n");
    for kind in [CellKind::Manual, CellKind::Auto, CellKind::Blocked, CellKind::Unknown] {
        let label = match kind {
            CellKind::Manual => "manually-recorded merge",
            CellKind::Auto => "automatically-recorded merge",
            CellKind::Blocked => "blocked; needs a manual merge",
            CellKind::Unknown => "not yet attempted",
        };
        let ch = colorize(&kind.ch().to_string(), kind.color(), color_enabled);
        let _ = writeln!(out, "  {ch} = {label}");
    }
    out
}

/// Render the grid as an HTML `<table>` with one `<td>` per cell, classed
/// for external CSS, plus a small embedded stylesheet so the file is
/// viewable standalone (the original's `write_html` does the same).
pub fn render_html(name: &str, state: &MergeState) -> String {
    let grid = &state.grid;
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>imerge: {name}</title>");
    out.push_str(
        "<style>\n\
         table.imerge { border-collapse: collapse; font-family: monospace; }\n\
         table.imerge td { width: 1.4em; height: 1.4em; text-align: center; border: 1px solid #ccc; }\n\
         td.manual { background: #b8f2b8; }\n\
         td.auto { background: #bfe8f2; }\n\
         td.blocked { background: #f2b8b8; }\n\
         td.unknown { background: #eee; color: #999; }\n\
         </style>\n</head><body>\n",
    );
    let _ = writeln!(out, "<h1>imerge: {name}</h1>");
    out.push_str("<table class=\"imerge\">\n");
    for i1 in 0..=grid.m() {
        out.push_str("<tr>");
        for i2 in 0..=grid.n() {
            let kind = classify(grid, i1, i2);
            let _ = write!(out, "<td class=\"{}\">{}</td>", kind.css_class(), kind.ch());
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n</body></html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_hash::{HashAlgorithm, ObjectId};
    use imerge_grid::{Goal, GoalOpts};

    fn oid(b: u8) -> imerge_vcs::Oid {
        ObjectId::from_bytes(&[b; 20], HashAlgorithm::Sha1).unwrap()
    }

    fn sample_state() -> MergeState {
        let mut grid = Grid::new(1, 1);
        grid.get_mut(0, 0).record_manual(oid(1));
        grid.get_mut(1, 0).record_manual(oid(2));
        grid.get_mut(0, 1).record_manual(oid(3));
        grid.get_mut(1, 1).record_auto(oid(4));
        MergeState::new(
            "test".to_string(),
            oid(2),
            oid(3),
            Goal::Full,
            GoalOpts::default(),
            false,
            "test".to_string(),
            grid,
        )
    }

    #[test]
    fn ascii_grid_has_one_row_per_i1() {
        let state = sample_state();
        let rendered = render_ascii(&state, false);
        assert_eq!(rendered.lines().count(), 2);
        assert_eq!(rendered.lines().next().unwrap().chars().count(), 2);
    }

    #[test]
    fn known_auto_cell_renders_as_dot() {
        let state = sample_state();
        let rendered = render_ascii(&state, false);
        let last_line = rendered.lines().last().unwrap();
        assert_eq!(last_line.chars().last(), Some('.'));
    }

    #[test]
    fn html_contains_a_cell_per_grid_position() {
        let state = sample_state();
        let html = render_html("test", &state);
        assert_eq!(html.matches("<td").count(), 4);
    }
}
