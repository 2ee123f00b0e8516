use std::collections::HashMap;

use crate::dom::{Dom, NodeId};
use crate::tabs::{TabGroup, TabLevel};
use crate::{Error, Result};

const DELETE_ROW_CLASS: &str = "btn-delete-row";
const RADIO_GROUP_NAME: &str = "options";

/// Outcome of routing a click through the controller. `Ignored` means the
/// target has no registered behavior; the harness then falls back to generic
/// control semantics (radio toggling, form submission).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClickOutcome {
    TabActivated { level: TabLevel, shown: String },
    RowAppended { row: usize },
    RowDeleted { removed: bool },
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClearOutcome {
    Cleared(usize),
    MissingBody,
}

/// View-state controller for the document page. All element references are
/// captured once at mount time; a missing element surfaces as
/// `Error::Binding` up front instead of a fault in the middle of a handler.
#[derive(Debug)]
pub(crate) struct PageController {
    primary: TabGroup,
    secondary: TabGroup,
    tertiary: TabGroup,
    row_count_input: NodeId,
    table_1_body: NodeId,
    table_2_body: NodeId,
    add_row_button: NodeId,
    radio_form: NodeId,
    algorithm_select: NodeId,
    seed_group: NodeId,
    stop_group: NodeId,
    package_group: NodeId,
}

impl PageController {
    pub(crate) fn mount(dom: &Dom) -> Result<Self> {
        let primary = TabGroup::capture(dom, TabLevel::Primary)?;
        let secondary = TabGroup::capture(dom, TabLevel::Secondary)?;
        let tertiary = TabGroup::capture(dom, TabLevel::Tertiary)?;

        Ok(Self {
            primary,
            secondary,
            tertiary,
            row_count_input: bind(dom, "rowCount")?,
            table_1_body: bind_table_body(dom, "table-1")?,
            table_2_body: bind_table_body(dom, "table-2")?,
            add_row_button: bind(dom, "btn-add-row")?,
            radio_form: bind(dom, "radio-btn")?,
            algorithm_select: bind(dom, "algorithm")?,
            seed_group: bind(dom, "seedGroup")?,
            stop_group: bind(dom, "stopGroup")?,
            package_group: bind(dom, "packageGroup")?,
        })
    }

    pub(crate) fn handle_click(&mut self, dom: &mut Dom, target: NodeId) -> Result<ClickOutcome> {
        if let Some(index) = self.primary.entry_index_of(target) {
            let shown = self.primary.activate_from_click(dom, index)?;
            if let Some((_, reset)) = self
                .primary
                .level()
                .cascade_resets()
                .iter()
                .find(|(landing, _)| *landing == shown)
            {
                self.secondary.reset_to_target(dom, reset)?;
            }
            return Ok(ClickOutcome::TabActivated {
                level: TabLevel::Primary,
                shown,
            });
        }

        if let Some(index) = self.secondary.entry_index_of(target) {
            let shown = self.secondary.activate_from_click(dom, index)?;
            if let Some((_, reset)) = self
                .secondary
                .level()
                .cascade_resets()
                .iter()
                .find(|(landing, _)| *landing == shown)
            {
                self.tertiary.reset_to_target(dom, reset)?;
            }
            return Ok(ClickOutcome::TabActivated {
                level: TabLevel::Secondary,
                shown,
            });
        }

        if let Some(index) = self.tertiary.entry_index_of(target) {
            let shown = self.tertiary.activate_from_click(dom, index)?;
            return Ok(ClickOutcome::TabActivated {
                level: TabLevel::Tertiary,
                shown,
            });
        }

        if target == self.add_row_button {
            let row = self.add_row(dom)?;
            return Ok(ClickOutcome::RowAppended { row });
        }

        if dom.class_contains(target, DELETE_ROW_CLASS)? {
            let removed = self.delete_one_row(dom, target)?;
            return Ok(ClickOutcome::RowDeleted { removed });
        }

        Ok(ClickOutcome::Ignored)
    }

    /// Reads `#rowCount` and rebuilds `#table-1`'s body as an N x 4 grid.
    /// Non-numeric or negative input silently yields an empty body.
    pub(crate) fn create_table(&self, dom: &mut Dom) -> Result<usize> {
        let rows = parse_row_count(&dom.value(self.row_count_input)?);
        dom.set_text_content(self.table_1_body, "")?;
        for i in 1..=rows {
            let row = dom.create_element(self.table_1_body, "tr".into(), HashMap::new());
            for j in 1..=4 {
                let cell = dom.create_element(row, "td".into(), HashMap::new());
                dom.create_text(cell, format!("Row {i}, Column {j}"));
            }
        }
        Ok(rows)
    }

    /// Appends one 6-cell row to `#table-2`; cell text encodes the row's new
    /// 1-based position. Returns that position.
    pub(crate) fn add_row(&self, dom: &mut Dom) -> Result<usize> {
        let position = row_children(dom, self.table_2_body).len() + 1;
        let row = dom.create_element(self.table_2_body, "tr".into(), HashMap::new());
        for column in 1..=6 {
            let cell = dom.create_element(row, "td".into(), HashMap::new());
            dom.create_text(cell, format!("Cell {position}.{column}"));
        }
        Ok(position)
    }

    /// Clears all body rows of the named table, leaving the header intact.
    /// A table without a tbody is reported as `MissingBody` and left alone.
    pub(crate) fn delete_rows(&self, dom: &mut Dom, table_id: &str) -> Result<ClearOutcome> {
        let table = dom
            .by_id(table_id)
            .ok_or_else(|| Error::HandlerFault(format!("no table with id {table_id:?}")))?;
        let Some(body) = dom.find_first_descendant_by_tag(table, "tbody") else {
            return Ok(ClearOutcome::MissingBody);
        };
        let rows = row_children(dom, body);
        let count = rows.len();
        for row in rows {
            dom.remove_node(row)?;
        }
        Ok(ClearOutcome::Cleared(count))
    }

    /// Removes the nearest enclosing `tr` of `node`; no-op without one.
    pub(crate) fn delete_one_row(&self, dom: &mut Dom, node: NodeId) -> Result<bool> {
        match dom.closest_tag(node, "tr") {
            Some(row) => {
                dom.remove_node(row)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub(crate) fn handle_change(&self, dom: &mut Dom, target: NodeId) -> Result<Option<String>> {
        if target == self.algorithm_select {
            return self.apply_algorithm_visibility(dom).map(Some);
        }
        Ok(None)
    }

    /// Recomputes dependent field-group visibility from `#algorithm`'s value:
    /// "2" and "3" reveal the seed and stop groups, "3" additionally the
    /// package group, anything else hides all three.
    pub(crate) fn apply_algorithm_visibility(&self, dom: &mut Dom) -> Result<String> {
        let selected = dom.value(self.algorithm_select)?;

        dom.style_set(self.seed_group, "visibility", "hidden")?;
        dom.style_set(self.stop_group, "visibility", "hidden")?;
        dom.style_set(self.package_group, "visibility", "hidden")?;

        if selected == "2" || selected == "3" {
            dom.style_set(self.seed_group, "visibility", "visible")?;
            dom.style_set(self.stop_group, "visibility", "visible")?;
        }
        if selected == "3" {
            dom.style_set(self.package_group, "visibility", "visible")?;
        }
        Ok(selected)
    }

    /// Submission of the options form: reads the checked radio's value.
    /// Faults when nothing is checked, matching the page's unguarded lookup;
    /// the document state is untouched and later events still work.
    pub(crate) fn handle_submit(&self, dom: &Dom, form: NodeId) -> Result<Option<String>> {
        if form != self.radio_form {
            return Ok(None);
        }
        let checked = dom
            .query_selector(&format!("input[name=\"{RADIO_GROUP_NAME}\"]:checked"))?
            .ok_or_else(|| {
                Error::HandlerFault(format!(
                    "no checked input in radio group {RADIO_GROUP_NAME:?}"
                ))
            })?;
        Ok(Some(dom.value(checked)?))
    }
}

fn bind(dom: &Dom, id: &str) -> Result<NodeId> {
    dom.by_id(id)
        .ok_or_else(|| Error::Binding(format!("missing element #{id}")))
}

fn bind_table_body(dom: &Dom, table_id: &str) -> Result<NodeId> {
    let table = bind(dom, table_id)?;
    dom.find_first_descendant_by_tag(table, "tbody")
        .ok_or_else(|| Error::Binding(format!("table #{table_id} has no tbody")))
}

fn row_children(dom: &Dom, body: NodeId) -> Vec<NodeId> {
    dom.children(body)
        .iter()
        .copied()
        .filter(|child| {
            dom.tag_name(*child)
                .map(|tag| tag.eq_ignore_ascii_case("tr"))
                .unwrap_or(false)
        })
        .collect()
}

fn parse_row_count(raw: &str) -> usize {
    raw.trim()
        .parse::<i64>()
        .map(|n| n.max(0) as usize)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::sample::SAMPLE_PAGE_HTML;

    #[test]
    fn mount_captures_every_fixed_reference() -> crate::Result<()> {
        let dom = parse_html(SAMPLE_PAGE_HTML)?;
        let controller = PageController::mount(&dom)?;
        assert_eq!(controller.primary.entries().len(), 5);
        assert_eq!(controller.primary.active_index(), Some(0));
        Ok(())
    }

    #[test]
    fn mount_fails_fast_on_a_missing_element() {
        let html = SAMPLE_PAGE_HTML.replace("id=\"rowCount\"", "id=\"row-count\"");
        let dom = parse_html(&html).unwrap();
        let err = PageController::mount(&dom).unwrap_err();
        assert_eq!(err, Error::Binding("missing element #rowCount".into()));
    }

    #[test]
    fn row_count_parsing_treats_garbage_as_zero() {
        assert_eq!(parse_row_count("7"), 7);
        assert_eq!(parse_row_count(" 3 "), 3);
        assert_eq!(parse_row_count("0"), 0);
        assert_eq!(parse_row_count("-4"), 0);
        assert_eq!(parse_row_count("abc"), 0);
        assert_eq!(parse_row_count(""), 0);
    }
}
