use crate::controller::{ClearOutcome, ClickOutcome, PageController};
use crate::dom::{Dom, NodeId, is_radio_input, is_submit_control};
use crate::html::parse_html;
use crate::{Error, Result};

// User actions can recurse through deep DOM trees; grow the stack the same
// amount for every entry point.
const ACTION_STACK_BYTES: usize = 32 * 1024 * 1024;

/// Deterministic driver for the page: parses markup, mounts the view-state
/// controller, then lets tests fire events and assert the resulting DOM.
#[derive(Debug)]
pub struct Harness {
    dom: Dom,
    controller: PageController,
    alerts: Vec<String>,
    trace: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Harness {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        let controller = PageController::mount(&dom)?;
        Ok(Self {
            dom,
            controller,
            alerts: Vec::new(),
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        })
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::HandlerFault(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    /// Blocking notifications the page raised since the last call, oldest
    /// first.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        stacker::grow(ACTION_STACK_BYTES, || self.click_node(target))
    }

    fn click_node(&mut self, target: NodeId) -> Result<()> {
        match self.controller.handle_click(&mut self.dom, target)? {
            ClickOutcome::TabActivated { level, shown } => {
                self.trace_line(format!(
                    "[tabs] {} shown={shown}",
                    level.trigger_class()
                ));
                return Ok(());
            }
            ClickOutcome::RowAppended { row } => {
                self.trace_line(format!("[table] append row={row}"));
                return Ok(());
            }
            ClickOutcome::RowDeleted { removed } => {
                self.trace_line(format!("[table] delete_one removed={removed}"));
                return Ok(());
            }
            ClickOutcome::Ignored => {}
        }

        if is_radio_input(&self.dom, target) && !self.dom.checked(target)? {
            self.check_radio(target)?;
            return Ok(());
        }

        if is_submit_control(&self.dom, target) {
            if let Some(form) = self.dom.find_ancestor_by_tag(target, "form") {
                self.submit_form(form)?;
            }
        }
        Ok(())
    }

    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let form = if self
            .dom
            .tag_name(target)
            .map(|tag| tag.eq_ignore_ascii_case("form"))
            .unwrap_or(false)
        {
            Some(target)
        } else {
            self.dom.find_ancestor_by_tag(target, "form")
        };

        match form {
            Some(form) => stacker::grow(ACTION_STACK_BYTES, || self.submit_form(form)),
            None => Ok(()),
        }
    }

    fn submit_form(&mut self, form: NodeId) -> Result<()> {
        if let Some(value) = self.controller.handle_submit(&self.dom, form)? {
            self.trace_line(format!("[form] options={value}"));
            self.alerts.push(format!("You selected: {value}"));
        }
        Ok(())
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_ascii_lowercase();
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, text)
    }

    /// Selects an option by value and runs the change handler, which for
    /// `#algorithm` recomputes dependent field-group visibility.
    pub fn select_value(&mut self, selector: &str, value: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if tag != "select" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "select".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, value)?;
        stacker::grow(ACTION_STACK_BYTES, || {
            if let Some(selected) = self.controller.handle_change(&mut self.dom, target)? {
                self.trace_line(format!("[form] algorithm={selected}"));
            }
            Ok(())
        })
    }

    pub fn set_checked(&mut self, selector: &str, checked: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if tag != "input" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input[type=checkbox|radio]".into(),
                actual: tag,
            });
        }
        let kind = self
            .dom
            .attr(target, "type")
            .unwrap_or_else(|| "text".into())
            .to_ascii_lowercase();
        if kind != "checkbox" && kind != "radio" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input[type=checkbox|radio]".into(),
                actual: format!("input[type={kind}]"),
            });
        }

        if self.dom.checked(target)? != checked {
            if kind == "radio" && checked {
                self.check_radio(target)?;
            } else {
                self.dom.set_checked(target, checked)?;
            }
        }
        Ok(())
    }

    fn check_radio(&mut self, target: NodeId) -> Result<()> {
        for member in self.dom.radio_group_members(target) {
            self.dom.set_checked(member, member == target)?;
        }
        Ok(())
    }

    /// Rebuilds `#table-1` from the current `#rowCount` value. Returns the
    /// number of rows produced.
    pub fn create_table(&mut self) -> Result<usize> {
        let rows = stacker::grow(ACTION_STACK_BYTES, || {
            self.controller.create_table(&mut self.dom)
        })?;
        self.trace_line(format!("[table] create rows={rows}"));
        Ok(rows)
    }

    /// Appends one row to `#table-2`; returns its 1-based position.
    pub fn add_row(&mut self) -> Result<usize> {
        let row = stacker::grow(ACTION_STACK_BYTES, || {
            self.controller.add_row(&mut self.dom)
        })?;
        self.trace_line(format!("[table] append row={row}"));
        Ok(row)
    }

    /// Clears all body rows of the table with the given id. A table without
    /// a tbody is left untouched and reported in the diagnostic log.
    pub fn delete_rows(&mut self, table_id: &str) -> Result<()> {
        let outcome = stacker::grow(ACTION_STACK_BYTES, || {
            self.controller.delete_rows(&mut self.dom, table_id)
        })?;
        match outcome {
            ClearOutcome::Cleared(count) => {
                self.trace_line(format!("[table] clear id={table_id} rows={count}"));
            }
            ClearOutcome::MissingBody => {
                self.log_error(format!("table body for id \"{table_id}\" not found"));
            }
        }
        Ok(())
    }

    /// Removes the row enclosing the selected element, if any. Returns
    /// whether a row was removed.
    pub fn delete_one_row(&mut self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        let removed = self.controller.delete_one_row(&mut self.dom, target)?;
        self.trace_line(format!("[table] delete_one removed={removed}"));
        Ok(removed)
    }

    pub fn query_count(&self, selector: &str) -> Result<usize> {
        Ok(self.dom.query_selector_all(selector)?.len())
    }

    pub fn display_of(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.style_get(target, "display")
    }

    pub fn visibility_of(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.style_get(target, "visibility")
    }

    pub fn row_count(&self, table_selector: &str) -> Result<usize> {
        let body = self.table_body(table_selector)?;
        Ok(self.body_rows(body).len())
    }

    /// Text of the body cell at 1-based (row, column) coordinates.
    pub fn cell_text(&self, table_selector: &str, row: usize, column: usize) -> Result<String> {
        let body = self.table_body(table_selector)?;
        let rows = self.body_rows(body);
        let row_node = row
            .checked_sub(1)
            .and_then(|index| rows.get(index).copied())
            .ok_or_else(|| {
                Error::HandlerFault(format!("{table_selector} has no body row {row}"))
            })?;
        let cells = self
            .dom
            .children(row_node)
            .iter()
            .copied()
            .filter(|child| {
                self.dom
                    .tag_name(*child)
                    .map(|tag| tag.eq_ignore_ascii_case("td"))
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();
        let cell = column
            .checked_sub(1)
            .and_then(|index| cells.get(index).copied())
            .ok_or_else(|| {
                Error::HandlerFault(format!(
                    "{table_selector} row {row} has no column {column}"
                ))
            })?;
        Ok(self.dom.text_content(cell))
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_checked(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.checked(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    /// Asserts the selected trigger carries the active marker class.
    pub fn assert_active(&self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if !self.dom.class_contains(target, crate::tabs::ACTIVE_CLASS)? {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: "class list containing \"active\"".into(),
                actual: self
                    .dom
                    .attr(target, "class")
                    .unwrap_or_else(|| "(no class attr)".into()),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_display(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.style_get(target, "display")?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("display: {expected}"),
                actual: format!("display: {actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_visibility(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.style_get(target, "visibility")?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("visibility: {expected}"),
                actual: format!("visibility: {actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_row_count(&self, table_selector: &str, expected: usize) -> Result<()> {
        let actual = self.row_count(table_selector)?;
        if actual != expected {
            let target = self.select_one(table_selector)?;
            return Err(Error::AssertionFailed {
                selector: table_selector.to_string(),
                expected: format!("{expected} body rows"),
                actual: format!("{actual} body rows"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn table_body(&self, table_selector: &str) -> Result<NodeId> {
        let table = self.select_one(table_selector)?;
        self.dom
            .find_first_descendant_by_tag(table, "tbody")
            .ok_or_else(|| Error::HandlerFault(format!("{table_selector} has no tbody")))
    }

    fn body_rows(&self, body: NodeId) -> Vec<NodeId> {
        self.dom
            .children(body)
            .iter()
            .copied()
            .filter(|child| {
                self.dom
                    .tag_name(*child)
                    .map(|tag| tag.eq_ignore_ascii_case("tr"))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    fn trace_line(&mut self, line: String) {
        if !self.trace {
            return;
        }
        self.push_log(line);
    }

    fn log_error(&mut self, line: String) {
        self.push_log(line);
    }

    fn push_log(&mut self, line: String) {
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        self.trace_logs.push(line);
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (count, ch) in value.chars().enumerate() {
        if count >= max_chars {
            out.push('…');
            break;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SAMPLE_PAGE_HTML;

    #[test]
    fn sample_page_mounts_with_its_initial_state() -> Result<()> {
        let harness = Harness::from_html(SAMPLE_PAGE_HTML)?;
        harness.assert_active("#tab-1")?;
        harness.assert_active("#subtab-1-1")?;
        harness.assert_active("#subsubtab-1-2-1")?;
        harness.assert_display("#content-1", "block")?;
        harness.assert_display("#content-2", "none")?;
        harness.assert_value("#algorithm", "1")?;
        Ok(())
    }

    #[test]
    fn mount_fails_without_the_page_fixtures() {
        let err = Harness::from_html("<p>not the page</p>").unwrap_err();
        assert!(matches!(err, Error::Binding(_)));
    }

    #[test]
    fn clicking_a_non_wired_element_is_a_no_op() -> Result<()> {
        let mut harness = Harness::from_html(SAMPLE_PAGE_HTML)?;
        harness.click("h1")?;
        harness.assert_active("#tab-1")?;
        Ok(())
    }

    #[test]
    fn trace_log_limit_drops_oldest_entries() -> Result<()> {
        let mut harness = Harness::from_html(SAMPLE_PAGE_HTML)?;
        harness.enable_trace(true);
        harness.set_trace_stderr(false);
        harness.set_trace_log_limit(2)?;

        harness.add_row()?;
        harness.add_row()?;
        harness.add_row()?;

        let logs = harness.take_trace_logs();
        assert_eq!(logs.len(), 2);
        assert!(logs[0].contains("row=3"));
        assert!(logs[1].contains("row=4"));
        Ok(())
    }

    #[test]
    fn trace_log_limit_of_zero_is_rejected() {
        let mut harness = Harness::from_html(SAMPLE_PAGE_HTML).unwrap();
        assert!(harness.set_trace_log_limit(0).is_err());
    }

    #[test]
    fn type_text_rejects_non_input_targets() {
        let mut harness = Harness::from_html(SAMPLE_PAGE_HTML).unwrap();
        let err = harness.type_text("#content-1", "5").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}
