use std::collections::HashSet;

use crate::dom::{Dom, NodeId, has_class};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SelectorStep {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
    checked: bool,
}

impl SelectorStep {
    fn id_only(&self) -> Option<&str> {
        if !self.universal
            && self.tag.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && !self.checked
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectorCombinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorPart {
    step: SelectorStep,
    // Relation to previous (left) selector part.
    combinator: Option<SelectorCombinator>,
}

impl Dom {
    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let all = self.query_selector_all(selector)?;
        Ok(all.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;

        if groups.len() == 1 && groups[0].len() == 1 {
            if let Some(id) = groups[0][0].step.id_only() {
                return Ok(self.by_id(id).into_iter().collect());
            }
        }

        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root(), &mut ids);

        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for candidate in ids {
            if groups
                .iter()
                .any(|steps| self.matches_selector_chain(candidate, steps))
                && seen.insert(candidate)
            {
                matched.push(candidate);
            }
        }
        Ok(matched)
    }

    fn matches_selector_chain(&self, node_id: NodeId, parts: &[SelectorPart]) -> bool {
        let Some((last, rest)) = parts.split_last() else {
            return false;
        };
        if !self.matches_step(node_id, &last.step) {
            return false;
        }
        match last.combinator {
            None => true,
            Some(SelectorCombinator::Child) => self
                .parent(node_id)
                .map(|parent| self.matches_selector_chain(parent, rest))
                .unwrap_or(false),
            Some(SelectorCombinator::Descendant) => {
                let mut cursor = self.parent(node_id);
                while let Some(current) = cursor {
                    if self.matches_selector_chain(current, rest) {
                        return true;
                    }
                    cursor = self.parent(current);
                }
                false
            }
        }
    }

    fn matches_step(&self, node_id: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };
        if let Some(tag) = &step.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &step.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }
        for class_name in &step.classes {
            if !has_class(element, class_name) {
                return false;
            }
        }
        for (name, expected) in &step.attrs {
            match (element.attrs.get(name), expected) {
                (None, _) => return false,
                (Some(_), None) => {}
                (Some(actual), Some(expected)) => {
                    if actual != expected {
                        return false;
                    }
                }
            }
        }
        if step.checked {
            let is_checked_input =
                element.tag_name.eq_ignore_ascii_case("input") && element.checked;
            let is_selected_option = element.tag_name.eq_ignore_ascii_case("option")
                && element.attrs.contains_key("selected");
            if !is_checked_input && !is_selected_option {
                return false;
            }
        }
        true
    }
}

fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let groups = split_selector_groups(selector)?;
    let mut parsed = Vec::with_capacity(groups.len());
    for group in groups {
        parsed.push(parse_selector_chain(&group)?);
    }
    Ok(parsed)
}

fn split_selector_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            ',' if bracket_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let tokens = tokenize_selector(selector)?;
    let mut steps = Vec::new();
    let mut pending_combinator: Option<SelectorCombinator> = None;

    for token in tokens {
        if token == ">" {
            if pending_combinator.is_some() || steps.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            pending_combinator = Some(SelectorCombinator::Child);
            continue;
        }
        if token == "+" || token == "~" {
            return Err(Error::UnsupportedSelector(selector.into()));
        }

        let step = parse_selector_step(&token)?;
        let combinator = if steps.is_empty() {
            None
        } else {
            Some(
                pending_combinator
                    .take()
                    .unwrap_or(SelectorCombinator::Descendant),
            )
        };
        steps.push(SelectorPart { step, combinator });
    }

    if steps.is_empty() || pending_combinator.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    Ok(steps)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            '>' | '+' | '~' if bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(ch.to_string());
            }
            ch if ch.is_ascii_whitespace() && bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    Ok(tokens)
}

fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let part = part.trim();
    if part.is_empty() {
        return Err(Error::UnsupportedSelector(part.into()));
    }

    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    if bytes[0] == b'*' {
        step.universal = true;
        i = 1;
    } else if let Some((tag, next)) = parse_selector_ident(part, 0) {
        step.tag = Some(tag.to_ascii_lowercase());
        i = next;
    }

    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                let Some((id, next)) = parse_selector_ident(part, i + 1) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                if step.id.replace(id).is_some() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                i = next;
            }
            b'.' => {
                let Some((class_name, next)) = parse_selector_ident(part, i + 1) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_selector_attr_condition(part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            b':' => {
                let Some((pseudo, next)) = parse_selector_ident(part, i + 1) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                if pseudo != "checked" {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                step.checked = true;
                i = next;
            }
            _ => return Err(Error::UnsupportedSelector(part.into())),
        }
    }
    Ok(step)
}

fn parse_selector_ident(part: &str, from: usize) -> Option<(String, usize)> {
    let bytes = part.as_bytes();
    let mut i = from;
    while i < bytes.len()
        && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-' || bytes[i] == b'_')
    {
        i += 1;
    }
    if i == from {
        return None;
    }
    part.get(from..i).map(|ident| (ident.to_string(), i))
}

fn parse_selector_attr_condition(
    part: &str,
    from: usize,
) -> Result<((String, Option<String>), usize)> {
    let bytes = part.as_bytes();
    let mut i = from + 1;

    let Some((name, next)) = parse_selector_ident(part, i) else {
        return Err(Error::UnsupportedSelector(part.into()));
    };
    i = next;

    if bytes.get(i) == Some(&b']') {
        return Ok(((name, None), i + 1));
    }

    if bytes.get(i) != Some(&b'=') {
        return Err(Error::UnsupportedSelector(part.into()));
    }
    i += 1;

    let value = match bytes.get(i) {
        Some(&quote @ (b'"' | b'\'')) => {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            if i >= bytes.len() {
                return Err(Error::UnsupportedSelector(part.into()));
            }
            let value = part
                .get(start..i)
                .ok_or_else(|| Error::UnsupportedSelector(part.into()))?
                .to_string();
            i += 1;
            value
        }
        _ => {
            let start = i;
            while i < bytes.len() && bytes[i] != b']' {
                i += 1;
            }
            part.get(start..i)
                .ok_or_else(|| Error::UnsupportedSelector(part.into()))?
                .trim()
                .to_string()
        }
    };

    if bytes.get(i) != Some(&b']') {
        return Err(Error::UnsupportedSelector(part.into()));
    }
    Ok(((name, Some(value)), i + 1))
}

#[cfg(test)]
mod tests {
    use crate::html::parse_html;

    #[test]
    fn class_and_id_selectors_match() -> crate::Result<()> {
        let dom = parse_html(
            "<a id='one' class='tab-link active' href='#content-1'></a>\
             <a id='two' class='tab-link' href='#content-2'></a>",
        )?;
        let links = dom.query_selector_all(".tab-link")?;
        assert_eq!(links.len(), 2);

        let active = dom.query_selector(".tab-link.active")?.unwrap();
        assert_eq!(dom.attr(active, "id").as_deref(), Some("one"));
        Ok(())
    }

    #[test]
    fn attribute_value_selector_matches_href() -> crate::Result<()> {
        let dom = parse_html(
            "<a id='one' class='tab-link' href='#content-1'></a>\
             <a id='two' class='tab-link' href='#content-2'></a>",
        )?;
        let second = dom
            .query_selector(".tab-link[href=\"#content-2\"]")?
            .unwrap();
        assert_eq!(dom.attr(second, "id").as_deref(), Some("two"));
        Ok(())
    }

    #[test]
    fn checked_pseudo_matches_only_checked_radios() -> crate::Result<()> {
        let dom = parse_html(
            "<input type='radio' name='options' value='a'>\
             <input type='radio' name='options' value='b' checked>",
        )?;
        let checked = dom
            .query_selector("input[name=\"options\"]:checked")?
            .unwrap();
        assert_eq!(dom.value(checked)?, "b");
        Ok(())
    }

    #[test]
    fn descendant_and_child_combinators_match() -> crate::Result<()> {
        let dom = parse_html(
            "<table id='t'><thead><tr><th>h</th></tr></thead>\
             <tbody><tr id='r'><td>c</td></tr></tbody></table>",
        )?;
        let rows = dom.query_selector_all("#t tbody tr")?;
        assert_eq!(rows.len(), 1);
        let cells = dom.query_selector_all("tbody > tr > td")?;
        assert_eq!(cells.len(), 1);
        let header_cells = dom.query_selector_all("#t thead th")?;
        assert_eq!(header_cells.len(), 1);
        Ok(())
    }

    #[test]
    fn sibling_combinators_are_unsupported() {
        let dom = parse_html("<p></p>").unwrap();
        let err = dom.query_selector("p + p").unwrap_err();
        assert!(matches!(err, crate::Error::UnsupportedSelector(_)));
    }
}
