use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

pub(crate) const ACTIVE_CLASS: &str = "active";

/// One nesting level of the page's tab hierarchy. Each level owns a trigger
/// marker class and a content marker class; hide-all semantics operate on
/// every panel bearing the content class, matching the page's behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TabLevel {
    Primary,
    Secondary,
    Tertiary,
}

impl TabLevel {
    pub(crate) fn trigger_class(self) -> &'static str {
        match self {
            Self::Primary => "tab-link",
            Self::Secondary => "sub-tab-link",
            Self::Tertiary => "sub-sub-tab-link",
        }
    }

    pub(crate) fn content_class(self) -> &'static str {
        match self {
            Self::Primary => "tab-content",
            Self::Secondary => "sub-tab-content",
            Self::Tertiary => "sub-sub-tab-content",
        }
    }

    /// Alias triggers activate a different group member than themselves.
    /// The observed remap table is preserved verbatim; its original intent
    /// is unclear, so no behavior is inferred beyond it.
    fn aliases(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Primary => &[("next-1-2", "#content-2"), ("next-3-1", "#content-3")],
            Self::Secondary => &[("next-2-2", "#content-2-2")],
            Self::Tertiary => &[],
        }
    }

    /// Landing on one of these targets resets the child group to the paired
    /// entry.
    pub(crate) fn cascade_resets(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Primary => &[
                ("#content-1", "#content-1-1"),
                ("#content-2", "#content-2-1"),
                ("#content-3", "#content-3-1"),
            ],
            Self::Secondary => &[("#content-1-2", "#content-1-2-1")],
            Self::Tertiary => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TabEntry {
    pub(crate) trigger: NodeId,
    pub(crate) target: String,
    pub(crate) panel: NodeId,
}

/// An ordered tab group captured once at mount time. Selection state is an
/// explicit index pair; the only way to change it is `reconcile`, which
/// rewrites the active marker and panel visibility for the whole group, so
/// at most one trigger is active and one panel visible afterwards.
#[derive(Debug, Clone)]
pub(crate) struct TabGroup {
    level: TabLevel,
    entries: Vec<TabEntry>,
    panels: Vec<NodeId>,
    active: Option<usize>,
}

impl TabGroup {
    pub(crate) fn capture(dom: &Dom, level: TabLevel) -> Result<Self> {
        let trigger_selector = format!(".{}", level.trigger_class());
        let triggers = dom.query_selector_all(&trigger_selector)?;
        if triggers.is_empty() {
            return Err(Error::Binding(format!(
                "no {} triggers in document",
                level.trigger_class()
            )));
        }

        let mut entries = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            let target = dom.attr(trigger, "href").ok_or_else(|| {
                Error::Binding(format!(
                    "{} trigger is missing an href target",
                    level.trigger_class()
                ))
            })?;
            let panel_id = target.strip_prefix('#').ok_or_else(|| {
                Error::Binding(format!(
                    "{} trigger target {target:?} is not an anchor",
                    level.trigger_class()
                ))
            })?;
            let panel = dom
                .by_id(panel_id)
                .ok_or_else(|| Error::Binding(format!("missing panel element #{panel_id}")))?;
            entries.push(TabEntry {
                trigger,
                target,
                panel,
            });
        }

        let panels = dom.query_selector_all(&format!(".{}", level.content_class()))?;

        let mut active = None;
        for (index, entry) in entries.iter().enumerate() {
            if dom.class_contains(entry.trigger, ACTIVE_CLASS)? {
                active = Some(index);
                break;
            }
        }

        Ok(Self {
            level,
            entries,
            panels,
            active,
        })
    }

    pub(crate) fn level(&self) -> TabLevel {
        self.level
    }

    pub(crate) fn entries(&self) -> &[TabEntry] {
        &self.entries
    }

    pub(crate) fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub(crate) fn entry_index_of(&self, node: NodeId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.trigger == node)
    }

    fn index_of_target(&self, target: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.target == target)
    }

    /// Applies a click on the entry at `clicked`. The activated trigger is
    /// the remap target when the clicked trigger carries an alias class,
    /// the clicked trigger otherwise; the shown panel is always the clicked
    /// trigger's own target. Returns the shown target for cascade handling.
    pub(crate) fn activate_from_click(&mut self, dom: &mut Dom, clicked: usize) -> Result<String> {
        let entry = self
            .entries
            .get(clicked)
            .ok_or_else(|| Error::HandlerFault("tab trigger index out of range".into()))?;
        let trigger = entry.trigger;
        let visible_target = entry.target.clone();

        let mut active_index = clicked;
        for (alias_class, designated_target) in self.level.aliases() {
            if dom.class_contains(trigger, alias_class)? {
                active_index = self.index_of_target(designated_target).ok_or_else(|| {
                    Error::HandlerFault(format!(
                        "alias {alias_class} names unknown target {designated_target}"
                    ))
                })?;
                break;
            }
        }

        self.reconcile(dom, active_index, &visible_target)?;
        Ok(visible_target)
    }

    /// Moves the group to the entry for `target`, deactivating everything
    /// else. Used by parent-level cascades; does not depend on any entry
    /// being active beforehand.
    pub(crate) fn reset_to_target(&mut self, dom: &mut Dom, target: &str) -> Result<()> {
        let index = self.index_of_target(target).ok_or_else(|| {
            Error::HandlerFault(format!(
                "no {} trigger targets {target}",
                self.level.trigger_class()
            ))
        })?;
        self.reconcile(dom, index, target)
    }

    fn reconcile(&mut self, dom: &mut Dom, active_index: usize, visible_target: &str) -> Result<()> {
        for entry in &self.entries {
            dom.class_remove(entry.trigger, ACTIVE_CLASS)?;
        }
        for panel in &self.panels {
            dom.style_set(*panel, "display", "none")?;
        }

        let active = self
            .entries
            .get(active_index)
            .ok_or_else(|| Error::HandlerFault("tab trigger index out of range".into()))?;
        dom.class_add(active.trigger, ACTIVE_CLASS)?;

        let shown = self
            .entries
            .iter()
            .find(|entry| entry.target == visible_target)
            .ok_or_else(|| {
                Error::HandlerFault(format!("no panel registered for target {visible_target}"))
            })?;
        dom.style_set(shown.panel, "display", "block")?;

        self.active = Some(active_index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    const GROUP_HTML: &str = "\
        <a id='t1' class='tab-link active' href='#content-1'>one</a>\
        <a id='t2' class='tab-link' href='#content-2'>two</a>\
        <a id='t3' class='tab-link' href='#content-3'>three</a>\
        <a id='tn' class='tab-link next-1-2' href='#content-2'>next</a>\
        <div id='content-1' class='tab-content' style='display: block'></div>\
        <div id='content-2' class='tab-content' style='display: none'></div>\
        <div id='content-3' class='tab-content' style='display: none'></div>";

    #[test]
    fn capture_records_entries_in_document_order() -> crate::Result<()> {
        let dom = parse_html(GROUP_HTML)?;
        let group = TabGroup::capture(&dom, TabLevel::Primary)?;
        assert_eq!(group.entries().len(), 4);
        assert_eq!(group.active_index(), Some(0));
        assert_eq!(group.entries()[3].target, "#content-2");
        Ok(())
    }

    #[test]
    fn plain_click_activates_the_clicked_trigger() -> crate::Result<()> {
        let mut dom = parse_html(GROUP_HTML)?;
        let mut group = TabGroup::capture(&dom, TabLevel::Primary)?;

        let shown = group.activate_from_click(&mut dom, 2)?;
        assert_eq!(shown, "#content-3");
        assert_eq!(group.active_index(), Some(2));

        let t3 = dom.by_id("t3").unwrap();
        let t1 = dom.by_id("t1").unwrap();
        assert!(dom.class_contains(t3, ACTIVE_CLASS)?);
        assert!(!dom.class_contains(t1, ACTIVE_CLASS)?);
        assert_eq!(dom.style_get(dom.by_id("content-3").unwrap(), "display")?, "block");
        assert_eq!(dom.style_get(dom.by_id("content-1").unwrap(), "display")?, "none");
        Ok(())
    }

    #[test]
    fn alias_click_activates_the_designated_trigger() -> crate::Result<()> {
        let mut dom = parse_html(GROUP_HTML)?;
        let mut group = TabGroup::capture(&dom, TabLevel::Primary)?;

        let shown = group.activate_from_click(&mut dom, 3)?;
        assert_eq!(shown, "#content-2");
        // The remap points at the first trigger whose target is #content-2,
        // not the alias trigger itself.
        assert_eq!(group.active_index(), Some(1));
        assert!(dom.class_contains(dom.by_id("t2").unwrap(), ACTIVE_CLASS)?);
        assert!(!dom.class_contains(dom.by_id("tn").unwrap(), ACTIVE_CLASS)?);
        Ok(())
    }

    #[test]
    fn reset_works_without_a_previously_active_entry() -> crate::Result<()> {
        let html = GROUP_HTML.replace(" active", "");
        let mut dom = parse_html(&html)?;
        let mut group = TabGroup::capture(&dom, TabLevel::Primary)?;
        assert_eq!(group.active_index(), None);

        group.reset_to_target(&mut dom, "#content-1")?;
        assert_eq!(group.active_index(), Some(0));
        assert!(dom.class_contains(dom.by_id("t1").unwrap(), ACTIVE_CLASS)?);
        Ok(())
    }

    #[test]
    fn capture_fails_on_a_dangling_target() {
        let err = parse_html("<a class='tab-link' href='#nowhere'>x</a>")
            .and_then(|dom| TabGroup::capture(&dom, TabLevel::Primary))
            .unwrap_err();
        assert!(matches!(err, Error::Binding(_)));
    }
}
