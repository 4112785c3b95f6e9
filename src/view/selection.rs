//! Selection view over the most recently rendered query result.

use std::collections::HashSet;

use crate::survey::{ProcessingStatus, RecordId, SurveyRecord};

/// Which rows of the result are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Unprocessed,
    Active,
    Completed,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Unprocessed,
        StatusFilter::Active,
        StatusFilter::Completed,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            StatusFilter::All => "All jobs",
            StatusFilter::Unprocessed => "Unprocessed jobs",
            StatusFilter::Active => "Active jobs",
            StatusFilter::Completed => "Completed jobs",
        }
    }

    pub fn admits(&self, status: ProcessingStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Unprocessed => status == ProcessingStatus::Unprocessed,
            StatusFilter::Active => status == ProcessingStatus::Active,
            StatusFilter::Completed => status == ProcessingStatus::Completed,
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Identifiers the user has checked, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet(Vec<RecordId>);

impl SelectionSet {
    pub fn ids(&self) -> &[RecordId] {
        &self.0
    }

    pub fn into_ids(self) -> Vec<RecordId> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.0.contains(id)
    }
}

/// Rows of the last query plus the user's checks and cursor.
///
/// The selection only ever holds identifiers of rendered records; it is
/// reset by every [`render`](SelectionView::render).
#[derive(Debug, Default)]
pub struct SelectionView {
    records: Vec<SurveyRecord>,
    selected: HashSet<RecordId>,
    filter: StatusFilter,
    /// Index into the visible rows.
    cursor: usize,
}

impl SelectionView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rows and clears the selection.
    pub fn render(&mut self, records: Vec<SurveyRecord>) {
        self.records = records;
        self.selected.clear();
        self.cursor = 0;
    }

    /// Currently checked identifiers; empty when nothing is checked.
    ///
    /// Each identifier appears once, at the position of its first row.
    pub fn get_selection(&self) -> SelectionSet {
        let mut seen = HashSet::new();
        SelectionSet(
            self.records
                .iter()
                .filter(|r| self.selected.contains(&r.id) && seen.insert(&r.id))
                .map(|r| r.id.clone())
                .collect(),
        )
    }

    pub fn records(&self) -> &[SurveyRecord] {
        &self.records
    }

    pub fn record(&self, id: &RecordId) -> Option<&SurveyRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Checks `id`; returns false when no rendered record has that id.
    pub fn select(&mut self, id: &RecordId) -> bool {
        if self.record(id).is_none() {
            return false;
        }
        self.selected.insert(id.clone());
        true
    }

    pub fn deselect(&mut self, id: &RecordId) {
        self.selected.remove(id);
    }

    /// Flips the check on `id`; returns the new state, `None` for unknown ids.
    pub fn toggle(&mut self, id: &RecordId) -> Option<bool> {
        self.record(id)?;
        if self.selected.remove(id) {
            Some(false)
        } else {
            self.selected.insert(id.clone());
            Some(true)
        }
    }

    /// Toggles the row under the cursor.
    pub fn toggle_current(&mut self) -> Option<(RecordId, bool)> {
        let id = self.current()?.id.clone();
        let state = self.toggle(&id)?;
        Some((id, state))
    }

    /// Checks every rendered record that still needs processing.
    ///
    /// Returns how many rendered records were left out because they were
    /// already submitted.
    pub fn select_pending(&mut self) -> usize {
        let mut skipped = 0;
        for record in &self.records {
            if record.needs_processing() {
                self.selected.insert(record.id.clone());
            } else {
                skipped += 1;
            }
        }
        skipped
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    /// Changes which rows are visible; the selection is untouched.
    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.cursor = 0;
    }

    pub fn cycle_filter(&mut self) {
        self.set_filter(self.filter.next());
    }

    pub fn visible(&self) -> Vec<&SurveyRecord> {
        self.records
            .iter()
            .filter(|r| self.filter.admits(r.status))
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&SurveyRecord> {
        self.visible().get(self.cursor).copied()
    }

    pub fn next(&mut self) {
        let len = self.visible().len();
        if len > 0 && self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    pub fn previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn first(&mut self) {
        self.cursor = 0;
    }

    pub fn last(&mut self) {
        self.cursor = self.visible().len().saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<SurveyRecord> {
        vec![
            SurveyRecord::new("A", 58000.0, 10.0, 10.0),
            SurveyRecord::new("B", 58001.0, 20.0, 20.0).with_status(ProcessingStatus::Active),
            SurveyRecord::new("C", 58002.0, 30.0, 30.0),
            SurveyRecord::new("D", 58003.0, 40.0, 40.0).with_status(ProcessingStatus::Completed),
        ]
    }

    fn ids(selection: &SelectionSet) -> Vec<&str> {
        selection.ids().iter().map(RecordId::as_str).collect()
    }

    #[test]
    fn test_render_clears_selection() {
        let mut view = SelectionView::new();
        view.render(records());
        view.select(&"A".into());
        view.next();

        view.render(records());
        assert!(view.get_selection().is_empty());
        assert_eq!(view.records().len(), 4);
        assert_eq!(view.cursor(), 0);
    }

    #[test]
    fn test_selection_is_in_display_order() {
        let mut view = SelectionView::new();
        view.render(records());
        view.select(&"C".into());
        view.select(&"A".into());
        assert_eq!(ids(&view.get_selection()), vec!["A", "C"]);
    }

    #[test]
    fn test_unknown_ids_never_enter_selection() {
        let mut view = SelectionView::new();
        view.render(records());
        assert!(!view.select(&"Z".into()));
        assert_eq!(view.toggle(&"Z".into()), None);
        assert!(view.get_selection().is_empty());
    }

    #[test]
    fn test_selection_drops_records_from_previous_render() {
        let mut view = SelectionView::new();
        view.render(records());
        view.select(&"A".into());
        view.render(vec![SurveyRecord::new("E", 58010.0, 0.0, 0.0)]);
        assert!(!view.select(&"A".into()));
        assert!(view.select(&"E".into()));
        assert_eq!(ids(&view.get_selection()), vec!["E"]);
    }

    #[test]
    fn test_duplicate_rows_select_once() {
        let mut view = SelectionView::new();
        view.render(vec![
            SurveyRecord::new("A", 1.0, 0.0, 0.0),
            SurveyRecord::new("A", 2.0, 0.0, 0.0),
        ]);
        view.toggle_current();
        assert_eq!(ids(&view.get_selection()), vec!["A"]);
        assert_eq!(view.get_selection().len(), view.selected_count());
    }

    #[test]
    fn test_toggle() {
        let mut view = SelectionView::new();
        view.render(records());
        assert_eq!(view.toggle(&"B".into()), Some(true));
        assert_eq!(view.toggle(&"B".into()), Some(false));
        assert!(view.get_selection().is_empty());
    }

    #[test]
    fn test_select_pending_skips_submitted() {
        let mut view = SelectionView::new();
        view.render(records());
        let skipped = view.select_pending();
        assert_eq!(skipped, 2);
        assert_eq!(ids(&view.get_selection()), vec!["A", "C"]);
    }

    #[test]
    fn test_filter_hides_rows_but_keeps_selection() {
        let mut view = SelectionView::new();
        view.render(records());
        view.select(&"B".into());

        view.set_filter(StatusFilter::Unprocessed);
        let visible: Vec<&str> = view.visible().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(visible, vec!["A", "C"]);
        assert_eq!(ids(&view.get_selection()), vec!["B"]);

        let (id, state) = view.toggle_current().expect("cursor row");
        assert_eq!(id.as_str(), "A");
        assert!(state);
        assert_eq!(ids(&view.get_selection()), vec!["A", "B"]);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut view = SelectionView::new();
        view.previous();
        view.next();
        assert!(view.current().is_none());

        view.render(records());
        view.last();
        assert_eq!(view.current().map(|r| r.id.as_str()), Some("D"));
        view.next();
        assert_eq!(view.current().map(|r| r.id.as_str()), Some("D"));
        view.first();
        view.previous();
        assert_eq!(view.current().map(|r| r.id.as_str()), Some("A"));
    }

    #[test]
    fn test_filter_cycles() {
        assert_eq!(StatusFilter::All.next(), StatusFilter::Unprocessed);
        assert_eq!(StatusFilter::Completed.next(), StatusFilter::All);
    }
}
