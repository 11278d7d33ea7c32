//! Upload widget state machine: one tagged [`UiState`] plus the selected file.
//!
//! Every visible fact (status line, error styling, submit button, download
//! panel) is derived from the state, so the widget cannot show a disabled
//! submit button outside of `Submitting` or a download link outside of
//! `Success`.

use tracing::{debug, info, warn};

use crate::{
    error::UploadError,
    model::{ResultMetadata, SelectedFile, UiState},
};

pub const MSG_SELECT_FIRST: &str = "Select a PDF first.";
pub const MSG_ONLY_PDF: &str = "Only PDF files are accepted.";
pub const MSG_SUBMITTING: &str = "Running OMR and chord analysis...";
pub const MSG_SUCCESS: &str = "Success. Chord part added above the staff.";

/// The single status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Default)]
pub struct UploadWidget {
    state: UiState,
    selected: Option<SelectedFile>,
}

impl UploadWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    /// Whether the drop zone should carry the "dragging" marker.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, UiState::DraggingOver(_))
    }

    pub fn drag_enter(&mut self) {
        if self.is_dragging() {
            return;
        }
        let previous = std::mem::take(&mut self.state);
        self.state = UiState::DraggingOver(Box::new(previous));
    }

    pub fn drag_leave(&mut self) {
        if !self.is_dragging() {
            return;
        }
        if let UiState::DraggingOver(previous) = std::mem::take(&mut self.state) {
            self.state = *previous;
        }
    }

    /// Ends the drag and adopts the first dropped file, if any.
    pub fn drop_files<I>(&mut self, files: I)
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        self.drag_leave();
        match files.into_iter().next() {
            Some(first) => self.adopt(first),
            None => debug!("drop carried no files"),
        }
    }

    /// A file chosen through the native picker.
    pub fn pick(&mut self, file: SelectedFile) {
        self.adopt(file);
    }

    fn adopt(&mut self, file: SelectedFile) {
        info!(name = %file.name, "file selected");
        let name = file.name.clone();
        self.selected = Some(file);
        let settled = self.state.settled_mut();
        // a running submission keeps ownership of the state until it settles
        if *settled != UiState::Submitting {
            *settled = UiState::Ready(name);
        }
    }

    /// Validates the selection and enters `Submitting`.
    ///
    /// Returns the file to upload, or `None` when validation failed (the
    /// widget is then in `Error`) or a submission is already running.
    pub fn begin_submit(&mut self) -> Option<SelectedFile> {
        if !self.submit_enabled() {
            warn!("submit requested while a submission is running");
            return None;
        }
        match validate(self.selected.as_ref()) {
            Ok(file) => {
                let file = file.clone();
                info!(name = %file.name, "submission started");
                *self.state.settled_mut() = UiState::Submitting;
                Some(file)
            }
            Err(err) => {
                info!(%err, "submission rejected");
                *self.state.settled_mut() = UiState::Error(err.to_string());
                None
            }
        }
    }

    /// Leaves `Submitting` with the outcome of the attempt.
    pub fn settle(&mut self, outcome: Result<ResultMetadata, UploadError>) {
        let settled = self.state.settled_mut();
        if *settled != UiState::Submitting {
            warn!("settle called with no submission running");
        }
        *settled = match outcome {
            Ok(meta) => {
                info!(download_url = %meta.download_url, "submission succeeded");
                UiState::Success(meta)
            }
            Err(err) => {
                warn!(%err, "submission failed");
                UiState::Error(err.to_string())
            }
        };
    }

    pub fn submit_enabled(&self) -> bool {
        *self.state.settled() != UiState::Submitting
    }

    /// Result shown in the download panel; `None` hides the panel.
    pub fn download(&self) -> Option<&ResultMetadata> {
        match self.state.settled() {
            UiState::Success(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn status(&self) -> Status {
        let (text, is_error) = match self.state.settled() {
            UiState::Idle | UiState::DraggingOver(_) => (String::new(), false),
            UiState::Ready(name) => (format!("Selected: {}", name), false),
            UiState::Submitting => (MSG_SUBMITTING.to_string(), false),
            UiState::Success(_) => (MSG_SUCCESS.to_string(), false),
            UiState::Error(message) => (message.clone(), true),
        };
        Status { text, is_error }
    }
}

/// Precondition checks, in order, before any request is made.
pub fn validate(selected: Option<&SelectedFile>) -> Result<&SelectedFile, UploadError> {
    let file = selected.ok_or(UploadError::Validation(MSG_SELECT_FIRST))?;
    if !file.has_pdf_name() {
        return Err(UploadError::Validation(MSG_ONLY_PDF));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pdf(name: &str) -> SelectedFile {
        SelectedFile::in_memory(name, b"%PDF".to_vec())
    }

    fn meta() -> ResultMetadata {
        serde_json::from_value(json!({"downloadUrl": "/download/t", "measures": 4})).unwrap()
    }

    #[test]
    fn starts_idle_and_enabled() {
        let w = UploadWidget::new();
        assert_eq!(w.state(), &UiState::Idle);
        assert!(w.submit_enabled());
        assert!(w.download().is_none());
        assert!(!w.status().is_error);
    }

    #[test]
    fn drag_enter_and_leave_restore_previous_state() {
        let mut w = UploadWidget::new();
        w.pick(pdf("a.pdf"));
        w.drag_enter();
        w.drag_enter();
        assert!(w.is_dragging());
        assert_eq!(w.state().settled(), &UiState::Ready("a.pdf".into()));
        w.drag_leave();
        assert!(!w.is_dragging());
        assert_eq!(w.state(), &UiState::Ready("a.pdf".into()));
    }

    #[test]
    fn empty_drop_leaves_state_unchanged() {
        let mut w = UploadWidget::new();
        w.begin_submit();
        let before = w.state().clone();
        w.drag_enter();
        w.drop_files(Vec::new());
        assert_eq!(w.state(), &before);
        assert!(w.selected().is_none());
    }

    #[test]
    fn drop_adopts_first_file() {
        let mut w = UploadWidget::new();
        w.drag_enter();
        w.drop_files(vec![pdf("first.pdf"), pdf("second.pdf")]);
        assert!(!w.is_dragging());
        assert_eq!(w.selected().map(|f| f.name.as_str()), Some("first.pdf"));
        assert_eq!(w.state(), &UiState::Ready("first.pdf".into()));
        assert!(w.status().text.contains("first.pdf"));
    }

    #[test]
    fn submit_without_file_is_rejected() {
        let mut w = UploadWidget::new();
        assert!(w.begin_submit().is_none());
        assert_eq!(
            w.status(),
            Status {
                text: MSG_SELECT_FIRST.into(),
                is_error: true
            }
        );
        assert!(w.submit_enabled());
    }

    #[test]
    fn submit_with_wrong_extension_is_rejected() {
        let mut w = UploadWidget::new();
        w.pick(pdf("notes.txt"));
        assert!(w.begin_submit().is_none());
        assert_eq!(w.status().text, MSG_ONLY_PDF);
        assert!(w.status().is_error);
    }

    #[test]
    fn submit_disables_until_settled() {
        let mut w = UploadWidget::new();
        w.pick(pdf("score.PDF"));
        let file = w.begin_submit().expect("upper-case extension passes");
        assert_eq!(file.name, "score.PDF");
        assert!(!w.submit_enabled());
        assert_eq!(w.status().text, MSG_SUBMITTING);
        assert!(w.begin_submit().is_none());

        w.settle(Ok(meta()));
        assert!(w.submit_enabled());
        assert_eq!(w.status().text, MSG_SUCCESS);
        assert_eq!(w.download().map(|m| m.download_url.as_str()), Some("/download/t"));
    }

    #[test]
    fn new_submission_hides_previous_result() {
        let mut w = UploadWidget::new();
        w.pick(pdf("a.pdf"));
        w.begin_submit();
        w.settle(Ok(meta()));
        assert!(w.download().is_some());
        w.begin_submit();
        assert!(w.download().is_none());
    }

    #[test]
    fn failure_settles_into_error() {
        let mut w = UploadWidget::new();
        w.pick(pdf("a.pdf"));
        w.begin_submit();
        w.settle(Err(UploadError::Server("bad scan".into())));
        assert_eq!(
            w.status(),
            Status {
                text: "bad scan".into(),
                is_error: true
            }
        );
        assert!(w.download().is_none());
        assert!(w.submit_enabled());
    }

    #[test]
    fn drop_during_submission_keeps_submitting() {
        let mut w = UploadWidget::new();
        w.pick(pdf("a.pdf"));
        w.begin_submit();
        w.drag_enter();
        assert!(!w.submit_enabled());
        w.drop_files(vec![pdf("b.pdf")]);
        assert_eq!(w.state(), &UiState::Submitting);
        assert_eq!(w.selected().map(|f| f.name.as_str()), Some("b.pdf"));
    }

    #[test]
    fn settle_during_drag_updates_underlying_state() {
        let mut w = UploadWidget::new();
        w.pick(pdf("a.pdf"));
        w.begin_submit();
        w.drag_enter();
        w.settle(Ok(meta()));
        assert!(w.is_dragging());
        assert!(w.submit_enabled());
        w.drag_leave();
        assert!(matches!(w.state(), UiState::Success(_)));
    }
}
