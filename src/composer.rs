//! The message composer: draft text, pending attachments and mode toggles.

use std::path::{Path, PathBuf};


use crate::error::{Error, Result};
use crate::observability::{ATTACHMENT_READ_ERRORS, ATTACHMENT_READS};
use crate::types::{Attachment, CompletionOptions};

/// Prompts offered when a conversation is empty.
pub const SUGGESTED_PROMPTS: [&str; 4] = [
    "Analyze this market report",
    "Write a Python script for data scraping",
    "Summarize recent AI news",
    "Design a logo for my startup",
];

/// Everything needed to send one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    /// Trimmed draft text; may be empty when attachments are present.
    pub text: String,
    /// Attachments in the order they finished reading.
    pub attachments: Vec<Attachment>,
    pub reasoning_enabled: bool,
    pub search_enabled: bool,
}

impl SendRequest {
    /// Completion options for this request.
    pub fn options(&self, thinking_budget: u32) -> CompletionOptions {
        CompletionOptions::new(self.reasoning_enabled, self.search_enabled)
            .with_thinking_budget(thinking_budget)
    }
}

/// Collects a user turn before it is sent.
///
/// Modes persist across sends; the draft and attachments are cleared by a
/// successful [`Composer::send`].
#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
    attachments: Vec<Attachment>,
    reasoning_enabled: bool,
    search_enabled: bool,
}

impl Composer {
    /// Create an empty composer with both modes off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty composer with the given modes.
    pub fn with_modes(reasoning_enabled: bool, search_enabled: bool) -> Self {
        Self {
            reasoning_enabled,
            search_enabled,
            ..Self::default()
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Fill the draft with the `index`-th suggested prompt.
    pub fn use_suggestion(&mut self, index: usize) -> Option<&'static str> {
        let prompt = SUGGESTED_PROMPTS.get(index).copied()?;
        self.draft = prompt.to_string();
        Some(prompt)
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Add an already-read attachment.
    pub fn push_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Read a file and add it once the read completes.
    ///
    /// On failure nothing is added and the composer is unchanged.
    pub async fn attach<P: AsRef<Path>>(&mut self, path: P) -> Result<&Attachment> {
        let attachment = read_attachment(path.as_ref().to_path_buf()).await?;
        self.attachments.push(attachment);
        let index = self.attachments.len() - 1;
        Ok(&self.attachments[index])
    }

    /// Read several files concurrently. Successful reads are added in the order
    /// the paths were given; failures are returned paired with their paths.
    pub async fn attach_all<I, P>(&mut self, paths: I) -> Vec<(PathBuf, Error)>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let reads = paths.into_iter().map(|path| {
            let path = path.as_ref().to_path_buf();
            async move {
                let result = read_attachment(path.clone()).await;
                (path, result)
            }
        });
        let mut failures = Vec::new();
        for (path, result) in futures::future::join_all(reads).await {
            match result {
                Ok(attachment) => self.attachments.push(attachment),
                Err(err) => failures.push((path, err)),
            }
        }
        failures
    }

    /// Drop a pending attachment. Unknown ids are ignored.
    pub fn remove_attachment(&mut self, id: &str) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| a.id != id);
        self.attachments.len() != before
    }

    pub fn reasoning_enabled(&self) -> bool {
        self.reasoning_enabled
    }

    pub fn search_enabled(&self) -> bool {
        self.search_enabled
    }

    pub fn set_reasoning(&mut self, enabled: bool) {
        self.reasoning_enabled = enabled;
    }

    pub fn set_search(&mut self, enabled: bool) {
        self.search_enabled = enabled;
    }

    /// Flip reasoning mode and return the new state.
    pub fn toggle_reasoning(&mut self) -> bool {
        self.reasoning_enabled = !self.reasoning_enabled;
        self.reasoning_enabled
    }

    /// Flip search mode and return the new state.
    pub fn toggle_search(&mut self) -> bool {
        self.search_enabled = !self.search_enabled;
        self.search_enabled
    }

    /// Returns true if [`Composer::send`] would produce a request.
    pub fn can_send(&self) -> bool {
        !self.draft.trim().is_empty() || !self.attachments.is_empty()
    }

    /// Take the draft and attachments as a request, clearing both.
    ///
    /// Returns `None` and leaves the composer untouched when there is neither
    /// text nor an attachment to send.
    pub fn send(&mut self) -> Option<SendRequest> {
        if !self.can_send() {
            return None;
        }
        Some(SendRequest {
            text: std::mem::take(&mut self.draft),
            attachments: std::mem::take(&mut self.attachments),
            reasoning_enabled: self.reasoning_enabled,
            search_enabled: self.search_enabled,
        })
    }
}

async fn read_attachment(path: PathBuf) -> Result<Attachment> {
    match Attachment::from_path(&path).await {
        Ok(attachment) => {
            ATTACHMENT_READS.click();
            tracing::debug!(path = %path.display(), kind = ?attachment.kind, "attachment read");
            Ok(attachment)
        }
        Err(err) => {
            ATTACHMENT_READ_ERRORS.click();
            tracing::warn!(path = %path.display(), error = %err, "attachment read failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttachmentKind;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("sesame-composer-{}", Uuid::new_v4()))
    }

    fn attachment(name: &str) -> Attachment {
        Attachment::new(
            AttachmentKind::Image,
            format!("file:///tmp/{name}"),
            Some("AAAA".to_string()),
            name,
            Some("image/png".to_string()),
        )
    }

    #[test]
    fn whitespace_only_draft_is_not_sent() {
        let mut composer = Composer::new();
        composer.set_draft("   \n\t ");
        assert!(composer.send().is_none());
        assert_eq!(composer.draft(), "   \n\t ");
    }

    #[test]
    fn send_takes_draft_and_clears() {
        let mut composer = Composer::with_modes(true, false);
        composer.set_draft("  hello  ");
        composer.push_attachment(attachment("a.png"));
        let request = composer.send().unwrap();
        assert_eq!(request.text, "  hello  ");
        assert_eq!(request.attachments.len(), 1);
        assert!(request.reasoning_enabled);
        assert!(!request.search_enabled);
        assert_eq!(composer.draft(), "");
        assert!(composer.attachments().is_empty());
    }

    #[test]
    fn send_keeps_code_indentation() {
        let mut composer = Composer::new();
        composer.set_draft("    let x = 1;\n    let y = 2;\n");
        let request = composer.send().unwrap();
        assert_eq!(request.text, "    let x = 1;\n    let y = 2;\n");
    }

    #[test]
    fn attachment_only_send() {
        let mut composer = Composer::new();
        composer.push_attachment(attachment("a.png"));
        let request = composer.send().unwrap();
        assert_eq!(request.text, "");
        assert_eq!(request.attachments.len(), 1);
    }

    #[test]
    fn modes_persist_across_sends() {
        let mut composer = Composer::new();
        assert!(composer.toggle_search());
        composer.set_draft("one");
        assert!(composer.send().unwrap().search_enabled);
        composer.set_draft("two");
        assert!(composer.send().unwrap().search_enabled);
        assert!(!composer.toggle_search());
    }

    #[test]
    fn remove_attachment_by_id() {
        let mut composer = Composer::new();
        let first = attachment("a.png");
        let id = first.id.clone();
        composer.push_attachment(first);
        composer.push_attachment(attachment("b.png"));
        assert!(composer.remove_attachment(&id));
        assert!(!composer.remove_attachment(&id));
        assert_eq!(composer.attachments().len(), 1);
        assert_eq!(composer.attachments()[0].name, "b.png");
    }

    #[test]
    fn suggestions_fill_draft() {
        let mut composer = Composer::new();
        assert_eq!(composer.use_suggestion(2), Some("Summarize recent AI news"));
        assert_eq!(composer.draft(), "Summarize recent AI news");
        assert_eq!(composer.use_suggestion(9), None);
        assert_eq!(composer.draft(), "Summarize recent AI news");
    }

    #[test]
    fn options_follow_modes_and_budget() {
        let request = SendRequest {
            text: "x".to_string(),
            attachments: Vec::new(),
            reasoning_enabled: true,
            search_enabled: true,
        };
        let options = request.options(2048);
        assert!(options.reasoning_enabled);
        assert!(options.search_enabled);
        assert_eq!(options.thinking_budget, 2048);
    }

    #[tokio::test]
    async fn attach_reads_file() {
        let dir = scratch_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("photo.jpg");
        tokio::fs::write(&path, b"jpeg").await.unwrap();

        let mut composer = Composer::new();
        let attached = composer.attach(&path).await.unwrap();
        assert_eq!(attached.kind, AttachmentKind::Image);
        assert_eq!(attached.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(composer.attachments().len(), 1);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn failed_attach_leaves_composer_unchanged() {
        let mut composer = Composer::new();
        composer.set_draft("keep me");
        let err = composer
            .attach(scratch_dir().join("missing.png"))
            .await
            .unwrap_err();
        assert!(err.is_io());
        assert!(composer.attachments().is_empty());
        assert_eq!(composer.draft(), "keep me");
    }

    #[tokio::test]
    async fn attach_all_adds_readable_files_in_order() {
        let dir = scratch_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let names = ["a.png", "b.gif", "c.pdf"];
        for name in names {
            tokio::fs::write(dir.join(name), name.as_bytes()).await.unwrap();
        }
        let mut paths: Vec<PathBuf> = names.iter().map(|n| dir.join(n)).collect();
        paths.push(dir.join("absent.png"));

        let mut composer = Composer::new();
        let failures = composer.attach_all(&paths).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, dir.join("absent.png"));

        let attached: Vec<&str> = composer
            .attachments()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(attached, names);
        let pdf = composer.attachments().iter().find(|a| a.name == "c.pdf").unwrap();
        assert_eq!(pdf.kind, AttachmentKind::File);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
