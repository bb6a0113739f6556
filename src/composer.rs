//! Input buffer for post and comment forms.

use crate::cache::CacheStore;
use crate::engine::{Intent, Receipt, SyncEngine, SyncError};
use crate::remote::RemoteStore;

/// Text being composed plus whether its intent is in flight.
///
/// The buffer is cleared only once the backend confirms, so a failed submit
/// leaves the text in place for another attempt.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    buffer: String,
    submitting: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.buffer.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Dispatch the intent `build` makes from the trimmed text.
    ///
    /// Blank input is ignored and yields `Ok(None)`.
    pub async fn submit<R, C, F>(
        &mut self,
        engine: &SyncEngine<R, C>,
        build: F,
    ) -> Result<Option<Receipt>, SyncError>
    where
        R: RemoteStore,
        C: CacheStore,
        F: FnOnce(&str) -> Intent,
    {
        if !self.can_submit() {
            return Ok(None);
        }

        let intent = build(self.buffer.trim());
        let receipt = {
            let _flag = Submitting::raise(&mut self.submitting);
            engine.dispatch(intent).await?
        };
        self.buffer.clear();
        Ok(Some(receipt))
    }
}

struct Submitting<'a>(&'a mut bool);

impl<'a> Submitting<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Submitting(flag)
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}
