use crate::selection::Summary;

type SummaryCallback = Box<dyn Fn(&Summary) + Send>;

/// Keyed summary subscribers, notified in subscription order.
#[derive(Default)]
pub struct SummaryListeners {
    entries: Vec<(String, SummaryCallback)>,
}

impl SummaryListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `key`. Returns false if the key is taken,
    /// in which case the existing callback stays.
    pub fn subscribe(
        &mut self,
        key: impl Into<String>,
        callback: impl Fn(&Summary) + Send + 'static,
    ) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }
        self.entries.push((key, Box::new(callback)));
        true
    }

    pub fn unsubscribe(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| existing != key);
        self.entries.len() != before
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn notify(&self, summary: &Summary) {
        for (_, callback) in &self.entries {
            callback(summary);
        }
    }
}

impl std::fmt::Debug for SummaryListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(key, _)| key))
            .finish()
    }
}
