//! Denial reason collection

use serde::Serialize;

/// Receives the path of every failed permission lookup
pub trait ReasonSink {
    fn report(&mut self, reason: &str);
}

impl<F: FnMut(&str)> ReasonSink for F {
    fn report(&mut self, reason: &str) {
        self(reason)
    }
}

/// Insertion-ordered set of denial reasons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DenialReasons {
    reasons: Vec<String>,
}

impl DenialReasons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn contains(&self, reason: &str) -> bool {
        self.reasons.iter().any(|r| r == reason)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.reasons.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.reasons
    }
}

impl ReasonSink for DenialReasons {
    fn report(&mut self, reason: &str) {
        if !self.contains(reason) {
            self.reasons.push(reason.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_order() {
        let mut reasons = DenialReasons::new();
        reasons.report("cion.config.edit");
        reasons.report("cion.user.create");
        reasons.report("cion.config.edit");

        assert_eq!(reasons.into_vec(), vec!["cion.config.edit", "cion.user.create"]);
    }

    #[test]
    fn test_closure_sink() {
        let mut last = String::new();
        let mut sink = |reason: &str| last = reason.to_string();
        sink.report("a.b");
        sink.report("c.d");
        assert_eq!(last, "c.d");
    }

    #[test]
    fn test_serializes_as_list() {
        let mut reasons = DenialReasons::new();
        reasons.report("cion.user.delete");
        assert_eq!(
            serde_json::to_string(&reasons).unwrap(),
            r#"["cion.user.delete"]"#
        );
    }
}
