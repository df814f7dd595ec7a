//! Tagged outcome shared by every extraction rule

/// Result of running one extraction rule over one piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleResult<T> {
    /// The construct was recognised
    Found(T),
    /// The text holds no such construct; not an error
    NotFound,
    /// The construct is present but could not be recovered
    Malformed(String),
}

impl<T> RuleResult<T> {
    /// Convert to an `Option`, dropping the malformed reason
    pub fn found(self) -> Option<T> {
        match self {
            RuleResult::Found(value) => Some(value),
            RuleResult::NotFound | RuleResult::Malformed(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RuleResult::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RuleResult<U> {
        match self {
            RuleResult::Found(value) => RuleResult::Found(f(value)),
            RuleResult::NotFound => RuleResult::NotFound,
            RuleResult::Malformed(reason) => RuleResult::Malformed(reason),
        }
    }
}

/// Guard applied before scanning user-supplied text
pub(crate) fn check_scan_size<T>(text: &str) -> Result<(), RuleResult<T>> {
    if text.len() > super::MAX_SCAN_BYTES {
        Err(RuleResult::Malformed(format!(
            "text is {} bytes, above the {} byte scan limit",
            text.len(),
            super::MAX_SCAN_BYTES
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_and_map() {
        let r: RuleResult<u32> = RuleResult::Found(2);
        assert!(r.is_found());
        assert_eq!(r.clone().map(|v| v * 2), RuleResult::Found(4));
        assert_eq!(r.found(), Some(2));

        let r: RuleResult<u32> = RuleResult::Malformed("bad".to_string());
        assert_eq!(r.clone().map(|v| v + 1), RuleResult::Malformed("bad".to_string()));
        assert_eq!(r.found(), None);
        assert_eq!(RuleResult::<u32>::NotFound.found(), None);
    }

    #[test]
    fn test_check_scan_size() {
        assert!(check_scan_size::<()>("short").is_ok());
        let big = "x".repeat(super::super::MAX_SCAN_BYTES + 1);
        assert!(matches!(
            check_scan_size::<()>(&big),
            Err(RuleResult::Malformed(_))
        ));
    }
}
