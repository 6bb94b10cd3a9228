//! Search request parameters and Google URL construction

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{SerpError, SerpResult};

/// Google search URL base
pub const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search";

/// Maximum accepted query length in characters
pub const MAX_QUERY_LENGTH: usize = 400;

/// Largest result count Google honors on a single page
pub const MAX_RESULT_COUNT: u32 = 100;

/// Which of the two URL variants to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchVariant {
    /// Plain search with Google's duplicate suppression active
    Normal,
    /// Same search with `&filter=0` appended, disabling the suppression
    FilterOff,
}

impl SearchVariant {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::FilterOff => "filter=0",
        }
    }
}

/// One SERP comparison request: a query plus the Google locale knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpRequest {
    /// Search query string
    pub query: String,
    /// Interface language code, e.g. "en" or "fr"
    pub hl: String,
    /// Region code, e.g. "US" or "FR"
    pub gl: String,
    /// Number of results to request per page
    pub num: u32,
}

impl SerpRequest {
    /// Request with the default locale (en/US) and 10 results
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            hl: "en".to_string(),
            gl: "US".to_string(),
            num: 10,
        }
    }

    /// Reject malformed parameters before any fetch is attempted
    pub fn validate(&self) -> SerpResult<()> {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return Err(SerpError::InvalidInput(
                "Search query cannot be empty or whitespace-only".to_string(),
            ));
        }
        if trimmed.len() > MAX_QUERY_LENGTH {
            return Err(SerpError::InvalidInput(format!(
                "Search query is too long ({} characters, maximum {MAX_QUERY_LENGTH})",
                trimmed.len()
            )));
        }
        if self.num == 0 {
            return Err(SerpError::InvalidInput(
                "Result count must be at least 1".to_string(),
            ));
        }
        if self.num > MAX_RESULT_COUNT {
            return Err(SerpError::InvalidInput(format!(
                "Result count {} exceeds the maximum of {MAX_RESULT_COUNT}",
                self.num
            )));
        }
        Ok(())
    }

    /// Build the Google search URL for one variant, with proper encoding
    pub fn search_url(&self, variant: SearchVariant) -> SerpResult<Url> {
        let mut url = Url::parse(GOOGLE_SEARCH_URL)
            .map_err(|e| SerpError::InvalidInput(format!("Bad search base URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", self.query.trim())
                .append_pair("hl", &self.hl)
                .append_pair("gl", &self.gl)
                .append_pair("num", &self.num.to_string());
            if variant == SearchVariant::FilterOff {
                pairs.append_pair("filter", "0");
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_url_carries_all_query_knobs() {
        let request = SerpRequest {
            query: "rust async".to_string(),
            hl: "en".to_string(),
            gl: "US".to_string(),
            num: 30,
        };
        let url = request.search_url(SearchVariant::Normal).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google.com/search?q=rust+async&hl=en&gl=US&num=30"
        );
    }

    #[test]
    fn filter_off_url_appends_filter_zero_last() {
        let url = SerpRequest::new("coffee")
            .search_url(SearchVariant::FilterOff)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google.com/search?q=coffee&hl=en&gl=US&num=10&filter=0"
        );
    }

    #[test]
    fn query_is_percent_encoded() {
        let url = SerpRequest::new("crème brûlée & co")
            .search_url(SearchVariant::Normal)
            .unwrap();
        let q = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(q, "crème brûlée & co");
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn empty_query_is_rejected() {
        let err = SerpRequest::new("   ").validate().unwrap_err();
        assert!(matches!(err, SerpError::InvalidInput(_)));
    }

    #[test]
    fn zero_result_count_is_rejected() {
        let mut request = SerpRequest::new("rust");
        request.num = 0;
        assert!(matches!(
            request.validate().unwrap_err(),
            SerpError::InvalidInput(_)
        ));
    }

    #[test]
    fn oversized_result_count_is_rejected() {
        let mut request = SerpRequest::new("rust");
        request.num = 500;
        assert!(matches!(
            request.validate().unwrap_err(),
            SerpError::InvalidInput(_)
        ));
    }

    #[test]
    fn overlong_query_is_rejected() {
        let request = SerpRequest::new("x".repeat(MAX_QUERY_LENGTH + 1));
        assert!(matches!(
            request.validate().unwrap_err(),
            SerpError::InvalidInput(_)
        ));
    }

    #[test]
    fn default_locale_is_en_us() {
        let request = SerpRequest::new("rust");
        assert_eq!(request.hl, "en");
        assert_eq!(request.gl, "US");
        assert_eq!(request.num, 10);
        request.validate().unwrap();
    }
}
