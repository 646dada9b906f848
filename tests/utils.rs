use wiremock::{Match, Request};

/// Matches a pyLoad POST body carrying form field `key` with exactly `value`.
///
/// The value is compared after form decoding, so it is the per-field JSON
/// text (`"\"Test\""`, `["https://a/x.zip"]`) or byte literal the client rendered.
pub struct FormParamExactMatcher(String, String);

impl FormParamExactMatcher {
    /// Expect field `key` to decode to `value`.
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self(key.into(), value.into())
    }
}

/// Shorthand for [`FormParamExactMatcher::new`].
pub fn form_param<K, V>(key: K, value: V) -> FormParamExactMatcher
where
    K: Into<String>,
    V: Into<String>,
{
    FormParamExactMatcher::new(key, value)
}

impl Match for FormParamExactMatcher {
    fn matches(&self, request: &Request) -> bool {
        form_urlencoded::parse(&request.body)
            .any(|q| q.0 == self.0.as_str() && q.1 == self.1.as_str())
    }
}
