// Query-string building for the listing endpoint

/// Parameters of a listing request
///
/// Empty filters mean "unconstrained" and are left off the query string
/// entirely instead of being sent as empty constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: String,
    pub country: String,
    pub category: String,
    pub status: String,
}

impl ListParams {
    /// Key/value pairs in the order the service documents them
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }

        for (key, value) in [
            ("search", &self.search),
            ("country", &self.country),
            ("category", &self.category),
            ("status", &self.status),
        ] {
            if !value.is_empty() {
                pairs.push((key, value.clone()));
            }
        }

        pairs
    }

    /// Encoded query string, handy for logs
    pub fn to_query_string(&self) -> String {
        self.to_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
