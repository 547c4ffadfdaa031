//! Reqwest adapter for the remote document store's query API.

mod records;

pub use records::RawRecord;

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::pagination::{Cursor, PageRequest, PostPage};
use crate::application::store::{ContentStore, PostFilter, StoreError};
use crate::config::UpstreamSettings;

pub const METRIC_UPSTREAM_QUERY_TOTAL: &str = "tidepool_upstream_query_total";
pub const METRIC_UPSTREAM_ERROR_TOTAL: &str = "tidepool_upstream_error_total";

/// HTTP client for the upstream post collection.
///
/// Every query it issues is scoped to the configured project and to
/// published records, and sorted by the `When` timestamp descending; callers
/// have no handle through which to change any of that.
pub struct HttpContentStore {
    client: Client,
    query_url: Url,
    token: String,
    project_id: String,
}

impl HttpContentStore {
    pub fn from_settings(settings: &UpstreamSettings) -> Result<Self, StoreError> {
        let base = Url::parse(&settings.base_url).map_err(|err| {
            StoreError::configuration(format!("invalid upstream base URL: {err}"))
        })?;
        let query_url = base
            .join(&format!("v1/collections/{}/query", settings.collection_id))
            .map_err(|err| {
                StoreError::configuration(format!("invalid collection query URL: {err}"))
            })?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(StoreError::from_transport)?;

        Ok(Self {
            client,
            query_url,
            token: settings.api_token.clone(),
            project_id: settings.project_id.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("tidepool/", env!("CARGO_PKG_VERSION"))
    }

    fn query_body(&self, filter: &PostFilter, page: &PageRequest) -> QueryRequest {
        let mut conditions = vec![
            Condition::Relation {
                property: "Project",
                relation: RelationContains {
                    contains: self.project_id.clone(),
                },
            },
            Condition::Checkbox {
                property: "Publish",
                checkbox: CheckboxEquals { equals: true },
            },
        ];

        if let Some(slug) = &filter.slug {
            conditions.push(Condition::Formula {
                property: "Slug",
                formula: FormulaString {
                    string: StringEquals {
                        equals: slug.clone(),
                    },
                },
            });
        }

        if !filter.any_tag.is_empty() {
            conditions.push(Condition::Any {
                or: filter
                    .any_tag
                    .iter()
                    .map(|tag_id| Condition::MultiSelect {
                        property: "Tags",
                        multi_select: MultiSelectContains {
                            contains: tag_id.clone(),
                        },
                    })
                    .collect(),
            });
        }

        QueryRequest {
            filter: Condition::All { and: conditions },
            sorts: vec![Sort {
                property: "When",
                direction: "descending",
            }],
            page_size: page.page_size(),
            start_cursor: page.cursor().map(|cursor| cursor.as_str().to_string()),
        }
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn query_page(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<PostPage, StoreError> {
        let body = self.query_body(filter, &page);
        counter!(METRIC_UPSTREAM_QUERY_TOTAL).increment(1);

        let response = self
            .client
            .post(self.query_url.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                counter!(METRIC_UPSTREAM_ERROR_TOTAL).increment(1);
                StoreError::from_transport(err)
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| {
            counter!(METRIC_UPSTREAM_ERROR_TOTAL).increment(1);
            StoreError::from_transport(err)
        })?;

        if !status.is_success() {
            counter!(METRIC_UPSTREAM_ERROR_TOTAL).increment(1);
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let decoded: QueryResponse = serde_json::from_slice(&bytes)
            .map_err(|err| StoreError::decode(format!("query response: {err}")))?;

        let mut posts = Vec::with_capacity(decoded.results.len());
        for raw in decoded.results {
            posts.push(raw.normalize()?);
        }

        debug!(
            received = posts.len(),
            has_more = decoded.has_more,
            "upstream query page"
        );
        Ok(PostPage {
            posts,
            has_more: decoded.has_more,
            next_cursor: decoded.next_cursor.map(Cursor::new),
        })
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    filter: Condition,
    sorts: Vec<Sort>,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct Sort {
    property: &'static str,
    direction: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Condition {
    All {
        and: Vec<Condition>,
    },
    Any {
        or: Vec<Condition>,
    },
    Checkbox {
        property: &'static str,
        checkbox: CheckboxEquals,
    },
    Relation {
        property: &'static str,
        relation: RelationContains,
    },
    Formula {
        property: &'static str,
        formula: FormulaString,
    },
    MultiSelect {
        property: &'static str,
        multi_select: MultiSelectContains,
    },
}

#[derive(Debug, Serialize)]
struct CheckboxEquals {
    equals: bool,
}

#[derive(Debug, Serialize)]
struct RelationContains {
    contains: String,
}

#[derive(Debug, Serialize)]
struct FormulaString {
    string: StringEquals,
}

#[derive(Debug, Serialize)]
struct StringEquals {
    equals: String,
}

#[derive(Debug, Serialize)]
struct MultiSelectContains {
    contains: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<RawRecord>,
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpContentStore {
        let settings = UpstreamSettings {
            base_url: "https://content.example.com".to_string(),
            api_token: "secret".to_string(),
            collection_id: "col-1".to_string(),
            project_id: "proj-1".to_string(),
            request_timeout_secs: 30,
        };
        HttpContentStore::from_settings(&settings).expect("constructed store")
    }

    #[test]
    fn query_url_targets_the_collection() {
        let store = store();
        assert_eq!(
            store.query_url.as_str(),
            "https://content.example.com/v1/collections/col-1/query"
        );
    }

    #[test]
    fn every_query_carries_project_and_published_conditions() {
        let store = store();
        let page = PageRequest::new(10, None).expect("valid request");
        let body =
            serde_json::to_value(store.query_body(&PostFilter::default(), &page)).expect("json");

        let and = body["filter"]["and"].as_array().expect("and group");
        assert_eq!(and.len(), 2);
        assert_eq!(and[0]["property"], "Project");
        assert_eq!(and[0]["relation"]["contains"], "proj-1");
        assert_eq!(and[1]["property"], "Publish");
        assert_eq!(and[1]["checkbox"]["equals"], true);

        assert_eq!(body["sorts"][0]["property"], "When");
        assert_eq!(body["sorts"][0]["direction"], "descending");
        assert_eq!(body["page_size"], 10);
        assert!(body.get("start_cursor").is_none());
    }

    #[test]
    fn slug_filter_adds_a_formula_condition() {
        let store = store();
        let page = PageRequest::new(1, None).expect("valid request");
        let body = serde_json::to_value(store.query_body(&PostFilter::by_slug("hello"), &page))
            .expect("json");

        let and = body["filter"]["and"].as_array().expect("and group");
        assert_eq!(and.len(), 3);
        assert_eq!(and[2]["property"], "Slug");
        assert_eq!(and[2]["formula"]["string"]["equals"], "hello");
    }

    #[test]
    fn tag_filter_builds_an_or_group() {
        let store = store();
        let page = PageRequest::new(3, None).expect("valid request");
        let filter = PostFilter::with_any_tag(vec!["t1".to_string(), "t2".to_string()]);
        let body = serde_json::to_value(store.query_body(&filter, &page)).expect("json");

        let and = body["filter"]["and"].as_array().expect("and group");
        let or = and[2]["or"].as_array().expect("or group");
        assert_eq!(or.len(), 2);
        assert_eq!(or[0]["multi_select"]["contains"], "t1");
        assert_eq!(or[1]["multi_select"]["contains"], "t2");
    }

    #[test]
    fn cursor_is_forwarded_verbatim() {
        let store = store();
        let page =
            PageRequest::new(10, Some(Cursor::new("opaque-token"))).expect("valid request");
        let body =
            serde_json::to_value(store.query_body(&PostFilter::default(), &page)).expect("json");

        assert_eq!(body["start_cursor"], "opaque-token");
    }
}
