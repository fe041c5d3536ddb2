//! Search request construction for the two supported query API dialects.

use clap::ValueEnum;
use regex::Regex;
use serde_json::{json, Value};

/// Query API dialect of the target cluster.
///
/// `Legacy` produces the 1.x/2.x request shape (filtered query, count-only
/// search type), `V5` the 5.x shape (bool/must query, zero-size search).
/// Selected once per invocation, never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dialect {
    Legacy,
    V5,
}

/// Parameters of a metric query.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    /// User-supplied search expression, e.g. `source:localhorst AND message:login failed`.
    pub query: String,
    /// Relative time window, e.g. `5m`, `1h`, `32d`.
    pub duration: String,
    /// Index pattern, e.g. `logstash-*`.
    pub index: String,
    /// Number of terms in the top-N breakdown.
    pub top: Option<u64>,
    /// Field the top-N breakdown aggregates on.
    pub field: Option<String>,
}

/// Name of the terms aggregation in both the request and the response.
pub(crate) const TOP_AGG_NAME: &str = "top-tags";

/// Build the `_search` endpoint suffix and request body for a dialect.
///
/// Both dialects express the same search: a full-text query over the default
/// fields, restricted to `[now - duration, now]` on `@timestamp`, with an
/// optional terms aggregation when `top` and `field` are both set.
///
/// The query string and field name are embedded verbatim. Wildcards and
/// boolean operators in `query` pass through to the engine as-is, which also
/// means there is no Lucene escaping; callers own what they put in the query.
pub fn build_search(spec: &QuerySpec, dialect: Dialect) -> (String, Value) {
    let mut body = match dialect {
        Dialect::Legacy => json!({
            "query": {
                "filtered": {
                    "query": {
                        "query_string": {
                            "query": spec.query,
                            "default_field": "_all"
                        }
                    },
                    "filter": {
                        "range": {
                            "@timestamp": {
                                "from": format!("now-{}", spec.duration),
                                "to": "now"
                            }
                        }
                    }
                }
            },
            "from": 0
        }),
        Dialect::V5 => json!({
            "query": {
                "bool": {
                    "must": [
                        {
                            "query_string": {
                                "query": spec.query,
                                "analyze_wildcard": true
                            }
                        },
                        {
                            "range": {
                                "@timestamp": {
                                    "gte": format!("now-{}", spec.duration),
                                    "lte": "now"
                                }
                            }
                        }
                    ]
                }
            }
        }),
    };

    // The breakdown needs both a size and a field; with either missing the
    // aggregation is omitted entirely.
    if let (Some(top), Some(field)) = (spec.top, &spec.field) {
        body["aggs"] = json!({
            TOP_AGG_NAME: {
                "terms": {
                    "field": field,
                    "size": top
                }
            }
        });
    }

    let suffix = match dialect {
        Dialect::Legacy => "?search_type=count",
        Dialect::V5 => "?size=0",
    };

    (suffix.to_string(), body)
}

/// Check that a duration is in Elasticsearch date-math form, e.g. `5m`, `1h`, `32d`.
pub fn validate_duration(duration: &str) -> bool {
    let re = Regex::new(r"^[0-9]+(ms|s|m|h|d|w|M|y)$").unwrap();
    re.is_match(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(top: Option<u64>, field: Option<&str>) -> QuerySpec {
        QuerySpec {
            query: "status:error".to_string(),
            duration: "5m".to_string(),
            index: "logstash-*".to_string(),
            top,
            field: field.map(String::from),
        }
    }

    #[test]
    fn test_legacy_body_shape() {
        let (suffix, body) = build_search(&spec(None, None), Dialect::Legacy);

        assert_eq!(suffix, "?search_type=count");
        assert_eq!(
            body["query"]["filtered"]["query"]["query_string"]["query"],
            "status:error"
        );
        assert_eq!(
            body["query"]["filtered"]["query"]["query_string"]["default_field"],
            "_all"
        );
        assert_eq!(
            body["query"]["filtered"]["filter"]["range"]["@timestamp"]["from"],
            "now-5m"
        );
        assert_eq!(
            body["query"]["filtered"]["filter"]["range"]["@timestamp"]["to"],
            "now"
        );
        assert_eq!(body["from"], 0);
    }

    #[test]
    fn test_v5_body_shape() {
        let (suffix, body) = build_search(&spec(None, None), Dialect::V5);

        assert_eq!(suffix, "?size=0");
        let must = body["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0]["query_string"]["query"], "status:error");
        assert_eq!(must[0]["query_string"]["analyze_wildcard"], true);
        assert_eq!(must[1]["range"]["@timestamp"]["gte"], "now-5m");
        assert_eq!(must[1]["range"]["@timestamp"]["lte"], "now");
    }

    #[test]
    fn test_dialects_differ_but_embed_same_inputs() {
        let spec = spec(Some(3), Some("host"));
        let (_, legacy) = build_search(&spec, Dialect::Legacy);
        let (_, v5) = build_search(&spec, Dialect::V5);

        assert_ne!(legacy, v5);
        assert_eq!(legacy["aggs"], v5["aggs"]);
        assert_eq!(
            legacy["query"]["filtered"]["query"]["query_string"]["query"],
            v5["query"]["bool"]["must"][0]["query_string"]["query"]
        );
    }

    #[test]
    fn test_query_string_is_verbatim() {
        let mut spec = spec(None, None);
        spec.query = "host:web-* AND NOT level:debug".to_string();
        let (_, body) = build_search(&spec, Dialect::V5);

        assert_eq!(
            body["query"]["bool"]["must"][0]["query_string"]["query"],
            "host:web-* AND NOT level:debug"
        );
    }

    #[test]
    fn test_aggregation_included_with_top_and_field() {
        for dialect in [Dialect::Legacy, Dialect::V5] {
            let (_, body) = build_search(&spec(Some(5), Some("source")), dialect);
            let terms = &body["aggs"][TOP_AGG_NAME]["terms"];
            assert_eq!(terms["field"], "source");
            assert_eq!(terms["size"], 5);
        }
    }

    #[test]
    fn test_aggregation_omitted_without_top() {
        for dialect in [Dialect::Legacy, Dialect::V5] {
            let (_, body) = build_search(&spec(None, Some("source")), dialect);
            assert!(body.get("aggs").is_none());
        }
    }

    #[test]
    fn test_aggregation_omitted_without_field() {
        for dialect in [Dialect::Legacy, Dialect::V5] {
            let (_, body) = build_search(&spec(Some(5), None), dialect);
            assert!(body.get("aggs").is_none());
        }
    }

    #[test]
    fn test_validate_duration() {
        for ok in ["5m", "1h", "32d", "500ms", "2w", "1M", "1y", "90s"] {
            assert!(validate_duration(ok), "{} should be accepted", ok);
        }
        for bad in ["", "m5", "5 m", "5", "h", "5m ", "-5m", "5mm"] {
            assert!(!validate_duration(bad), "{} should be rejected", bad);
        }
    }
}
