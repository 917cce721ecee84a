//! Proxy URIs: the HTTP request targets under which webservices are reachable.

use oxigraph::model::NamedNode;
use std::fmt;

const GRAPH_QUERY_PREFIX: &str = "/?graph=";

/// A request target in decoded form, e.g. `/?graph=http://example.org/a`.
///
/// Lookups compare the decoded strings exactly; [`ProxyUri::encoded`] yields the
/// URI-encoded form that is handed out to clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyUri(String);

impl ProxyUri {
    /// Proxy URI of a semantic resource: `"/?graph=" + graphName`.
    pub fn for_graph(graph_name: &NamedNode) -> Self {
        ProxyUri(format!("{}{}", GRAPH_QUERY_PREFIX, graph_name.as_str()))
    }

    /// Proxy URI for a plain (non-semantic) webservice path such as `/`.
    pub fn plain(path: impl Into<String>) -> Self {
        ProxyUri(path.into())
    }

    /// Decode a raw request target (path plus query).
    pub fn from_request_target(target: &str) -> crate::Result<Self> {
        let decoded = urlencoding::decode(target).map_err(|e| {
            crate::GatewayError::Parse(format!("Invalid request target '{}': {}", target, e))
        })?;
        Ok(ProxyUri(decoded.into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Client-facing form with the graph name URI-encoded.
    pub fn encoded(&self) -> String {
        match self.graph_name() {
            Some(graph_name) => {
                format!("{}{}", GRAPH_QUERY_PREFIX, urlencoding::encode(graph_name))
            }
            None => self.0.clone(),
        }
    }

    /// Graph name carried by a semantic proxy URI.
    pub fn graph_name(&self) -> Option<&str> {
        self.0.strip_prefix(GRAPH_QUERY_PREFIX)
    }
}

impl fmt::Display for ProxyUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
