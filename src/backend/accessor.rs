use crate::core::{DataOrigin, ExpiringNamedGraph, Identifier, ModificationResult};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use oxigraph::model::Graph;

/// Performs reads and writes against the data origins of one backend.
///
/// Every operation is asynchronous because the origin may be a slow or offline network
/// peer. Operations a backend does not implement fail with
/// [`GatewayError::OperationNotSupported`]. The core never retries; timeouts and retries
/// belong to the implementation.
#[async_trait]
pub trait Accessor<I: Identifier>: Send + Sync {
    /// Fetch the current status of `origin` as a graph named after it.
    async fn get_status(&self, origin: &DataOrigin<I>) -> Result<ExpiringNamedGraph> {
        Err(unsupported("GET", origin))
    }

    /// Apply `graph` as the new status of `origin`.
    async fn set_status(
        &self,
        origin: &DataOrigin<I>,
        graph: Graph,
    ) -> Result<ModificationResult> {
        let _ = graph;
        Err(unsupported("PUT", origin))
    }

    async fn delete_resource(&self, origin: &DataOrigin<I>) -> Result<ModificationResult> {
        Err(unsupported("DELETE", origin))
    }
}

fn unsupported<I: Identifier>(operation: &str, origin: &DataOrigin<I>) -> GatewayError {
    GatewayError::OperationNotSupported(format!("{} on {}", operation, origin.graph_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::NamedNode;

    struct ReadOnly;

    #[async_trait]
    impl Accessor<String> for ReadOnly {
        async fn get_status(&self, origin: &DataOrigin<String>) -> Result<ExpiringNamedGraph> {
            Ok(ExpiringNamedGraph::indefinite(origin.graph_name().clone(), Graph::new()))
        }
    }

    #[tokio::test]
    async fn test_unimplemented_operations_fail_as_unsupported() {
        let origin =
            DataOrigin::new("a".to_string(), NamedNode::new("http://ex/a").unwrap());
        assert!(ReadOnly.get_status(&origin).await.is_ok());

        let put = ReadOnly.set_status(&origin, Graph::new()).await.unwrap_err();
        assert!(matches!(put, GatewayError::OperationNotSupported(_)));
        assert_eq!(put.to_string(), "Operation not supported: PUT on <http://ex/a>");

        let delete = ReadOnly.delete_resource(&origin).await.unwrap_err();
        assert!(matches!(delete, GatewayError::OperationNotSupported(_)));
    }
}
