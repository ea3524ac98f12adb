//! Exact (method, path) lookup against the endpoint store.

use crate::model::{Endpoint, HttpMethod};
use crate::store::{EndpointStore, StoreError};
use std::sync::Arc;

/// Maps an incoming (method, path) pair to a stored endpoint definition.
///
/// Matching is exact string equality on the path and exact equality on the
/// method. No wildcards, no trailing-slash normalization, no case-folding.
pub struct EndpointResolver {
    store: Arc<dyn EndpointStore>,
}

impl EndpointResolver {
    pub fn new(store: Arc<dyn EndpointStore>) -> Self {
        Self { store }
    }

    /// A miss is a normal outcome, not an error.
    pub fn find_endpoint(
        &self,
        method: HttpMethod,
        path: &str,
    ) -> Result<Option<Endpoint>, StoreError> {
        self.store.find_route(method, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewEndpoint;
    use crate::store::InMemoryStore;

    #[test]
    fn test_find_endpoint_is_exact() {
        let store = Arc::new(InMemoryStore::new());
        store
            .create_endpoint(NewEndpoint {
                method: HttpMethod::GET,
                path: "/api/users".to_string(),
                description: None,
                presets: Vec::new(),
            })
            .unwrap();

        let resolver = EndpointResolver::new(store);
        assert!(resolver
            .find_endpoint(HttpMethod::GET, "/api/users")
            .unwrap()
            .is_some());
        assert!(resolver
            .find_endpoint(HttpMethod::DELETE, "/api/users")
            .unwrap()
            .is_none());
        assert!(resolver
            .find_endpoint(HttpMethod::GET, "/api/users/42")
            .unwrap()
            .is_none());
    }
}
