use serde_json::{json, Map, Value};
use crate::api::collection::{strip_status, Collection};
use crate::api::executor::ApiExecutor;
use crate::api::types::IndexInfo;
use crate::common::error::{ArangoError, ErrorCode, ErrorKind, Result};
use crate::common::utils::encode_segment;
use crate::connection::{Request, Response};

/// Attributes shared by the index types. Unset fields are left to the
/// server default.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub unique: Option<bool>,
    pub sparse: Option<bool>,
    /// Hash and skiplist only: index array values once per document
    pub deduplicate: Option<bool>,
    pub name: Option<String>,
    pub in_background: Option<bool>,
}

impl IndexOptions {
    fn apply(&self, body: &mut Map<String, Value>) {
        if let Some(unique) = self.unique {
            body.insert("unique".to_string(), json!(unique));
        }
        if let Some(sparse) = self.sparse {
            body.insert("sparse".to_string(), json!(sparse));
        }
        if let Some(deduplicate) = self.deduplicate {
            body.insert("deduplicate".to_string(), json!(deduplicate));
        }
        if let Some(name) = &self.name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(in_background) = self.in_background {
            body.insert("inBackground".to_string(), json!(in_background));
        }
    }
}

fn index_body(index_type: &str, fields: &[&str], options: &IndexOptions) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("type".to_string(), json!(index_type));
    body.insert("fields".to_string(), json!(fields));
    options.apply(&mut body);
    body
}

fn index_info(resp: Response) -> Result<IndexInfo> {
    if !resp.is_success {
        return Err(ArangoError::server(ErrorKind::IndexCreate, &resp));
    }
    Ok(serde_json::from_value(strip_status(resp.body))?)
}

impl<E: ApiExecutor> Collection<E> {
    /// Indexes of the collection, primary and edge indexes included
    pub async fn indexes(&self) -> Result<E::Output<Vec<IndexInfo>>> {
        let request = Request::get("/_api/index").with_param("collection", self.name());
        self.executor()
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::IndexList, &resp));
                }
                resp.json_field::<Vec<IndexInfo>>("indexes")
            })
            .await
    }

    /// Create an index from a raw definition. Creating an index that already
    /// exists returns it with `is_newly_created` unset or false.
    pub async fn add_index(&self, definition: Map<String, Value>) -> Result<E::Output<IndexInfo>> {
        let request = Request::post("/_api/index")
            .with_param("collection", self.name())
            .with_json(Value::Object(definition));
        self.executor().execute(request, index_info).await
    }

    pub async fn add_hash_index(&self, fields: &[&str], options: IndexOptions) -> Result<E::Output<IndexInfo>> {
        self.add_index(index_body("hash", fields, &options)).await
    }

    pub async fn add_skiplist_index(&self, fields: &[&str], options: IndexOptions) -> Result<E::Output<IndexInfo>> {
        self.add_index(index_body("skiplist", fields, &options)).await
    }

    pub async fn add_persistent_index(&self, fields: &[&str], options: IndexOptions) -> Result<E::Output<IndexInfo>> {
        self.add_index(index_body("persistent", fields, &options)).await
    }

    /// Geo index over one field holding `[lat, lng]` (or a GeoJSON object
    /// when `geo_json` is set) or over two fields holding lat and lng
    pub async fn add_geo_index(&self, fields: &[&str], geo_json: Option<bool>, options: IndexOptions) -> Result<E::Output<IndexInfo>> {
        let mut body = index_body("geo", fields, &options);
        if let Some(geo_json) = geo_json {
            body.insert("geoJson".to_string(), json!(geo_json));
        }
        self.add_index(body).await
    }

    pub async fn add_fulltext_index(&self, fields: &[&str], min_length: Option<u64>, options: IndexOptions) -> Result<E::Output<IndexInfo>> {
        let mut body = index_body("fulltext", fields, &options);
        if let Some(min_length) = min_length {
            body.insert("minLength".to_string(), json!(min_length));
        }
        self.add_index(body).await
    }

    /// Documents expire `expiry_secs` after the timestamp in the indexed field
    pub async fn add_ttl_index(&self, fields: &[&str], expiry_secs: u64, options: IndexOptions) -> Result<E::Output<IndexInfo>> {
        let mut body = index_body("ttl", fields, &options);
        body.insert("expireAfter".to_string(), json!(expiry_secs));
        self.add_index(body).await
    }

    /// Inverted index; `analyzer` applies to every field without its own
    pub async fn add_inverted_index(&self, fields: &[&str], analyzer: Option<&str>, options: IndexOptions) -> Result<E::Output<IndexInfo>> {
        let mut body = index_body("inverted", fields, &options);
        if let Some(analyzer) = analyzer {
            body.insert("analyzer".to_string(), json!(analyzer));
        }
        self.add_index(body).await
    }

    /// Delete an index by its id, with or without the collection prefix.
    /// A missing index gives `false` when `ignore_missing` is set.
    pub async fn delete_index(&self, index_id: &str, ignore_missing: bool) -> Result<E::Output<bool>> {
        let index_id = index_id.rsplit_once('/').map_or(index_id, |(_, id)| id);
        let request = Request::delete(format!("/_api/index/{}/{}", self.segment(), encode_segment(index_id)));
        self.executor()
            .execute(request, move |resp: Response| {
                if resp.error_code == Some(ErrorCode::ArangoIndexNotFound.as_u32()) && ignore_missing {
                    return Ok(false);
                }
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::IndexDelete, &resp));
                }
                Ok(true)
            })
            .await
    }
}
