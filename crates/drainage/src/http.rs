//! `reqwest` implementation of [`NetworkApi`].

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::api::{BoxFuture, Collection, NetworkApi};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::records::{ConduitRecord, JunctionRecord, OutfallRecord, Payload, SubcatchmentRecord};

pub struct HttpNetworkApi {
    client: Client,
    config: ApiConfig,
}

impl HttpNetworkApi {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| ApiError::Http {
                endpoint: config.base_url.clone(),
                source,
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn get_value(&self, path: &str) -> Result<(String, Value), ApiError> {
        let endpoint = self.config.endpoint(path);
        debug!("GET {endpoint}");
        let resp = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|source| ApiError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|source| ApiError::Http {
            endpoint: endpoint.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                detail: error_detail(&body),
                endpoint,
                status: status.as_u16(),
            });
        }

        let value = serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            endpoint: endpoint.clone(),
            source,
        })?;
        Ok((endpoint, value))
    }

    async fn get_list<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, ApiError> {
        let (endpoint, value) = self.get_value(collection.as_str()).await?;
        let payload: Payload<Vec<T>> =
            serde_json::from_value(value).map_err(|source| ApiError::Decode { endpoint, source })?;
        payload.into_result()
    }
}

/// FastAPI puts the reason in `detail`; anything else is shown as text.
fn error_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(obj)) => match obj.get("detail").or_else(|| obj.get("message")) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(obj).to_string(),
        },
        _ => String::from_utf8_lossy(body).trim().to_string(),
    }
}

/// GeoJSON is passed through unless it is wrapped in the result envelope.
fn unwrap_boundary(value: Value) -> Result<Value, ApiError> {
    let is_envelope = value.get("type").is_none() && value.get("code").is_some();
    if !is_envelope {
        return Ok(value);
    }
    let code = value.get("code").and_then(Value::as_i64).unwrap_or_default();
    if code != 200 {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(ApiError::Rejected { code, message });
    }
    Ok(value.get("data").cloned().unwrap_or(Value::Null))
}

impl NetworkApi for HttpNetworkApi {
    fn list_junctions(&self) -> BoxFuture<'_, Result<Vec<JunctionRecord>, ApiError>> {
        Box::pin(self.get_list(Collection::Junctions))
    }

    fn list_outfalls(&self) -> BoxFuture<'_, Result<Vec<OutfallRecord>, ApiError>> {
        Box::pin(self.get_list(Collection::Outfalls))
    }

    fn list_conduits(&self) -> BoxFuture<'_, Result<Vec<ConduitRecord>, ApiError>> {
        Box::pin(self.get_list(Collection::Conduits))
    }

    fn list_subcatchments(&self) -> BoxFuture<'_, Result<Vec<SubcatchmentRecord>, ApiError>> {
        Box::pin(self.get_list(Collection::Subcatchments))
    }

    fn get_boundary(&self) -> BoxFuture<'_, Result<Value, ApiError>> {
        Box::pin(async move {
            let (_, value) = self.get_value(&self.config.boundary_path).await?;
            unwrap_boundary(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{error_detail, unwrap_boundary};
    use crate::error::ApiError;
    use serde_json::json;

    #[test]
    fn detail_is_extracted_from_fastapi_errors() {
        assert_eq!(error_detail(br#"{"detail":"Not Found"}"#), "Not Found");
        assert_eq!(error_detail(b"bad gateway\n"), "bad gateway");
    }

    #[test]
    fn boundary_envelope_is_unwrapped() {
        let fc = json!({ "type": "FeatureCollection", "features": [] });
        assert_eq!(unwrap_boundary(fc.clone()).unwrap(), fc);
        let wrapped = json!({ "code": 200, "message": "", "data": fc.clone() });
        assert_eq!(unwrap_boundary(wrapped).unwrap(), fc);
        let rejected = json!({ "code": 404, "message": "missing" });
        assert!(matches!(
            unwrap_boundary(rejected),
            Err(ApiError::Rejected { code: 404, .. })
        ));
    }
}
