use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::{
    domain::{Parameter, Sample},
    protocol::{
        AppEnvelope, ControlCommand, DataBody, ParamsBody, ResourceKind, StatusBody,
        StatusSnapshot,
    },
};
use tracing::{debug, info};

pub mod collections;
pub mod config;
pub mod error;
pub mod params;
pub mod poller;
pub mod resources;
pub mod view_model;

pub use collections::{CollectionSeries, CollectionSet};
pub use self::config::{load_settings, ClientSettings};
pub use error::{ClientError, ClientResult};
pub use params::ParameterForm;
pub use poller::{PollEvent, Poller, PollerConfig};
pub use resources::{ResourceList, SettingsTree};
pub use view_model::{ControlKind, EngageGate, RunStateViewModel, StatusPalette};

/// Read and control operations offered by a COMET backend.
#[async_trait]
pub trait CometApi: Send + Sync {
    async fn status(&self) -> ClientResult<StatusSnapshot>;
    async fn params(&self) -> ClientResult<Vec<Parameter>>;
    async fn send_command(&self, command: &ControlCommand) -> ClientResult<()>;
    /// Raw payload found under `app.<resource>`.
    async fn resource(&self, kind: ResourceKind) -> ClientResult<Value>;
    async fn collection_data(&self, collection: &str, offset: usize) -> ClientResult<Vec<Sample>>;

    async fn resource_list(&self, kind: ResourceKind) -> ClientResult<ResourceList> {
        Ok(ResourceList::from_value(&self.resource(kind).await?))
    }

    async fn settings_tree(&self) -> ClientResult<SettingsTree> {
        Ok(SettingsTree::from_value(
            &self.resource(ResourceKind::Settings).await?,
        ))
    }
}

pub struct HttpCometApi {
    http: Client,
    base: Url,
}

impl HttpCometApi {
    pub fn new(server_url: &str, timeout: Duration) -> ClientResult<Self> {
        let base = Url::parse(server_url.trim()).map_err(|source| ClientError::InvalidUrl {
            url: server_url.to_string(),
            source,
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: server_url.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Transport {
                path: "client setup".to_string(),
                source,
            })?;
        Ok(Self { http, base })
    }

    pub fn from_settings(settings: &ClientSettings) -> ClientResult<Self> {
        Self::new(&settings.server_url, settings.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn endpoint_for_path(&self, path: &str) -> Url {
        self.endpoint(path.trim_start_matches('/').split('/'))
    }

    async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<&BTreeMap<String, Value>>,
    ) -> ClientResult<reqwest::Response> {
        let path = url.path().to_string();
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                path: path.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                path,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_app<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        let path = url.path().to_string();
        let bytes = self
            .request(Method::GET, url, None)
            .await?
            .bytes()
            .await
            .map_err(|source| ClientError::Transport {
                path: path.clone(),
                source,
            })?;
        let envelope: AppEnvelope<T> =
            serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode {
                path: path.clone(),
                message: err.to_string(),
            })?;
        debug!(path = %path, "fetched");
        Ok(envelope.app)
    }
}

#[async_trait]
impl CometApi for HttpCometApi {
    async fn status(&self) -> ClientResult<StatusSnapshot> {
        let body: StatusBody = self.get_app(self.endpoint(["api", "status"])).await?;
        Ok(body.status)
    }

    async fn params(&self) -> ClientResult<Vec<Parameter>> {
        let body: ParamsBody = self.get_app(self.endpoint(["api", "params"])).await?;
        Ok(body.params)
    }

    async fn send_command(&self, command: &ControlCommand) -> ClientResult<()> {
        let url = self.endpoint_for_path(command.path());
        let body = match command {
            ControlCommand::Start(values) => Some(values),
            ControlCommand::Stop | ControlCommand::Pause => None,
        };
        self.request(Method::POST, url, body).await?;
        info!(command = command.name(), "control command accepted");
        Ok(())
    }

    async fn resource(&self, kind: ResourceKind) -> ClientResult<Value> {
        let path = kind.path();
        let mut body: Map<String, Value> = self.get_app(self.endpoint_for_path(&path)).await?;
        body.remove(kind.envelope_key())
            .ok_or_else(|| ClientError::Decode {
                path,
                message: format!("missing app.{}", kind.envelope_key()),
            })
    }

    async fn collection_data(&self, collection: &str, offset: usize) -> ClientResult<Vec<Sample>> {
        let offset_text = offset.to_string();
        let url = self.endpoint([
            "api",
            "collections",
            collection,
            "data",
            "offset",
            offset_text.as_str(),
        ]);
        let path = url.path().to_string();
        let body: DataBody = self.get_app(url).await?;
        body.data
            .iter()
            .map(|record| {
                Sample::from_record(record).ok_or_else(|| ClientError::Decode {
                    path: path.clone(),
                    message: "collection record without timestamp".to_string(),
                })
            })
            .collect()
    }
}

/// Sends `command` only if the view model currently enables it.
pub async fn send_gated(
    api: &dyn CometApi,
    view_model: &RunStateViewModel,
    command: ControlCommand,
) -> ClientResult<()> {
    view_model.ensure_enabled(ControlKind::of(&command))?;
    api.send_command(&command).await
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
