use std::{pin::Pin, time::Duration};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, bail, eyre},
};
use log::debug;
use nonempty::NonEmpty;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;

mod error;
pub use error::ReplicateApiError;

use crate::config::Config;

use super::{GenerationRequest, GenerationResult, Inference, Model};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct ReplicateClient {
    client: Client,
    api_token: String,
    api_base: String,
    poll_interval: Duration,
}

impl ReplicateClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_token: config.api_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn predictions_url(&self, model: Model) -> String {
        format!("{}/models/{}/predictions", self.api_base, model.replicate_id())
    }
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: &'a GenerationRequest,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    output: Option<PredictionOutput>,
    error: Option<Value>,
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: String,
}

/// Pro answers with a single URL, Schnell with a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionOutput {
    Single(String),
    Many(Vec<String>),
}

impl TryFrom<PredictionOutput> for GenerationResult {
    type Error = color_eyre::Report;

    fn try_from(output: PredictionOutput) -> Result<Self> {
        let urls = match output {
            PredictionOutput::Single(url) => NonEmpty::new(url),
            PredictionOutput::Many(urls) => {
                NonEmpty::from_vec(urls).ok_or(eyre!("Prediction returned no output URLs"))?
            }
        };
        Ok(GenerationResult(urls))
    }
}

impl Inference for ReplicateClient {
    fn run<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResult>> + Send + 'a>> {
        Box::pin(async move {
            let model = request.model();
            // 1. Create prediction, asking the API to hold the connection until it finishes
            let body = PredictionRequest { input: request };
            debug!("Running {model} with: {}", serde_json::to_string(&body)?);
            let resp = self
                .client
                .post(self.predictions_url(model))
                .bearer_auth(&self.api_token)
                .header("Prefer", "wait")
                .json(&body)
                .send()
                .await?;
            let mut prediction = parse_prediction(resp).await?;

            // 2. Poll until it reaches a terminal state
            loop {
                debug!("Prediction {}: {}", prediction.id, prediction.status);
                match prediction.status.as_str() {
                    "succeeded" => {
                        let output = prediction.output.ok_or_else(|| {
                            eyre!("Prediction {} succeeded without output", prediction.id)
                        })?;
                        return output.try_into();
                    }
                    "failed" | "canceled" => bail!(
                        "Replicate prediction {} {}: {}",
                        prediction.id,
                        prediction.status,
                        prediction.error.unwrap_or(Value::Null)
                    ),
                    _ => {
                        let poll_url = prediction
                            .urls
                            .as_ref()
                            .map(|urls| urls.get.clone())
                            .ok_or_else(|| {
                                eyre!("Missing prediction get URL:\n{prediction:#?}")
                            })?;
                        sleep(self.poll_interval).await;
                        let resp = self
                            .client
                            .get(&poll_url)
                            .bearer_auth(&self.api_token)
                            .send()
                            .await?;
                        prediction = parse_prediction(resp).await?;
                    }
                }
            }
        })
    }
}

async fn parse_prediction(resp: Response) -> Result<Prediction> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(ReplicateApiError::from_response(status, &body).into());
    }
    serde_json::from_str(&body).wrap_err_with(|| format!("Malformed prediction reply:\n{body}"))
}
