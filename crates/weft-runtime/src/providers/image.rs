//! Image-generation providers.
//!
//! OpenAI and xAI answer synchronously. Replicate models are asynchronous: a
//! prediction is created and then polled at a fixed interval until it reaches
//! a terminal state or the attempt budget runs out.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};
use weft_config::ImageConfig;
use weft_host_config::Provider;
use weft_host_http::HttpRequest;

use crate::context::RunContext;
use crate::error::NodeError;
use crate::providers::{call_json, non_blank};

pub const DEFAULT_OPENAI_IMAGE_MODEL: &str = "gpt-image-1.5";
pub const DEFAULT_GROK_IMAGE_MODEL: &str = "grok-2-image-1212";
pub const GROK_PROMPT_LIMIT: usize = 1024;

const DEFAULT_SIZE: &str = "1024x1024";
const DEFAULT_DIMENSION: u32 = 1024;
const DEFAULT_GUIDANCE_SCALE: f64 = 7.5;
const DEFAULT_INFERENCE_STEPS: u32 = 50;

const STABLE_DIFFUSION_VERSION: &str =
  "db21e45d3f7023abc2a46ee38a23973f6dce16bb082a930b0c49861f96d1e5bf";
const STABLE_DIFFUSION_XL_VERSION: &str =
  "39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b";
const FLUX_MODEL: &str = "black-forest-labs/flux-dev";

static VERSION_ID: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[a-f0-9]{64}$").expect("version pattern is valid"));

/// Image providers a node may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProvider {
  Dalle,
  Grok,
  StableDiffusion,
  StableDiffusionXl,
  Flux,
}

impl ImageProvider {
  pub fn parse(name: &str) -> Result<Self, NodeError> {
    match name.trim().to_lowercase().as_str() {
      "dalle" | "dall-e" | "openai" => Ok(ImageProvider::Dalle),
      "grok" => Ok(ImageProvider::Grok),
      "stable-diffusion" => Ok(ImageProvider::StableDiffusion),
      "stable-diffusion-xl" => Ok(ImageProvider::StableDiffusionXl),
      "flux" => Ok(ImageProvider::Flux),
      _ => Err(NodeError::configuration(format!(
        "unsupported image provider: {}",
        name
      ))),
    }
  }

  /// Model used when the node names none. Replicate defaults are version ids
  /// or `owner/name` references.
  fn default_model(&self) -> &'static str {
    match self {
      ImageProvider::Dalle => DEFAULT_OPENAI_IMAGE_MODEL,
      ImageProvider::Grok => DEFAULT_GROK_IMAGE_MODEL,
      ImageProvider::StableDiffusion => STABLE_DIFFUSION_VERSION,
      ImageProvider::StableDiffusionXl => STABLE_DIFFUSION_XL_VERSION,
      ImageProvider::Flux => FLUX_MODEL,
    }
  }
}

/// Generated image URLs (or `data:` URLs) and the prompt the provider
/// actually used, when it reports one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedImages {
  pub images: Vec<String>,
  pub revised_prompt: Option<String>,
}

/// Generate images for an already-resolved `prompt`.
#[instrument(name = "image_generate", skip(config, prompt, ctx))]
pub async fn generate(
  provider: ImageProvider,
  config: &ImageConfig,
  prompt: &str,
  ctx: &RunContext,
) -> Result<GeneratedImages, NodeError> {
  let model = non_blank(config.model.as_deref()).unwrap_or(provider.default_model());

  match provider {
    ImageProvider::Dalle => openai(config, model, prompt, ctx).await,
    ImageProvider::Grok => grok(config, model, prompt, ctx).await,
    ImageProvider::StableDiffusion | ImageProvider::StableDiffusionXl | ImageProvider::Flux => {
      replicate(config, model, prompt, ctx).await
    }
  }
}

/// Fields the OpenAI images endpoint accepts for `model`.
pub fn openai_request_body(config: &ImageConfig, model: &str, prompt: &str) -> Value {
  let size = non_blank(config.size.as_deref()).unwrap_or(DEFAULT_SIZE);
  let n = if model == "dall-e-3" {
    1
  } else {
    config.n.unwrap_or(1).clamp(1, 10)
  };

  let mut body = json!({
    "model": model,
    "prompt": prompt,
    "n": n,
    "size": size,
  });

  if model.starts_with("gpt-image") {
    let quality = config.quality.as_deref().map(|q| match q {
      "standard" => "medium",
      "hd" => "high",
      other => other,
    });
    if let Some(quality) = quality.filter(|q| *q != "auto") {
      body["quality"] = json!(quality);
    }
    if let Some(background) = config.background.as_deref().filter(|b| *b != "auto") {
      body["background"] = json!(background);
    }
  } else {
    body["response_format"] = json!("url");
    if model == "dall-e-3" {
      let quality = match config.quality.as_deref() {
        Some("hd") | Some("high") => "hd",
        _ => "standard",
      };
      body["quality"] = json!(quality);
    }
  }

  body
}

async fn openai(
  config: &ImageConfig,
  model: &str,
  prompt: &str,
  ctx: &RunContext,
) -> Result<GeneratedImages, NodeError> {
  let key = ctx.secret(Provider::OpenAi)?;
  let body = openai_request_body(config, model, prompt);

  let url = format!("{}/images/generations", ctx.config.endpoints.openai);
  let http = HttpRequest::post_json(url, body.to_string())
    .header("Authorization", format!("Bearer {}", key));

  let reply = call_json(ctx, http, |status| {
    format!("OpenAI image API error: {}", status)
  })
  .await?;

  let data = reply
    .get("data")
    .and_then(Value::as_array)
    .filter(|items| !items.is_empty())
    .ok_or_else(|| NodeError::external("no images returned from OpenAI"))?;

  let images = data.iter().filter_map(image_url).collect();
  let revised_prompt = data[0]
    .get("revised_prompt")
    .and_then(Value::as_str)
    .map(str::to_string);

  Ok(GeneratedImages {
    images,
    revised_prompt,
  })
}

/// A `b64_json` item as a `data:` URL, otherwise the item's `url`.
fn image_url(item: &Value) -> Option<String> {
  if let Some(encoded) = item.get("b64_json").and_then(Value::as_str) {
    return Some(format!("data:image/png;base64,{}", encoded));
  }
  item.get("url").and_then(Value::as_str).map(str::to_string)
}

async fn grok(
  config: &ImageConfig,
  model: &str,
  prompt: &str,
  ctx: &RunContext,
) -> Result<GeneratedImages, NodeError> {
  if prompt.chars().count() > GROK_PROMPT_LIMIT {
    return Err(NodeError::configuration(format!(
      "Grok image prompts are limited to {} characters",
      GROK_PROMPT_LIMIT
    )));
  }

  let key = ctx.secret(Provider::Grok)?;
  let n = config.n.or(config.num_outputs).unwrap_or(1).clamp(1, 10);
  let body = json!({
    "model": model,
    "prompt": prompt,
    "n": n,
    "response_format": "url",
  });

  let path = if n > 1 {
    "images/generations/batch"
  } else {
    "images/generations"
  };
  let url = format!("{}/{}", ctx.config.endpoints.xai, path);
  let http = HttpRequest::post_json(url, body.to_string())
    .header("Authorization", format!("Bearer {}", key));

  let reply = call_json(ctx, http, |status| format!("Grok image API error: {}", status)).await?;

  let images = grok_images(&reply);
  if images.is_empty() {
    return Err(NodeError::external("no images returned from Grok"));
  }

  Ok(GeneratedImages {
    images,
    revised_prompt: None,
  })
}

/// Grok has answered with several shapes: a bare array, `data[]`, `images[]`
/// or a single `url`. Items may be strings or objects.
pub fn grok_images(reply: &Value) -> Vec<String> {
  let item = |value: &Value| {
    value
      .as_str()
      .map(str::to_string)
      .or_else(|| image_url(value))
  };

  if let Some(items) = reply.as_array() {
    return items.iter().filter_map(item).collect();
  }

  for key in ["data", "images"] {
    if let Some(items) = reply.get(key).and_then(Value::as_array) {
      return items.iter().filter_map(item).collect();
    }
  }

  reply
    .get("url")
    .and_then(Value::as_str)
    .map(|url| vec![url.to_string()])
    .unwrap_or_default()
}

/// Parse `WIDTHxHEIGHT`; either side falls back to 1024.
pub fn parse_size(size: Option<&str>) -> (u32, u32) {
  let mut parts = size.unwrap_or(DEFAULT_SIZE).splitn(2, 'x');
  let mut dimension = || {
    parts
      .next()
      .and_then(|p| p.trim().parse().ok())
      .unwrap_or(DEFAULT_DIMENSION)
  };
  let width = dimension();
  let height = dimension();
  (width, height)
}

/// Replicate prediction body. A 64-hex model is a version id; anything else
/// is an `owner/name` model reference.
pub fn replicate_request_body(config: &ImageConfig, model: &str, prompt: &str) -> Value {
  let (width, height) = parse_size(config.size.as_deref());
  let num_outputs = config.num_outputs.or(config.n).unwrap_or(1).clamp(1, 4);

  let input = json!({
    "prompt": prompt,
    "num_outputs": num_outputs,
    "width": width,
    "height": height,
    "guidance_scale": config.guidance_scale.unwrap_or(DEFAULT_GUIDANCE_SCALE),
    "num_inference_steps": config.num_inference_steps.unwrap_or(DEFAULT_INFERENCE_STEPS),
  });

  if VERSION_ID.is_match(model) {
    json!({ "version": model, "input": input })
  } else {
    json!({ "model": model, "input": input })
  }
}

async fn replicate(
  config: &ImageConfig,
  model: &str,
  prompt: &str,
  ctx: &RunContext,
) -> Result<GeneratedImages, NodeError> {
  let key = ctx.secret(Provider::Replicate)?;
  let auth = format!("Token {}", key);
  let body = replicate_request_body(config, model, prompt);

  let url = format!("{}/predictions", ctx.config.endpoints.replicate);
  let http = HttpRequest::post_json(url, body.to_string()).header("Authorization", auth.as_str());
  let created = call_json(ctx, http, |status| format!("Replicate API error: {}", status)).await?;

  let id = created
    .get("id")
    .and_then(Value::as_str)
    .ok_or_else(|| NodeError::external("Replicate did not return a prediction id"))?;

  let prediction = poll_prediction(id, &auth, ctx).await?;

  let images = match prediction.get("output") {
    Some(Value::Array(items)) => items
      .iter()
      .filter_map(Value::as_str)
      .map(str::to_string)
      .collect(),
    Some(Value::String(url)) => vec![url.clone()],
    _ => Vec::new(),
  };
  if images.is_empty() {
    return Err(NodeError::external("no images returned from Replicate"));
  }

  Ok(GeneratedImages {
    images,
    revised_prompt: None,
  })
}

/// Poll until the prediction succeeds, fails, is canceled or the attempt
/// budget is spent. Each poll is preceded by one interval of sleep.
async fn poll_prediction(id: &str, auth: &str, ctx: &RunContext) -> Result<Value, NodeError> {
  let interval = Duration::from_millis(ctx.config.replicate_poll_interval_ms);
  let url = format!("{}/predictions/{}", ctx.config.endpoints.replicate, id);
  let mut status = String::from("starting");

  for attempt in 1..=ctx.config.replicate_max_attempts {
    tokio::time::sleep(interval).await;

    let http = HttpRequest::get(url.as_str()).header("Authorization", auth);
    let prediction = call_json(ctx, http, |code| format!("Replicate API error: {}", code)).await?;

    status = prediction
      .get("status")
      .and_then(Value::as_str)
      .unwrap_or("unknown")
      .to_string();
    debug!(prediction_id = %id, attempt, status = %status, "replicate_poll");

    match status.as_str() {
      "succeeded" => return Ok(prediction),
      "failed" => {
        let reason = prediction
          .get("error")
          .and_then(Value::as_str)
          .unwrap_or("unknown error");
        return Err(NodeError::external(format!("prediction failed: {}", reason)));
      }
      "canceled" => return Err(NodeError::external("prediction was canceled")),
      _ => {}
    }
  }

  warn!(prediction_id = %id, status = %status, "replicate_poll_exhausted");
  Err(NodeError::external(format!(
    "image generation timed out (status: {})",
    status
  )))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> ImageConfig {
    ImageConfig {
      provider: "dalle".to_string(),
      prompt: "a fox".to_string(),
      ..ImageConfig::default()
    }
  }

  #[test]
  fn test_gpt_image_maps_quality_and_background() {
    let config = ImageConfig {
      quality: Some("hd".to_string()),
      background: Some("transparent".to_string()),
      n: Some(3),
      ..config()
    };
    let body = openai_request_body(&config, "gpt-image-1.5", "a fox");
    assert_eq!(body["quality"], "high");
    assert_eq!(body["background"], "transparent");
    assert_eq!(body["n"], 3);
    assert!(body.get("response_format").is_none());
  }

  #[test]
  fn test_gpt_image_auto_values_are_omitted() {
    let config = ImageConfig {
      quality: Some("auto".to_string()),
      background: Some("auto".to_string()),
      ..config()
    };
    let body = openai_request_body(&config, "gpt-image-1", "a fox");
    assert!(body.get("quality").is_none());
    assert!(body.get("background").is_none());
  }

  #[test]
  fn test_dalle_3_caps_n_and_forces_quality() {
    let config = ImageConfig {
      quality: Some("high".to_string()),
      n: Some(4),
      ..config()
    };
    let body = openai_request_body(&config, "dall-e-3", "a fox");
    assert_eq!(body["n"], 1);
    assert_eq!(body["quality"], "hd");
    assert_eq!(body["response_format"], "url");

    let body = openai_request_body(&ImageConfig { quality: Some("medium".to_string()), ..self::config() }, "dall-e-3", "a fox");
    assert_eq!(body["quality"], "standard");
  }

  #[test]
  fn test_dalle_2_has_no_quality() {
    let body = openai_request_body(&ImageConfig { n: Some(25), ..config() }, "dall-e-2", "a fox");
    assert_eq!(body["n"], 10);
    assert!(body.get("quality").is_none());
  }

  #[test]
  fn test_parse_size() {
    assert_eq!(parse_size(Some("512x768")), (512, 768));
    assert_eq!(parse_size(Some("wide")), (1024, 1024));
    assert_eq!(parse_size(Some("640")), (640, 1024));
    assert_eq!(parse_size(None), (1024, 1024));
  }

  #[test]
  fn test_replicate_version_vs_model() {
    let body = replicate_request_body(&config(), STABLE_DIFFUSION_VERSION, "a fox");
    assert_eq!(body["version"], STABLE_DIFFUSION_VERSION);
    assert!(body.get("model").is_none());

    let body = replicate_request_body(&ImageConfig { n: Some(9), ..config() }, FLUX_MODEL, "a fox");
    assert_eq!(body["model"], FLUX_MODEL);
    assert_eq!(body["input"]["num_outputs"], 4);
    assert_eq!(body["input"]["guidance_scale"], 7.5);
    assert_eq!(body["input"]["num_inference_steps"], 50);
  }

  #[test]
  fn test_grok_image_shapes() {
    assert_eq!(grok_images(&json!(["a", "b"])), vec!["a", "b"]);
    assert_eq!(
      grok_images(&json!({"data": [{"url": "u1"}, {"b64_json": "QQ=="}]})),
      vec!["u1", "data:image/png;base64,QQ=="]
    );
    assert_eq!(grok_images(&json!({"images": ["x"]})), vec!["x"]);
    assert_eq!(grok_images(&json!({"url": "only"})), vec!["only"]);
    assert!(grok_images(&json!({"status": "ok"})).is_empty());
  }

  #[test]
  fn test_provider_names() {
    assert_eq!(ImageProvider::parse("dalle").unwrap(), ImageProvider::Dalle);
    assert_eq!(ImageProvider::parse("stable-diffusion-xl").unwrap(), ImageProvider::StableDiffusionXl);
    assert!(matches!(ImageProvider::parse("midjourney"), Err(NodeError::Configuration { .. })));
  }
}
