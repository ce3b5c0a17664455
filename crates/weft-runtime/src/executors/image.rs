use serde_json::{Value, json};
use weft_config::ImageConfig;
use weft_host_log::LogEntry;

use crate::context::RunContext;
use crate::error::NodeError;
use crate::prompt;
use crate::providers::image::{self, ImageProvider};

pub(crate) async fn execute(
  node_id: &str,
  config: &ImageConfig,
  previous: &Value,
  ctx: &RunContext,
) -> Result<Value, NodeError> {
  ctx.log(LogEntry::info(
    node_id,
    format!("image generation: {}", config.provider),
  ));

  let provider = ImageProvider::parse(&config.provider)?;

  let prompt = prompt::compose(&config.prompt, previous, "\n\nReference: ");
  let prompt = ctx.resolve(&prompt, &json!({ "input": previous }));

  let generated = image::generate(provider, config, &prompt, ctx)
    .await
    .map_err(|e| e.context("image generation failed"))?;

  ctx.log(
    LogEntry::success(node_id, format!("{} images generated", generated.images.len())).with_data(
      json!({
        "images": generated.images,
        "revisedPrompt": generated.revised_prompt,
      }),
    ),
  );

  let mut output = json!({ "images": generated.images });
  if let Some(revised) = generated.revised_prompt {
    output["revisedPrompt"] = Value::String(revised);
  }
  Ok(output)
}
