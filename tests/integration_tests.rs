use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use genai_bridge::ai::responses::{ACKNOWLEDGMENT_RESPONSE, REFLECTION_RESPONSE};
use genai_bridge::ai::{GenerationParams, TextGenerator};
use genai_bridge::config::{ResponseStyle, SimulationConfig};
use genai_bridge::{GenAiPlugin, MethodCall, MethodChannel, MethodResult, Settings};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::time::Instant;

fn attach(settings: &Settings) -> (MethodChannel, Arc<GenAiPlugin>) {
    let channel = MethodChannel::new(settings.bridge.channel.clone());
    let plugin = Arc::new(GenAiPlugin::new(settings, &Handle::current()));
    plugin.clone().attach(&channel);
    (channel, plugin)
}

fn generate(prompt: &str) -> MethodCall {
    MethodCall::new("generateText")
        .with_argument("prompt", prompt)
        .with_argument("maxTokens", 100)
        .with_argument("temperature", 0.7)
        .with_argument("topP", 0.9)
}

fn initialize() -> MethodCall {
    MethodCall::new("initializeModel").with_argument("modelPath", "any/path")
}

#[tokio::test(start_paused = true)]
async fn test_weekly_summary_session() {
    let settings = Settings::default();
    let (channel, plugin) = attach(&settings);
    assert_eq!(channel.name(), "com.yourapp.genai");

    let started = Instant::now();
    let init = channel.invoke(initialize()).await.unwrap();
    assert_eq!(init, MethodResult::success(true));
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(plugin.is_model_loaded());

    let text = channel.invoke(generate("Resumen de mi semana")).await.unwrap();
    assert_eq!(text, MethodResult::success(REFLECTION_RESPONSE));
    assert!(started.elapsed() >= Duration::from_secs(5));

    let dispose = channel.invoke(MethodCall::new("disposeModel")).await.unwrap();
    assert_eq!(dispose, MethodResult::success(Value::Null));
    assert!(!plugin.is_model_loaded());

    let mut rejected = channel.invoke(generate("Resumen de mi semana"));
    let rejected = rejected.try_take().unwrap();
    assert_eq!(rejected.error_code(), Some("MODEL_NOT_LOADED"));
}

#[tokio::test]
async fn test_parameters_do_not_change_output() {
    let settings = Settings {
        simulation: SimulationConfig::instant(),
        ..Settings::default()
    };
    let (channel, _plugin) = attach(&settings);
    channel.invoke(initialize()).await.unwrap();

    let plain = channel
        .invoke(MethodCall::new("generateText").with_argument("prompt", "un día tranquilo"))
        .await
        .unwrap();
    let tuned = channel
        .invoke(
            MethodCall::new("generateText")
                .with_argument("prompt", "un día tranquilo")
                .with_argument("maxTokens", 1)
                .with_argument("temperature", 2.0)
                .with_argument("topP", 0.01),
        )
        .await
        .unwrap();

    let mistyped = channel
        .invoke(
            MethodCall::new("generateText")
                .with_argument("prompt", "un día tranquilo")
                .with_argument("maxTokens", 100.5)
                .with_argument("topP", "alto"),
        )
        .await
        .unwrap();

    assert_eq!(plain, MethodResult::success(ACKNOWLEDGMENT_RESPONSE));
    assert_eq!(plain, tuned);
    assert_eq!(plain, mistyped);
}

#[tokio::test]
async fn test_dispose_is_idempotent() {
    let settings = Settings {
        simulation: SimulationConfig::instant(),
        ..Settings::default()
    };
    let (channel, plugin) = attach(&settings);

    for _ in 0..3 {
        let result = channel.invoke(MethodCall::new("disposeModel")).await.unwrap();
        assert_eq!(result, MethodResult::success(Value::Null));
        assert!(!plugin.is_model_loaded());
    }
}

#[tokio::test]
async fn test_replies_follow_submission_order() {
    let settings = Settings {
        simulation: SimulationConfig::instant(),
        ..Settings::default()
    };
    let (channel, plugin) = attach(&settings);
    channel.invoke(initialize()).await.unwrap();

    // Both are queued before either runs; the generation goes first.
    let generated = channel.invoke(generate("hola"));
    let disposed = channel.invoke(MethodCall::new("disposeModel"));

    assert!(generated.await.unwrap().is_success());
    assert!(disposed.await.unwrap().is_success());
    assert!(!plugin.is_model_loaded());
}

#[tokio::test]
async fn test_personalized_style() {
    let settings = Settings {
        simulation: SimulationConfig {
            response_style: ResponseStyle::Personalized,
            ..SimulationConfig::instant()
        },
        ..Settings::default()
    };
    let (channel, _plugin) = attach(&settings);
    channel.invoke(initialize()).await.unwrap();

    let prompt = "Genera el resumen de Marta de esta semana.\n\
        Total de días con reflexiones: 3\n\
        Estado de ánimo promedio: 5.5/10\n";
    let result = channel.invoke(generate(prompt)).await.unwrap();

    let MethodResult::Success { value: Value::String(text) } = &result else {
        panic!("expected text, got {result:?}");
    };
    assert!(text.starts_with("**¡Hola Marta!**"));
    assert!(text.contains("un estado de ánimo equilibrado de 5.5/10. "));
    assert!(text.contains("Tu práctica regular de reflexión"));
}

#[tokio::test]
async fn test_teardown_refuses_new_work() {
    let settings = Settings {
        simulation: SimulationConfig::instant(),
        ..Settings::default()
    };
    let (channel, plugin) = attach(&settings);
    let queued = channel.invoke(initialize());

    plugin.detach(&channel);
    plugin.join().await;

    assert_eq!(queued.await.unwrap(), MethodResult::success(true));
    assert_eq!(
        channel.invoke(initialize()).await.unwrap(),
        MethodResult::NotImplemented
    );
}

struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn load(&mut self, _model_path: &Path) -> anyhow::Result<()> {
        Err(anyhow!("model file is corrupt"))
    }

    async fn generate(&mut self, _prompt: &str, _params: &GenerationParams) -> anyhow::Result<String> {
        Err(anyhow!("unreachable"))
    }

    async fn unload(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_init_failure_leaves_model_unloaded() {
    let channel = MethodChannel::new("failing");
    let plugin = Arc::new(GenAiPlugin::with_generator(
        Box::new(FailingGenerator),
        4,
        &Handle::current(),
    ));
    plugin.clone().attach(&channel);

    let result = channel.invoke(initialize()).await.unwrap();

    assert_eq!(
        result,
        MethodResult::Error {
            code: "INIT_ERROR".to_string(),
            message: "Failed to initialize model: model file is corrupt".to_string(),
            details: None,
        }
    );
    assert!(!plugin.is_model_loaded());

    let next = channel.invoke(generate("hola")).await.unwrap();
    assert_eq!(next.error_code(), Some("MODEL_NOT_LOADED"));
}

struct PanickingGenerator;

#[async_trait]
impl TextGenerator for PanickingGenerator {
    async fn load(&mut self, _model_path: &Path) -> anyhow::Result<()> {
        Ok(())
    }

    async fn generate(&mut self, _prompt: &str, _params: &GenerationParams) -> anyhow::Result<String> {
        panic!("backend crashed");
    }

    async fn unload(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_generator_panic_is_reported_and_isolated() {
    let channel = MethodChannel::new("panicking");
    let plugin = Arc::new(GenAiPlugin::with_generator(
        Box::new(PanickingGenerator),
        4,
        &Handle::current(),
    ));
    plugin.clone().attach(&channel);

    channel.invoke(initialize()).await.unwrap();
    let generated = channel.invoke(generate("hola")).await.unwrap();
    assert_eq!(generated.error_code(), Some("GENERATION_ERROR"));
    assert!(plugin.is_model_loaded());

    let disposed = channel.invoke(MethodCall::new("disposeModel")).await.unwrap();
    assert_eq!(disposed, MethodResult::success(Value::Null));
    assert!(!plugin.is_model_loaded());
}
