//! services/api/src/adapters/classifier.rs
//!
//! This module contains the adapter for the message-classification LLM.
//! It implements the `ClassificationService` port from the `core` crate.
//! Gemini is reached through its OpenAI-compatible endpoint, so the same
//! `async-openai` client works against either provider.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    error::OpenAIError,
    Client,
};
use async_trait::async_trait;
use contacto_core::{
    domain::Category,
    ports::{ClassificationService, PortError, PortResult},
};
use tracing::debug;

const SYSTEM_INSTRUCTIONS: &str = "\
Clasifica el siguiente mensaje de cliente en una de estas categorías: Queja, Sugerencia, Consulta, Otro.

Definiciones y Ejemplos:
- Queja: El cliente expresa insatisfacción, un problema no resuelto, frustración, o un reclamo. Ejemplo: \"Mi máquina no funciona y nadie me ayuda.\"
- Sugerencia: El cliente propone una mejora o una idea. Ejemplo: \"Deberían añadir más opciones de pago.\"
- Consulta: El cliente pide información o hace una pregunta. Ejemplo: \"¿Cuál es el horario de atención?\"
- Otro: El mensaje no encaja en las categorías anteriores.

Analiza el \"Asunto\" y el \"Mensaje\" del cliente.

Responde ÚNICAMENTE con la categoría final (Queja, Sugerencia, Consulta, u Otro).";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ClassificationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct LlmClassifier {
    client: Client<OpenAIConfig>,
    model: String,
}

impl LlmClassifier {
    /// Creates a new `LlmClassifier`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `ClassificationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ClassificationService for LlmClassifier {
    /// Classifies a submission into one of the four fixed categories.
    async fn classify(&self, asunto: &str, mensaje: &str) -> PortResult<Category> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("Asunto: \"{}\"\nMensaje: \"{}\"", asunto, mensaje))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(10u32)
            .temperature(0.0)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        let raw = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected(
                    "Classifier LLM returned no text content in its response.".to_string(),
                )
            })?;

        debug!(raw = %raw.trim(), "classifier raw response");
        Ok(Category::from_model_output(&raw))
    }
}
