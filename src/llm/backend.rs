//! Completion backends.
//!
//! Every backend takes one prompt and returns one trimmed response, or a
//! [`BackendError`] when the call fails or comes back empty.

use crate::config::LlmConfig;
use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A text-completion service
pub trait CompletionBackend {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Send one prompt and return the trimmed response
    fn complete(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Runs an external CLI once per prompt, e.g. `ollama run phi4:latest <prompt>`
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Build from config, substituting `{model}` in the arguments
    pub fn from_config(config: &LlmConfig) -> Self {
        let args = config
            .args
            .iter()
            .map(|arg| arg.replace("{model}", &config.model))
            .collect();
        Self::new(
            config.command.clone(),
            args,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Kill the child and its process group, then reap it
    fn terminate(&self, child: &mut Child) {
        debug!("Killing {} (pid {})", self.program, child.id());

        #[cfg(unix)]
        let group_killed = {
            let pgid = child.id() as libc::pid_t;
            // SAFETY: signals only the group created for this child
            unsafe { libc::kill(-pgid, libc::SIGKILL) == 0 }
        };
        #[cfg(not(unix))]
        let group_killed = false;

        if !group_killed {
            if let Err(e) = child.kill() {
                debug!("Failed to kill {}: {}", self.program, e);
            }
        }
        if let Err(e) = child.wait() {
            debug!("Failed to reap {}: {}", self.program, e);
        }
    }
}

impl CompletionBackend for CommandBackend {
    fn name(&self) -> &str {
        &self.program
    }

    fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let spawn_error = |source| BackendError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a kill also reaches anything the child spawned
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(spawn_error)?;

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let waited = wait_with_timeout(&mut child, self.timeout);
        if !matches!(waited, Ok(Some(_))) {
            self.terminate(&mut child);
        }

        // Readers finish once every holder of the pipes is gone
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        let status = match waited {
            Ok(Some(status)) => status,
            Ok(None) => return Err(BackendError::Timeout(self.timeout)),
            Err(source) => {
                return Err(BackendError::Wait {
                    program: self.program.clone(),
                    source,
                })
            }
        };

        if !status.success() {
            return Err(BackendError::ExitStatus {
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        non_empty(&stdout)
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn non_empty(text: &str) -> Result<String, BackendError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(BackendError::EmptyResponse)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Ollama HTTP API (`/api/generate`)
pub struct OllamaBackend {
    client: reqwest::blocking::Client,
    url: String,
    model: String,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaBackend {
    pub fn from_config(config: &LlmConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: http_client(config)?,
            url: config
                .api_url
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            model: config.model.clone(),
        })
    }
}

impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let endpoint = format!("{}/api/generate", self.url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .map_err(|e| request_error("Ollama", e))?;

        if !response.status().is_success() {
            return Err(BackendError::http(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let result: OllamaResponse = response
            .json()
            .map_err(|e| BackendError::http(format!("Failed to parse Ollama response: {}", e)))?;

        non_empty(&result.response)
    }
}

/// OpenAI-compatible chat completions API
pub struct OpenAIBackend {
    client: reqwest::blocking::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
}

/// Response from OpenAI API
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

/// Request to OpenAI API
#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
}

impl OpenAIBackend {
    pub fn from_config(config: &LlmConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: http_client(config)?,
            url: config
                .api_url
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            max_tokens: config.max_tokens,
        })
    }

    /// Configured key, else whatever `fallback` finds
    fn api_key_or(&self, fallback: impl FnOnce() -> Option<String>) -> Result<String, BackendError> {
        self.api_key
            .clone()
            .or_else(fallback)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| BackendError::Config("OpenAI API key not configured".to_string()))
    }
}

impl CompletionBackend for OpenAIBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let endpoint = format!("{}/chat/completions", self.url.trim_end_matches('/'));

        let api_key = self.api_key_or(|| std::env::var("OPENAI_API_KEY").ok())?;

        let request = OpenAIRequest {
            model: &self.model,
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .map_err(|e| request_error("OpenAI", e))?;

        if !response.status().is_success() {
            return Err(BackendError::http(format!(
                "OpenAI returned status {}",
                response.status()
            )));
        }

        let result: OpenAIResponse = response
            .json()
            .map_err(|e| BackendError::http(format!("Failed to parse OpenAI response: {}", e)))?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| BackendError::http("No response from OpenAI"))?;

        non_empty(content)
    }
}

fn http_client(config: &LlmConfig) -> Result<reqwest::blocking::Client, BackendError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| BackendError::http(format!("Failed to build HTTP client: {}", e)))
}

fn request_error(provider: &str, e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::http(format!("{} request timed out", provider))
    } else {
        BackendError::http(format!("{} request failed: {}", provider, e))
    }
}

/// Returns the prompt unchanged; used for dry runs
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoBackend;

impl CompletionBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        non_empty(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmProvider;

    #[test]
    fn test_from_config_substitutes_model() {
        let config = LlmConfig::default();
        let backend = CommandBackend::from_config(&config);
        assert_eq!(backend.program, "ollama");
        assert_eq!(backend.args, vec!["run".to_string(), "phi4:latest".to_string()]);
    }

    #[test]
    fn test_echo_backend() {
        assert_eq!(EchoBackend.complete("  hello \n").unwrap(), "hello");
        assert!(matches!(EchoBackend.complete("   "), Err(BackendError::EmptyResponse)));
    }

    #[test]
    fn test_spawn_failure() {
        let backend = CommandBackend::new(
            "docscribe-no-such-program",
            vec![],
            Duration::from_secs(5),
        );
        let err = backend.complete("hi").unwrap_err();
        assert!(matches!(err, BackendError::Spawn { .. }));
        assert!(err.to_string().contains("docscribe-no-such-program"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_returns_trimmed_stdout() {
        let backend = CommandBackend::new("echo", vec!["answer:".to_string()], Duration::from_secs(5));
        assert_eq!(backend.complete("it's \"quoted\" $HOME").unwrap(), "answer: it's \"quoted\" $HOME");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_nonzero_exit() {
        let backend = CommandBackend::new(
            "sh",
            vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()],
            Duration::from_secs(5),
        );
        match backend.complete("ignored") {
            Err(BackendError::ExitStatus { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected exit status error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_command_empty_output() {
        let backend = CommandBackend::new("true", vec![], Duration::from_secs(5));
        assert!(matches!(backend.complete("x"), Err(BackendError::EmptyResponse)));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_timeout() {
        let backend = CommandBackend::new("sleep", vec![], Duration::from_millis(200));
        let started = Instant::now();
        let result = backend.complete("5");
        assert!(matches!(result, Err(BackendError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_grandchildren() {
        // The shell forks `sleep`, which would keep stdout open after `sh` dies
        let backend = CommandBackend::new(
            "sh",
            vec!["-c".to_string(), "sleep 5; echo late".to_string()],
            Duration::from_millis(200),
        );
        let started = Instant::now();
        let result = backend.complete("ignored");
        assert!(matches!(result, Err(BackendError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    fn openai_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::OpenAI,
            api_key: api_key.map(str::to_string),
            api_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_openai_missing_key() {
        let backend = OpenAIBackend::from_config(&openai_config(None)).unwrap();
        assert!(matches!(backend.api_key_or(|| None), Err(BackendError::Config(_))));
        assert!(matches!(
            backend.api_key_or(|| Some(String::new())),
            Err(BackendError::Config(_))
        ));
    }

    #[test]
    fn test_openai_key_from_environment() {
        let backend = OpenAIBackend::from_config(&openai_config(None)).unwrap();
        assert_eq!(backend.api_key_or(|| Some("sk-env".to_string())).unwrap(), "sk-env");
    }

    #[test]
    fn test_openai_configured_key_wins() {
        let backend = OpenAIBackend::from_config(&openai_config(Some("sk-config"))).unwrap();
        let key = backend
            .api_key_or(|| panic!("environment should not be consulted"))
            .unwrap();
        assert_eq!(key, "sk-config");
    }

    #[test]
    fn test_ollama_default_url() {
        let backend = OllamaBackend::from_config(&LlmConfig::default()).unwrap();
        assert_eq!(backend.url, "http://localhost:11434");
        assert_eq!(backend.name(), "ollama");
    }
}
