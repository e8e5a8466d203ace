use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder};
use serde_json::{json, Value};
use uuid::Uuid;

type JobId = Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Rejected { status: u16, message: String },
}

pub struct ClientCli {
    inner: Client,
    server: String,
    user: String,
}

impl ClientCli {
    pub fn connect(user: &str, server_addr: &str) -> Self {
        Self {
            inner: Client::new(),
            server: server_addr.trim_end_matches('/').to_string(),
            user: user.to_string(),
        }
    }

    pub async fn create_job(&self, cmd: &str, timeout: Option<u64>) -> Result<(), ClientError> {
        let mut body = json!({ "command": cmd });
        if let Some(timeout) = timeout {
            body["timeoutSeconds"] = json!(timeout);
        }
        let job = self.send(self.request(Method::POST, "/jobs").json(&body)).await?;
        print_json(&job);
        Ok(())
    }

    pub async fn start_job(&self, job_id: JobId) -> Result<(), ClientError> {
        self.change_status(job_id, "started").await
    }

    pub async fn stop_job(&self, job_id: JobId) -> Result<(), ClientError> {
        self.change_status(job_id, "stopped").await
    }

    pub async fn query_status(&self, job_id: JobId) -> Result<(), ClientError> {
        let job = self
            .send(self.request(Method::GET, &format!("/jobs/{}", job_id)))
            .await?;
        print_json(&job);
        Ok(())
    }

    pub async fn list_jobs(&self) -> Result<(), ClientError> {
        let jobs = self.send(self.request(Method::GET, "/jobs")).await?;
        print_json(&jobs);
        Ok(())
    }

    async fn change_status(&self, job_id: JobId, status: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::PUT, &format!("/jobs/{}", job_id))
            .json(&json!({ "status": status }));
        let job = self.send(request).await?;
        print_json(&job);
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .request(method, format!("{}{}", self.server, path))
            .header(AUTHORIZATION, &self.user)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            Ok(body)
        } else {
            let message = body["error"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
            Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}
